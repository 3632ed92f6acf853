//! Catalog Models
//!
//! Catalog templates wrap a renderable [`Template`] with browsing and social
//! metadata. Serialized, the template fields are flattened next to the
//! metadata so an exported catalog template is also a valid engine template.

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::models::{Template, TemplatePatch};
use crate::core::events::{event_names, NamedEvent};
use crate::core::{new_id, now, TemplateId, Timestamp};

/// Popularity points per rating star
pub const RATING_WEIGHT: f64 = 10.0;
/// Lowest accepted rating submission
pub const MIN_RATING: f64 = 1.0;
/// Highest accepted rating submission
pub const MAX_RATING: f64 = 5.0;

// =============================================================================
// Category & Size
// =============================================================================

/// Catalog category
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TemplateCategory {
    #[default]
    Business,
    Educational,
    Marketing,
    Social,
    Entertainment,
    Presentation,
    Personal,
}

impl TemplateCategory {
    /// All categories in declaration order
    pub const ALL: [TemplateCategory; 7] = [
        TemplateCategory::Business,
        TemplateCategory::Educational,
        TemplateCategory::Marketing,
        TemplateCategory::Social,
        TemplateCategory::Entertainment,
        TemplateCategory::Presentation,
        TemplateCategory::Personal,
    ];

    /// Lowercase wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateCategory::Business => "business",
            TemplateCategory::Educational => "educational",
            TemplateCategory::Marketing => "marketing",
            TemplateCategory::Social => "social",
            TemplateCategory::Entertainment => "entertainment",
            TemplateCategory::Presentation => "presentation",
            TemplateCategory::Personal => "personal",
        }
    }
}

impl std::fmt::Display for TemplateCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        TemplateCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == lower)
            .ok_or_else(|| format!("Unknown template category: {s}"))
    }
}

/// Canvas shape a template targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateSize {
    /// 16:9
    #[default]
    Landscape,
    /// 9:16
    Portrait,
    /// 1:1
    Square,
    /// 4:3
    Classic,
}

impl TemplateSize {
    /// Reference canvas dimensions
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            TemplateSize::Landscape => (1920, 1080),
            TemplateSize::Portrait => (1080, 1920),
            TemplateSize::Square => (1080, 1080),
            TemplateSize::Classic => (1440, 1080),
        }
    }

    /// Classifies a canvas by aspect ratio
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        if width == 0 || height == 0 {
            return TemplateSize::default();
        }
        let ratio = width as f64 / height as f64;
        if (ratio - 1.0).abs() < 0.01 {
            TemplateSize::Square
        } else if ratio < 1.0 {
            TemplateSize::Portrait
        } else if (ratio - 4.0 / 3.0).abs() < 0.05 {
            TemplateSize::Classic
        } else {
            TemplateSize::Landscape
        }
    }
}

impl FromStr for TemplateSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "landscape" => Ok(TemplateSize::Landscape),
            "portrait" => Ok(TemplateSize::Portrait),
            "square" => Ok(TemplateSize::Square),
            "classic" => Ok(TemplateSize::Classic),
            other => Err(format!("Unknown template size: {other}")),
        }
    }
}

// =============================================================================
// Catalog Template
// =============================================================================

/// Template published in the catalog.
///
/// Usage, rating, review count and popularity are maintained by the catalog
/// and only readable from outside. `popularity` always equals
/// `usage_count + rating * 10`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogTemplate {
    /// Renderable template
    #[serde(flatten)]
    pub template: Template,
    /// Catalog category
    #[serde(default)]
    pub category: TemplateCategory,
    /// Target canvas shape
    #[serde(default)]
    pub size: TemplateSize,
    /// Search tags
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Target platforms (e.g. `youtube`, `tiktok`)
    #[serde(default)]
    pub platforms: BTreeSet<String>,
    #[serde(default)]
    usage_count: u64,
    #[serde(default)]
    rating: f64,
    #[serde(default)]
    reviews: u64,
    #[serde(default)]
    popularity: f64,
    /// Highlighted in the catalog
    #[serde(default)]
    pub featured: bool,
    /// Requires a paid plan
    #[serde(default)]
    pub premium: bool,
    /// Built-in template seeded by the catalog
    #[serde(default)]
    pub system: bool,
}

impl CatalogTemplate {
    /// Template ID
    pub fn id(&self) -> &str {
        &self.template.id
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.template.name
    }

    /// Creation timestamp
    pub fn created_at(&self) -> Timestamp {
        self.template.created_at
    }

    /// Times the template was used
    pub fn usage_count(&self) -> u64 {
        self.usage_count
    }

    /// Mean rating in `[0, 5]`; 0 when never reviewed
    pub fn rating(&self) -> f64 {
        self.rating
    }

    /// Number of rating submissions
    pub fn reviews(&self) -> u64 {
        self.reviews
    }

    /// Ranking score derived from usage and rating
    pub fn popularity(&self) -> f64 {
        self.popularity
    }

    /// Returns whether any tag matches case-insensitively
    pub fn has_any_tag(&self, tags: &[String]) -> bool {
        tags.iter().any(|wanted| {
            self.tags
                .iter()
                .any(|tag| tag.eq_ignore_ascii_case(wanted))
        })
    }

    /// Case-insensitive substring match over name, description and tags
    pub fn matches_text(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.template.name.to_lowercase().contains(&query)
            || self
                .template
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&query))
            || self.tags.iter().any(|t| t.to_lowercase().contains(&query))
    }

    pub(crate) fn record_usage(&mut self) {
        self.usage_count += 1;
        self.recompute_popularity();
    }

    /// Folds a score into the running mean. The score must already be in range.
    pub(crate) fn add_rating(&mut self, score: f64) {
        let reviews = self.reviews as f64;
        self.rating = (self.rating * reviews + score) / (reviews + 1.0);
        self.reviews += 1;
        self.recompute_popularity();
    }

    /// Zeroes usage and rating signals
    pub(crate) fn reset_signals(&mut self) {
        self.usage_count = 0;
        self.rating = 0.0;
        self.reviews = 0;
        self.recompute_popularity();
    }

    /// Clamps imported signals into range and recomputes popularity
    pub(crate) fn normalize_signals(&mut self) {
        if !self.rating.is_finite() {
            self.rating = 0.0;
        }
        self.rating = self.rating.clamp(0.0, MAX_RATING);
        if self.reviews == 0 {
            self.rating = 0.0;
        }
        self.recompute_popularity();
    }

    fn recompute_popularity(&mut self) {
        self.popularity = self.usage_count as f64 + self.rating * RATING_WEIGHT;
    }
}

/// Input for [`TemplateCatalog::add_template`](super::TemplateCatalog::add_template).
///
/// An empty `template.id` is replaced with a generated one. `size` defaults
/// to the shape of the template canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCatalogTemplate {
    #[serde(flatten)]
    pub template: Template,
    #[serde(default)]
    pub category: TemplateCategory,
    #[serde(default)]
    pub size: Option<TemplateSize>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub platforms: BTreeSet<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub premium: bool,
}

impl NewCatalogTemplate {
    /// Wraps a template for the catalog
    pub fn new(template: Template, category: TemplateCategory) -> Self {
        Self {
            template,
            category,
            size: None,
            tags: BTreeSet::new(),
            platforms: BTreeSet::new(),
            featured: false,
            premium: false,
        }
    }

    /// Sets the size explicitly
    pub fn with_size(mut self, size: TemplateSize) -> Self {
        self.size = Some(size);
        self
    }

    /// Adds tags
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Adds platforms
    pub fn with_platforms<I, S>(mut self, platforms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.platforms.extend(platforms.into_iter().map(Into::into));
        self
    }

    /// Marks as featured
    pub fn featured(mut self) -> Self {
        self.featured = true;
        self
    }

    /// Marks as premium
    pub fn premium(mut self) -> Self {
        self.premium = true;
        self
    }

    pub(crate) fn into_catalog_template(self, system: bool) -> CatalogTemplate {
        let mut template = self.template;
        if template.id.is_empty() {
            template.id = new_id();
        }
        let size = self
            .size
            .unwrap_or_else(|| TemplateSize::from_dimensions(template.width, template.height));

        CatalogTemplate {
            template,
            category: self.category,
            size,
            tags: self.tags,
            platforms: self.platforms,
            usage_count: 0,
            rating: 0.0,
            reviews: 0,
            popularity: 0.0,
            featured: self.featured,
            premium: self.premium,
            system,
        }
    }
}

/// Partial catalog template update.
///
/// Usage, rating and popularity are not patchable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogTemplatePatch {
    #[serde(flatten)]
    pub template: TemplatePatch,
    pub category: Option<TemplateCategory>,
    pub size: Option<TemplateSize>,
    pub tags: Option<BTreeSet<String>>,
    pub platforms: Option<BTreeSet<String>>,
    pub featured: Option<bool>,
    pub premium: Option<bool>,
}

impl CatalogTemplatePatch {
    /// Merges the set fields and refreshes `updated_at`
    pub fn apply(self, target: &mut CatalogTemplate) {
        self.template.apply(&mut target.template);
        if let Some(category) = self.category {
            target.category = category;
        }
        if let Some(size) = self.size {
            target.size = size;
        }
        if let Some(tags) = self.tags {
            target.tags = tags;
        }
        if let Some(platforms) = self.platforms {
            target.platforms = platforms;
        }
        if let Some(featured) = self.featured {
            target.featured = featured;
        }
        if let Some(premium) = self.premium {
            target.premium = premium;
        }
    }
}

/// Request to derive a custom template from an existing one
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomTemplateRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Extra tags unioned with the original's
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl CustomTemplateRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }
}

// =============================================================================
// History
// =============================================================================

/// What happened to a template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    Viewed,
    Used,
    Customized,
}

/// One history record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub template_id: TemplateId,
    pub action: HistoryAction,
    pub timestamp: Timestamp,
}

impl HistoryEntry {
    /// Creates an entry stamped now
    pub fn new(template_id: impl Into<TemplateId>, action: HistoryAction) -> Self {
        Self {
            template_id: template_id.into(),
            action,
            timestamp: now(),
        }
    }
}

// =============================================================================
// Search
// =============================================================================

/// Search filters; unset filters match everything and set ones are ANDed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchFilters {
    pub category: Option<TemplateCategory>,
    pub size: Option<TemplateSize>,
    /// Matches templates carrying ANY of these tags
    pub tags: Vec<String>,
    pub featured: Option<bool>,
    pub premium: Option<bool>,
    pub min_rating: Option<f64>,
}

impl SearchFilters {
    /// Returns whether a template passes every set filter
    pub fn matches(&self, template: &CatalogTemplate) -> bool {
        self.category.map_or(true, |c| template.category == c)
            && self.size.map_or(true, |s| template.size == s)
            && (self.tags.is_empty() || template.has_any_tag(&self.tags))
            && self.featured.map_or(true, |f| template.featured == f)
            && self.premium.map_or(true, |p| template.premium == p)
            && self.min_rating.map_or(true, |r| template.rating() >= r)
    }
}

/// Text query plus filters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchQuery {
    pub query: String,
    #[serde(flatten)]
    pub filters: SearchFilters,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            filters: SearchFilters::default(),
        }
    }

    pub fn with_filters(mut self, filters: SearchFilters) -> Self {
        self.filters = filters;
        self
    }
}

/// One page of search results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    /// Matches across all pages
    pub total: usize,
    /// Matches on this page
    pub templates: Vec<CatalogTemplate>,
    /// 1-based page number
    pub page: usize,
    pub page_size: usize,
}

impl SearchResults {
    /// Number of pages for `total` matches
    pub fn total_pages(&self) -> usize {
        if self.page_size == 0 {
            0
        } else {
            self.total.div_ceil(self.page_size)
        }
    }
}

// =============================================================================
// Configuration & Export
// =============================================================================

/// Catalog configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LibraryConfig {
    /// Catalog capacity
    pub max_templates: usize,
    /// History entries kept
    pub max_history_size: usize,
    /// Whether views and uses are recorded
    pub enable_history: bool,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            max_templates: 1000,
            max_history_size: 50,
            enable_history: true,
        }
    }
}

impl LibraryConfig {
    pub fn normalize(&mut self) {
        self.max_templates = self.max_templates.max(1);
        self.max_history_size = self.max_history_size.max(1);
    }
}

/// Partial catalog configuration update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LibraryConfigPatch {
    pub max_templates: Option<usize>,
    pub max_history_size: Option<usize>,
    pub enable_history: Option<bool>,
}

/// Full catalog snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryExport {
    pub templates: Vec<CatalogTemplate>,
    #[serde(default)]
    pub favorites: Vec<TemplateId>,
    #[serde(default)]
    pub config: LibraryConfig,
}

// =============================================================================
// Events
// =============================================================================

/// Catalog notifications
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum CatalogEvent {
    Added { template_id: TemplateId },
    Updated { template_id: TemplateId },
    Removed { template_id: TemplateId },
    FavoriteAdded { template_id: TemplateId },
    FavoriteRemoved { template_id: TemplateId },
    Used { template_id: TemplateId, usage_count: u64 },
    Rated { template_id: TemplateId, rating: f64 },
    HistoryCleared,
    Imported { template_count: usize },
    ConfigUpdated,
    Reset,
}

impl NamedEvent for CatalogEvent {
    fn name(&self) -> &'static str {
        match self {
            CatalogEvent::Added { .. } => event_names::TEMPLATE_ADDED,
            CatalogEvent::Updated { .. } => event_names::TEMPLATE_UPDATED,
            CatalogEvent::Removed { .. } => event_names::TEMPLATE_REMOVED,
            CatalogEvent::FavoriteAdded { .. } => event_names::FAVORITE_ADDED,
            CatalogEvent::FavoriteRemoved { .. } => event_names::FAVORITE_REMOVED,
            CatalogEvent::Used { .. } => event_names::TEMPLATE_USED,
            CatalogEvent::Rated { .. } => event_names::TEMPLATE_RATED,
            CatalogEvent::HistoryCleared => event_names::HISTORY_CLEARED,
            CatalogEvent::Imported { .. } => event_names::LIBRARY_IMPORTED,
            CatalogEvent::ConfigUpdated => event_names::CONFIG_UPDATED,
            CatalogEvent::Reset => event_names::RESET,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
