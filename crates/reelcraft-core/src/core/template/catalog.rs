//! Template Catalog
//!
//! In-memory repository of published templates with search, favorites,
//! bounded usage history, ratings, popularity ranking, analytics and
//! library import/export.

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::analytics::{self, CatalogStatistics, UsageBreakdown};
use super::builtin::builtin_templates;
use super::catalog_models::{
    CatalogEvent, CatalogTemplate, CatalogTemplatePatch, CustomTemplateRequest, HistoryAction,
    HistoryEntry, LibraryConfig, LibraryConfigPatch, LibraryExport, NewCatalogTemplate,
    SearchFilters, SearchQuery, SearchResults, TemplateCategory, TemplateSize, MAX_RATING,
    MIN_RATING,
};
use crate::core::events::EventEmitter;
use crate::core::{fs, new_id, now, CoreError, CoreResult, ListenerId, TemplateId};

/// Catalog shared across tasks behind a single lock
pub type SharedTemplateCatalog = Arc<Mutex<TemplateCatalog>>;

/// Template catalog
pub struct TemplateCatalog {
    /// Templates in insertion order
    templates: IndexMap<TemplateId, CatalogTemplate>,
    /// Favorite ids in insertion order
    favorites: IndexSet<TemplateId>,
    /// Most recent first, capped at `max_history_size`
    history: VecDeque<HistoryEntry>,
    config: LibraryConfig,
    events: EventEmitter<CatalogEvent>,
}

impl TemplateCatalog {
    /// Creates a catalog seeded with the built-in templates.
    ///
    /// Seeding ignores `max_templates`; the seeded templates count toward it
    /// afterwards.
    pub fn new(config: LibraryConfig) -> Self {
        let mut catalog = Self::empty(config);
        catalog.seed_builtins();
        catalog
    }

    /// Creates a catalog without built-in templates
    pub fn empty(mut config: LibraryConfig) -> Self {
        config.normalize();
        Self {
            templates: IndexMap::new(),
            favorites: IndexSet::new(),
            history: VecDeque::new(),
            config,
            events: EventEmitter::new(),
        }
    }

    /// Wraps the catalog for shared use
    pub fn into_shared(self) -> SharedTemplateCatalog {
        Arc::new(Mutex::new(self))
    }

    fn seed_builtins(&mut self) {
        for builtin in builtin_templates() {
            let template = builtin.into_catalog_template(true);
            self.templates.insert(template.id().to_string(), template);
        }
        debug!(count = self.templates.len(), "seeded built-in templates");
    }

    /// Registers an observer
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: Fn(&CatalogEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(listener)
    }

    /// Removes an observer
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }

    // =========================================================================
    // CRUD
    // =========================================================================

    /// Adds a template and returns its id.
    ///
    /// # Errors
    ///
    /// `CapacityExceeded` when the catalog already holds `max_templates`;
    /// `AlreadyExists` when the supplied id is taken.
    pub fn add_template(&mut self, new: NewCatalogTemplate) -> CoreResult<TemplateId> {
        self.ensure_capacity()?;
        if !new.template.id.is_empty() && self.templates.contains_key(&new.template.id) {
            return Err(CoreError::AlreadyExists(new.template.id));
        }

        let template = new.into_catalog_template(false);
        let id = template.id().to_string();
        debug!(template_id = %id, name = %template.name(), "catalog template added");
        self.templates.insert(id.clone(), template);
        self.events.emit(&CatalogEvent::Added {
            template_id: id.clone(),
        });
        Ok(id)
    }

    fn ensure_capacity(&self) -> CoreResult<()> {
        if self.templates.len() >= self.config.max_templates {
            warn!(max = self.config.max_templates, "catalog capacity reached");
            return Err(CoreError::CapacityExceeded(format!(
                "catalog holds the maximum of {} templates",
                self.config.max_templates
            )));
        }
        Ok(())
    }

    /// Gets a template, recording a `viewed` history entry
    pub fn get_template(&mut self, id: &str) -> Option<&CatalogTemplate> {
        if !self.templates.contains_key(id) {
            return None;
        }
        self.push_history(id, HistoryAction::Viewed);
        self.templates.get(id)
    }

    /// Gets a template without recording history
    pub fn peek_template(&self, id: &str) -> Option<&CatalogTemplate> {
        self.templates.get(id)
    }

    /// Gets all templates in insertion order
    pub fn get_all_templates(&self) -> Vec<CatalogTemplate> {
        self.templates.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Merges a patch into a template. Returns false for an unknown id.
    pub fn update_template(&mut self, id: &str, patch: CatalogTemplatePatch) -> bool {
        let Some(template) = self.templates.get_mut(id) else {
            return false;
        };
        patch.apply(template);
        debug!(template_id = %id, "catalog template updated");
        self.events.emit(&CatalogEvent::Updated {
            template_id: id.to_string(),
        });
        true
    }

    /// Removes a template and its favorite mark. Returns false for an unknown id.
    pub fn remove_template(&mut self, id: &str) -> bool {
        if self.templates.shift_remove(id).is_none() {
            return false;
        }
        self.favorites.shift_remove(id);
        debug!(template_id = %id, "catalog template removed");
        self.events.emit(&CatalogEvent::Removed {
            template_id: id.to_string(),
        });
        true
    }

    // =========================================================================
    // Search & Browse
    // =========================================================================

    fn matching<'a>(
        &'a self,
        query: &'a str,
        filters: &'a SearchFilters,
    ) -> impl Iterator<Item = &'a CatalogTemplate> + 'a {
        self.templates
            .values()
            .filter(move |t| t.matches_text(query) && filters.matches(t))
    }

    /// Searches by text and filters and returns one page.
    ///
    /// Page numbers are 1-based; page 0 is treated as page 1. A page past the
    /// end has no templates but still reports the full `total`.
    pub fn search(
        &self,
        query: &str,
        filters: &SearchFilters,
        page: usize,
        page_size: usize,
    ) -> SearchResults {
        let page = page.max(1);
        let total = self.matching(query, filters).count();
        let templates = self
            .matching(query, filters)
            .skip((page - 1).saturating_mul(page_size))
            .take(page_size)
            .cloned()
            .collect();

        SearchResults {
            total,
            templates,
            page,
            page_size,
        }
    }

    /// Searches by text and filters without pagination
    pub fn search_templates(&self, query: &SearchQuery) -> Vec<CatalogTemplate> {
        self.matching(&query.query, &query.filters).cloned().collect()
    }

    /// Applies filters without a text query
    pub fn filter(&self, filters: &SearchFilters) -> Vec<CatalogTemplate> {
        self.matching("", filters).cloned().collect()
    }

    pub fn get_by_category(&self, category: TemplateCategory) -> Vec<CatalogTemplate> {
        self.collect_where(|t| t.category == category)
    }

    pub fn get_by_size(&self, size: TemplateSize) -> Vec<CatalogTemplate> {
        self.collect_where(|t| t.size == size)
    }

    /// Templates carrying any of `tags`
    pub fn get_by_tags(&self, tags: &[String]) -> Vec<CatalogTemplate> {
        self.collect_where(|t| t.has_any_tag(tags))
    }

    pub fn get_featured(&self) -> Vec<CatalogTemplate> {
        self.collect_where(|t| t.featured)
    }

    fn collect_where(&self, predicate: impl Fn(&CatalogTemplate) -> bool) -> Vec<CatalogTemplate> {
        self.templates
            .values()
            .filter(|&t| predicate(t))
            .cloned()
            .collect()
    }

    /// Top `limit` templates by popularity
    pub fn get_popular(&self, limit: usize) -> Vec<CatalogTemplate> {
        analytics::rank_by_popularity(self.templates.values())
            .into_iter()
            .take(limit)
            .cloned()
            .collect()
    }

    /// Newest `limit` templates by creation time
    pub fn get_recent(&self, limit: usize) -> Vec<CatalogTemplate> {
        analytics::rank_by_recency(self.templates.values())
            .into_iter()
            .take(limit)
            .cloned()
            .collect()
    }

    // =========================================================================
    // Favorites
    // =========================================================================

    /// Marks a template as favorite. False for unknown or already-favorite ids.
    pub fn add_to_favorites(&mut self, id: &str) -> bool {
        if !self.templates.contains_key(id) || !self.favorites.insert(id.to_string()) {
            return false;
        }
        self.events.emit(&CatalogEvent::FavoriteAdded {
            template_id: id.to_string(),
        });
        true
    }

    /// Unmarks a favorite. False if it was not a favorite.
    pub fn remove_from_favorites(&mut self, id: &str) -> bool {
        if !self.favorites.shift_remove(id) {
            return false;
        }
        self.events.emit(&CatalogEvent::FavoriteRemoved {
            template_id: id.to_string(),
        });
        true
    }

    /// Flips the favorite mark and returns whether the template is now a favorite
    pub fn toggle_favorite(&mut self, id: &str) -> bool {
        if self.is_favorite(id) {
            self.remove_from_favorites(id);
            false
        } else {
            self.add_to_favorites(id)
        }
    }

    pub fn is_favorite(&self, id: &str) -> bool {
        self.favorites.contains(id)
    }

    /// Favorite templates in the order they were marked
    pub fn get_favorites(&self) -> Vec<CatalogTemplate> {
        self.favorites
            .iter()
            .filter_map(|id| self.templates.get(id))
            .cloned()
            .collect()
    }

    pub fn get_favorite_ids(&self) -> Vec<TemplateId> {
        self.favorites.iter().cloned().collect()
    }

    // =========================================================================
    // Usage & History
    // =========================================================================

    /// Records one use of a template. Unknown ids are ignored.
    pub fn record_usage(&mut self, id: &str) -> bool {
        let Some(template) = self.templates.get_mut(id) else {
            return false;
        };
        template.record_usage();
        let usage_count = template.usage_count();

        self.push_history(id, HistoryAction::Used);
        self.events.emit(&CatalogEvent::Used {
            template_id: id.to_string(),
            usage_count,
        });
        true
    }

    /// Usage count of a template; 0 for unknown ids
    pub fn get_usage_count(&self, id: &str) -> u64 {
        self.templates.get(id).map_or(0, |t| t.usage_count())
    }

    fn push_history(&mut self, id: &str, action: HistoryAction) {
        if !self.config.enable_history {
            return;
        }
        self.history.push_front(HistoryEntry::new(id, action));
        self.history.truncate(self.config.max_history_size);
    }

    /// Most recent `limit` history entries. Empty while history is disabled.
    pub fn get_history(&self, limit: usize) -> Vec<HistoryEntry> {
        if !self.config.enable_history {
            return Vec::new();
        }
        self.history.iter().take(limit).cloned().collect()
    }

    /// The whole history, most recent first
    pub fn get_usage_history(&self) -> Vec<HistoryEntry> {
        self.get_history(usize::MAX)
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
        self.events.emit(&CatalogEvent::HistoryCleared);
    }

    // =========================================================================
    // Rating & Customization
    // =========================================================================

    /// Submits a rating.
    ///
    /// The score is range-checked before the id is looked up, so an
    /// out-of-range score fails even for an unknown id. Returns `Ok(false)`
    /// for an unknown id.
    pub fn add_rating(&mut self, id: &str, score: f64) -> CoreResult<bool> {
        if !score.is_finite() || !(MIN_RATING..=MAX_RATING).contains(&score) {
            return Err(CoreError::InvalidRating(score));
        }

        let Some(template) = self.templates.get_mut(id) else {
            return Ok(false);
        };
        template.add_rating(score);
        let rating = template.rating();

        debug!(template_id = %id, score, rating, "rating added");
        self.events.emit(&CatalogEvent::Rated {
            template_id: id.to_string(),
            rating,
        });
        Ok(true)
    }

    /// Derives a new catalog template from an existing one.
    ///
    /// The copy gets a fresh id, the original's tags plus the requested ones,
    /// and zeroed usage and rating. The `customized` history entry is logged
    /// against the original.
    pub fn create_custom_from_template(
        &mut self,
        original_id: &str,
        request: CustomTemplateRequest,
    ) -> CoreResult<CatalogTemplate> {
        let original = self
            .templates
            .get(original_id)
            .ok_or_else(|| CoreError::NotFound(format!("Template not found: {original_id}")))?;
        self.ensure_capacity()?;

        let mut custom = original.clone();
        custom.template.id = new_id();
        custom.template.name = request.name;
        if request.description.is_some() {
            custom.template.description = request.description;
        }
        custom.template.created_at = now();
        custom.template.updated_at = custom.template.created_at;
        custom.tags.extend(request.tags);
        custom.featured = false;
        custom.premium = false;
        custom.system = false;
        custom.reset_signals();

        let id = custom.id().to_string();
        self.templates.insert(id.clone(), custom.clone());
        self.push_history(original_id, HistoryAction::Customized);

        info!(original_id = %original_id, template_id = %id, "custom template created");
        self.events.emit(&CatalogEvent::Added { template_id: id });
        Ok(custom)
    }

    // =========================================================================
    // Analytics
    // =========================================================================

    pub fn statistics(&self) -> CatalogStatistics {
        analytics::statistics(self.templates.values(), self.favorites.len())
    }

    /// Usage share per category
    pub fn category_stats(&self) -> Vec<UsageBreakdown> {
        analytics::category_usage(self.templates.values())
    }

    /// Usage share per platform
    pub fn platform_stats(&self) -> Vec<UsageBreakdown> {
        analytics::platform_usage(self.templates.values())
    }

    /// Recommends templates from the category of the most recently used one.
    ///
    /// Already-used templates are excluded. Falls back to [`get_popular`]
    /// when nothing was used or the last used template is gone.
    ///
    /// [`get_popular`]: TemplateCatalog::get_popular
    pub fn get_recommended_templates(&self, limit: usize) -> Vec<CatalogTemplate> {
        let usage: Vec<HistoryEntry> = self
            .get_usage_history()
            .into_iter()
            .filter(|e| e.action == HistoryAction::Used)
            .collect();
        let category = usage
            .first()
            .and_then(|entry| self.templates.get(&entry.template_id))
            .map(|t| t.category);
        let Some(category) = category else {
            return self.get_popular(limit);
        };

        let used: HashSet<&str> = usage.iter().map(|e| e.template_id.as_str()).collect();
        analytics::rank_by_popularity(
            self.templates
                .values()
                .filter(|t| t.category == category && !used.contains(t.id())),
        )
        .into_iter()
        .take(limit)
        .cloned()
        .collect()
    }

    // =========================================================================
    // Import / Export
    // =========================================================================

    /// Snapshot of templates, favorites and config
    pub fn export_library(&self) -> LibraryExport {
        LibraryExport {
            templates: self.get_all_templates(),
            favorites: self.get_favorite_ids(),
            config: self.config.clone(),
        }
    }

    pub fn export_library_json(&self) -> CoreResult<String> {
        Ok(serde_json::to_string_pretty(&self.export_library())?)
    }

    /// Replaces the whole catalog with a library payload and returns the
    /// number of templates imported.
    ///
    /// # Errors
    ///
    /// `ImportFailed` if the payload is not an object with a `templates`
    /// array, or holds more templates than `max_templates` allows; nothing
    /// is changed in those cases. A malformed template record, or one whose
    /// id repeats an earlier record, also fails with `ImportFailed`, but only
    /// after the catalog was cleared, leaving the records before it in place.
    pub fn import_library(&mut self, json: &str) -> CoreResult<usize> {
        let payload: Value = serde_json::from_str(json)
            .map_err(|e| CoreError::ImportFailed(format!("malformed library JSON: {e}")))?;
        let object = payload
            .as_object()
            .ok_or_else(|| CoreError::ImportFailed("library payload is not an object".into()))?;
        let records = object
            .get("templates")
            .and_then(Value::as_array)
            .ok_or_else(|| CoreError::ImportFailed("library payload has no templates array".into()))?;

        let favorites: Vec<TemplateId> = match object.get("favorites") {
            None | Some(Value::Null) => Vec::new(),
            Some(value) => Vec::deserialize(value)
                .map_err(|e| CoreError::ImportFailed(format!("invalid favorites: {e}")))?,
        };
        let config = match object.get("config") {
            None | Some(Value::Null) => None,
            Some(value) => {
                let mut config = LibraryConfig::deserialize(value)
                    .map_err(|e| CoreError::ImportFailed(format!("invalid config: {e}")))?;
                config.normalize();
                Some(config)
            }
        };

        let max_templates = config
            .as_ref()
            .map_or(self.config.max_templates, |c| c.max_templates);
        if records.len() > max_templates {
            return Err(CoreError::ImportFailed(format!(
                "library holds {} templates, more than the maximum of {max_templates}",
                records.len()
            )));
        }

        if let Some(config) = config {
            self.config = config;
        }
        self.templates.clear();
        self.favorites.clear();
        self.history.clear();

        for (index, record) in records.iter().enumerate() {
            let mut template = CatalogTemplate::deserialize(record).map_err(|e| {
                warn!(index, error = %e, "library import stopped at malformed template");
                CoreError::ImportFailed(format!("invalid template at index {index}: {e}"))
            })?;
            if template.template.id.is_empty() {
                template.template.id = new_id();
            }
            if self.templates.contains_key(template.id()) {
                warn!(index, id = %template.id(), "library import stopped at duplicate id");
                return Err(CoreError::ImportFailed(format!(
                    "duplicate template id '{}' at index {index}",
                    template.id()
                )));
            }
            template.normalize_signals();
            self.templates.insert(template.id().to_string(), template);
        }

        for id in favorites {
            if self.templates.contains_key(&id) {
                self.favorites.insert(id);
            }
        }

        let template_count = self.templates.len();
        info!(template_count, favorites = self.favorites.len(), "library imported");
        self.events.emit(&CatalogEvent::Imported { template_count });
        Ok(template_count)
    }

    /// Writes the library export to `path` atomically
    pub fn save_to_path(&self, path: &Path) -> CoreResult<()> {
        fs::atomic_write_json_pretty(path, &self.export_library())?;
        info!(path = %path.display(), "library saved");
        Ok(())
    }

    /// Replaces the catalog with the library stored at `path`
    pub fn load_from_path(&mut self, path: &Path) -> CoreResult<usize> {
        let json = fs::read_to_string(path)?;
        self.import_library(&json)
    }

    // =========================================================================
    // Administration
    // =========================================================================

    pub fn config(&self) -> &LibraryConfig {
        &self.config
    }

    /// Merges a config patch. A smaller history cap drops the oldest entries.
    pub fn update_config(&mut self, patch: LibraryConfigPatch) {
        if let Some(max) = patch.max_templates {
            self.config.max_templates = max;
        }
        if let Some(max) = patch.max_history_size {
            self.config.max_history_size = max;
        }
        if let Some(enabled) = patch.enable_history {
            self.config.enable_history = enabled;
        }
        self.config.normalize();
        self.history.truncate(self.config.max_history_size);

        debug!(config = ?self.config, "catalog config updated");
        self.events.emit(&CatalogEvent::ConfigUpdated);
    }

    /// Restores the seeded state: built-ins only, no favorites, no history
    pub fn reset(&mut self) {
        self.templates.clear();
        self.favorites.clear();
        self.history.clear();
        self.seed_builtins();
        info!("template catalog reset");
        self.events.emit(&CatalogEvent::Reset);
    }
}

impl Default for TemplateCatalog {
    fn default() -> Self {
        Self::new(LibraryConfig::default())
    }
}

impl fmt::Debug for TemplateCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateCatalog")
            .field("templates", &self.templates.len())
            .field("favorites", &self.favorites.len())
            .field("history", &self.history.len())
            .field("config", &self.config)
            .field("events", &self.events)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::events::NamedEvent;
    use crate::core::template::models::Template;
    use std::sync::Mutex as StdMutex;

    fn catalog() -> TemplateCatalog {
        TemplateCatalog::empty(LibraryConfig::default())
    }

    fn add(catalog: &mut TemplateCatalog, name: &str, category: TemplateCategory) -> TemplateId {
        catalog
            .add_template(NewCatalogTemplate::new(
                Template::new(name, 1920, 1080),
                category,
            ))
            .unwrap()
    }

    fn recorder(catalog: &mut TemplateCatalog) -> Arc<StdMutex<Vec<&'static str>>> {
        let names = Arc::new(StdMutex::new(Vec::new()));
        let sink = names.clone();
        catalog.subscribe(move |e| sink.lock().unwrap().push(e.name()));
        names
    }

    // ========================================================================
    // Construction & CRUD Tests
    // ========================================================================

    #[test]
    fn test_new_seeds_builtins() {
        let catalog = TemplateCatalog::default();
        assert_eq!(catalog.len(), builtin_templates().len());
        assert!(catalog.get_all_templates().iter().all(|t| t.system));
        assert!(!catalog.get_by_category(TemplateCategory::Educational).is_empty());
    }

    #[test]
    fn test_seeding_ignores_capacity() {
        let catalog = TemplateCatalog::new(LibraryConfig {
            max_templates: 1,
            ..Default::default()
        });
        assert_eq!(catalog.len(), builtin_templates().len());
    }

    #[test]
    fn test_add_at_capacity_fails() {
        let mut catalog = TemplateCatalog::new(LibraryConfig {
            max_templates: builtin_templates().len(),
            ..Default::default()
        });
        let result = catalog.add_template(NewCatalogTemplate::new(
            Template::new("Overflow", 1920, 1080),
            TemplateCategory::Personal,
        ));
        assert!(matches!(result, Err(CoreError::CapacityExceeded(_))));
    }

    #[test]
    fn test_add_duplicate_id_rejected() {
        let mut catalog = catalog();
        let mut template = Template::new("A", 100, 100);
        template.id = "fixed".to_string();
        let new = NewCatalogTemplate::new(template, TemplateCategory::Social);

        assert_eq!(catalog.add_template(new.clone()).unwrap(), "fixed");
        assert!(matches!(
            catalog.add_template(new),
            Err(CoreError::AlreadyExists(id)) if id == "fixed"
        ));
    }

    #[test]
    fn test_add_generates_missing_id() {
        let mut catalog = catalog();
        let mut template = Template::new("A", 100, 100);
        template.id.clear();
        let id = catalog
            .add_template(NewCatalogTemplate::new(template, TemplateCategory::Social))
            .unwrap();
        assert!(!id.is_empty());
    }

    #[test]
    fn test_get_template_records_view() {
        let mut catalog = catalog();
        let id = add(&mut catalog, "Intro", TemplateCategory::Business);

        assert_eq!(catalog.get_template(&id).unwrap().name(), "Intro");
        assert!(catalog.get_template("missing").is_none());
        assert!(catalog.peek_template(&id).is_some());

        let history = catalog.get_history(10);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].action, HistoryAction::Viewed);
    }

    #[test]
    fn test_update_and_remove() {
        let mut catalog = catalog();
        let events = recorder(&mut catalog);
        let id = add(&mut catalog, "Intro", TemplateCategory::Business);
        catalog.add_to_favorites(&id);

        assert!(catalog.update_template(
            &id,
            CatalogTemplatePatch {
                category: Some(TemplateCategory::Presentation),
                ..Default::default()
            }
        ));
        assert_eq!(
            catalog.peek_template(&id).unwrap().category,
            TemplateCategory::Presentation
        );
        assert!(!catalog.update_template("missing", CatalogTemplatePatch::default()));

        assert!(catalog.remove_template(&id));
        assert!(!catalog.is_favorite(&id));
        assert!(!catalog.remove_template(&id));

        assert_eq!(
            *events.lock().unwrap(),
            vec!["template:added", "favorite:added", "template:updated", "template:removed"]
        );
    }

    // ========================================================================
    // Search Tests
    // ========================================================================

    #[test]
    fn test_search_pagination() {
        let mut catalog = catalog();
        for i in 0..25 {
            add(&mut catalog, &format!("Promo {i}"), TemplateCategory::Marketing);
        }

        let page = catalog.search("promo", &SearchFilters::default(), 3, 10);
        assert_eq!(page.total, 25);
        assert_eq!(page.templates.len(), 5);
        assert_eq!(page.templates[0].name(), "Promo 20");

        let beyond = catalog.search("promo", &SearchFilters::default(), 4, 10);
        assert_eq!(beyond.total, 25);
        assert!(beyond.templates.is_empty());

        let zero = catalog.search("promo", &SearchFilters::default(), 0, 10);
        assert_eq!(zero.page, 1);
        assert_eq!(zero.templates[0].name(), "Promo 0");
    }

    #[test]
    fn test_search_with_filters() {
        let mut catalog = TemplateCatalog::default();
        let results = catalog.search(
            "",
            &SearchFilters {
                featured: Some(true),
                premium: Some(true),
                ..Default::default()
            },
            1,
            20,
        );
        assert_eq!(results.total, 1);
        assert_eq!(results.templates[0].name(), "Product Launch Promo");

        let id = add(&mut catalog, "Story Remix", TemplateCategory::Social);
        let query = SearchQuery::new("STORY").with_filters(SearchFilters {
            category: Some(TemplateCategory::Social),
            ..Default::default()
        });
        let found = catalog.search_templates(&query);
        assert_eq!(found.len(), 2);
        assert!(found.iter().any(|t| t.id() == id));
    }

    #[test]
    fn test_browse_helpers() {
        let catalog = TemplateCatalog::default();
        assert_eq!(catalog.get_featured().len(), 2);
        assert_eq!(catalog.get_by_size(TemplateSize::Square).len(), 1);
        assert_eq!(
            catalog
                .get_by_tags(&["SOCIAL".to_string(), "family".to_string()])
                .len(),
            3
        );
        assert_eq!(
            catalog
                .filter(&SearchFilters {
                    size: Some(TemplateSize::Portrait),
                    ..Default::default()
                })
                .len(),
            2
        );
    }

    #[test]
    fn test_popular_and_recent_limits() {
        let mut catalog = catalog();
        let a = add(&mut catalog, "A", TemplateCategory::Social);
        let b = add(&mut catalog, "B", TemplateCategory::Social);
        catalog.record_usage(&b);

        assert!(catalog.get_popular(0).is_empty());
        assert!(catalog.get_recent(0).is_empty());
        assert_eq!(catalog.get_popular(1)[0].id(), b);
        assert_eq!(catalog.get_popular(10).len(), 2);
        assert!(catalog.get_recent(10).iter().any(|t| t.id() == a));
    }

    // ========================================================================
    // Favorites Tests
    // ========================================================================

    #[test]
    fn test_favorites() {
        let mut catalog = catalog();
        let a = add(&mut catalog, "A", TemplateCategory::Social);
        let b = add(&mut catalog, "B", TemplateCategory::Social);

        assert!(catalog.add_to_favorites(&b));
        assert!(!catalog.add_to_favorites(&b));
        assert!(!catalog.add_to_favorites("missing"));
        assert!(catalog.toggle_favorite(&a));
        assert_eq!(catalog.get_favorite_ids(), vec![b.clone(), a.clone()]);
        assert_eq!(catalog.get_favorites()[0].id(), b);

        assert!(!catalog.toggle_favorite(&a));
        assert!(!catalog.is_favorite(&a));
        assert!(!catalog.remove_from_favorites("missing"));
        assert!(catalog.remove_from_favorites(&b));
        assert!(catalog.get_favorites().is_empty());
    }

    // ========================================================================
    // Usage, History & Rating Tests
    // ========================================================================

    #[test]
    fn test_record_usage() {
        let mut catalog = catalog();
        let id = add(&mut catalog, "A", TemplateCategory::Social);

        assert!(catalog.record_usage(&id));
        assert!(catalog.record_usage(&id));
        assert!(!catalog.record_usage("missing"));

        assert_eq!(catalog.get_usage_count(&id), 2);
        assert_eq!(catalog.get_usage_count("missing"), 0);
        assert_eq!(catalog.peek_template(&id).unwrap().popularity(), 2.0);
        assert_eq!(catalog.get_usage_history().len(), 2);
    }

    #[test]
    fn test_usage_history_matches_full_history() {
        let mut catalog = catalog();
        let id = add(&mut catalog, "A", TemplateCategory::Social);
        catalog.get_template(&id);
        catalog.record_usage(&id);

        let history = catalog.get_usage_history();
        assert_eq!(history, catalog.get_history(usize::MAX));
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].action, HistoryAction::Used);
        assert_eq!(history[1].action, HistoryAction::Viewed);
    }

    #[test]
    fn test_history_cap_most_recent_first() {
        let mut catalog = TemplateCatalog::empty(LibraryConfig {
            max_history_size: 3,
            ..Default::default()
        });
        let ids: Vec<_> = (0..5)
            .map(|i| add(&mut catalog, &format!("T{i}"), TemplateCategory::Social))
            .collect();
        for id in &ids {
            catalog.record_usage(id);
        }

        let history = catalog.get_history(100);
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].template_id, ids[4]);
        assert_eq!(history[2].template_id, ids[2]);
        assert_eq!(catalog.get_history(1).len(), 1);

        catalog.update_config(LibraryConfigPatch {
            max_history_size: Some(2),
            ..Default::default()
        });
        assert_eq!(catalog.get_history(100).len(), 2);

        catalog.clear_history();
        assert!(catalog.get_history(100).is_empty());
    }

    #[test]
    fn test_history_disabled() {
        let mut catalog = TemplateCatalog::empty(LibraryConfig {
            enable_history: false,
            ..Default::default()
        });
        let id = add(&mut catalog, "A", TemplateCategory::Social);
        catalog.get_template(&id);
        catalog.record_usage(&id);

        assert!(catalog.get_history(10).is_empty());
        assert!(catalog.get_usage_history().is_empty());
        assert_eq!(catalog.get_usage_count(&id), 1);
    }

    #[test]
    fn test_rating_checks_range_before_id() {
        let mut catalog = catalog();
        let id = add(&mut catalog, "A", TemplateCategory::Social);

        assert!(matches!(
            catalog.add_rating("missing", 6.0),
            Err(CoreError::InvalidRating(_))
        ));
        assert!(matches!(
            catalog.add_rating(&id, 0.0),
            Err(CoreError::InvalidRating(_))
        ));
        assert!(catalog.add_rating(&id, f64::NAN).is_err());
        assert!(!catalog.add_rating("missing", 3.0).unwrap());
    }

    #[test]
    fn test_rating_running_mean() {
        let mut catalog = catalog();
        let id = add(&mut catalog, "A", TemplateCategory::Social);
        for score in [5.0, 5.0, 4.0, 4.0, 4.0, 4.0, 4.0, 4.0, 4.0, 4.0] {
            catalog.add_rating(&id, score).unwrap();
        }
        catalog.add_rating(&id, 1.0).unwrap();

        let template = catalog.peek_template(&id).unwrap();
        assert_eq!(template.reviews(), 11);
        assert!((template.rating() - 43.0 / 11.0).abs() < 1e-9);
        assert!((template.popularity() - template.rating() * 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_create_custom_from_template() {
        let mut catalog = TemplateCatalog::default();
        let original = catalog.get_featured()[0].clone();
        catalog.record_usage(original.id());
        catalog.add_rating(original.id(), 5.0).unwrap();

        let custom = catalog
            .create_custom_from_template(
                original.id(),
                CustomTemplateRequest::new("My Deck").with_tag("mine"),
            )
            .unwrap();

        assert_ne!(custom.id(), original.id());
        assert_eq!(custom.name(), "My Deck");
        assert_eq!(custom.template.placeholders.len(), original.template.placeholders.len());
        assert!(custom.tags.contains("mine"));
        assert!(original.tags.iter().all(|t| custom.tags.contains(t)));
        assert_eq!(custom.usage_count(), 0);
        assert_eq!(custom.rating(), 0.0);
        assert_eq!(custom.popularity(), 0.0);
        assert!(!custom.featured && !custom.premium && !custom.system);

        let last = &catalog.get_history(1)[0];
        assert_eq!(last.action, HistoryAction::Customized);
        assert_eq!(last.template_id, original.id());

        assert!(matches!(
            catalog.create_custom_from_template("missing", CustomTemplateRequest::new("x")),
            Err(CoreError::NotFound(_))
        ));
    }

    // ========================================================================
    // Analytics & Recommendation Tests
    // ========================================================================

    #[test]
    fn test_statistics_and_breakdowns() {
        let mut catalog = TemplateCatalog::default();
        assert!(catalog.category_stats().is_empty());

        let social = catalog.get_by_category(TemplateCategory::Social)[0].clone();
        catalog.record_usage(social.id());
        catalog.record_usage(social.id());
        catalog.add_to_favorites(social.id());

        let stats = catalog.statistics();
        assert_eq!(stats.total_templates, builtin_templates().len());
        assert_eq!(stats.total_usage, 2);
        assert_eq!(stats.favorites_count, 1);
        assert_eq!(stats.most_popular[0].id, social.id());

        let categories = catalog.category_stats();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].key, "social");
        assert_eq!(categories[0].percentage, 100.0);
        assert_eq!(catalog.platform_stats().len(), social.platforms.len());
    }

    #[test]
    fn test_recommendations_same_category_excluding_used() {
        let mut catalog = catalog();
        let used = add(&mut catalog, "Used", TemplateCategory::Social);
        let low = add(&mut catalog, "Low", TemplateCategory::Social);
        let high = add(&mut catalog, "High", TemplateCategory::Social);
        add(&mut catalog, "Other", TemplateCategory::Business);
        catalog.add_rating(&high, 5.0).unwrap();
        catalog.add_rating(&low, 1.0).unwrap();
        catalog.record_usage(&used);

        let ids: Vec<_> = catalog
            .get_recommended_templates(5)
            .iter()
            .map(|t| t.id().to_string())
            .collect();
        assert_eq!(ids, vec![high, low]);
    }

    #[test]
    fn test_recommendations_fall_back_to_popular() {
        let mut catalog = catalog();
        let a = add(&mut catalog, "A", TemplateCategory::Social);
        add(&mut catalog, "B", TemplateCategory::Social);
        catalog.add_rating(&a, 3.0).unwrap();

        assert_eq!(catalog.get_recommended_templates(1)[0].id(), a);

        catalog.record_usage(&a);
        catalog.remove_template(&a);
        assert_eq!(catalog.get_recommended_templates(5).len(), 1);
    }

    // ========================================================================
    // Import / Export Tests
    // ========================================================================

    #[test]
    fn test_export_import_round_trip() {
        let mut source = TemplateCatalog::default();
        let id = add(&mut source, "Custom", TemplateCategory::Personal);
        source.add_to_favorites(&id);
        source.record_usage(&id);
        source.add_rating(&id, 4.0).unwrap();
        let json = source.export_library_json().unwrap();

        let mut target = TemplateCatalog::empty(LibraryConfig::default());
        let count = target.import_library(&json).unwrap();

        assert_eq!(count, source.len());
        assert_eq!(target.get_favorite_ids(), vec![id.clone()]);
        let imported = target.peek_template(&id).unwrap();
        let original = source.peek_template(&id).unwrap();
        assert_eq!(imported, original);
    }

    #[test]
    fn test_import_rejects_bad_shape_without_mutation() {
        let mut catalog = TemplateCatalog::default();
        let before = catalog.len();

        for payload in ["not json", "[]", r#"{"favorites": []}"#, r#"{"templates": 3}"#] {
            assert!(matches!(
                catalog.import_library(payload),
                Err(CoreError::ImportFailed(_))
            ));
        }
        assert_eq!(catalog.len(), before);
    }

    #[test]
    fn test_import_bad_record_leaves_partial_state() {
        let mut catalog = TemplateCatalog::default();
        let payload = r#"{
            "templates": [
                { "id": "ok", "name": "Good", "category": "social" },
                { "id": "bad", "category": "social" }
            ]
        }"#;

        assert!(matches!(
            catalog.import_library(payload),
            Err(CoreError::ImportFailed(_))
        ));
        assert_eq!(catalog.len(), 1);
        assert!(catalog.peek_template("ok").is_some());
    }

    #[test]
    fn test_import_rejects_duplicate_ids() {
        let mut catalog = TemplateCatalog::default();
        let payload = r#"{
            "templates": [
                { "id": "dup", "name": "First", "category": "social" },
                { "id": "dup", "name": "Second", "category": "social" }
            ]
        }"#;

        assert!(matches!(
            catalog.import_library(payload),
            Err(CoreError::ImportFailed(_))
        ));
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.peek_template("dup").unwrap().name(), "First");
    }

    #[test]
    fn test_import_respects_max_templates() {
        let mut catalog = TemplateCatalog::default();
        let before = catalog.len();
        let payload = r#"{
            "templates": [
                { "name": "A", "category": "social" },
                { "name": "B", "category": "social" },
                { "name": "C", "category": "social" }
            ],
            "config": { "maxTemplates": 1 }
        }"#;

        assert!(matches!(
            catalog.import_library(payload),
            Err(CoreError::ImportFailed(_))
        ));
        assert_eq!(catalog.len(), before);
        assert_eq!(catalog.config().max_templates, LibraryConfig::default().max_templates);

        let mut small = TemplateCatalog::empty(LibraryConfig {
            max_templates: 2,
            ..Default::default()
        });
        let fits = r#"{ "templates": [{ "name": "A", "category": "social" }] }"#;
        assert_eq!(small.import_library(fits).unwrap(), 1);
        assert!(small
            .add_template(NewCatalogTemplate::new(
                Template::new("B", 1080, 1080),
                TemplateCategory::Social,
            ))
            .is_ok());
    }

    #[test]
    fn test_save_and_load_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("library.json");

        let mut source = TemplateCatalog::default();
        let id = add(&mut source, "Saved", TemplateCategory::Business);
        source.save_to_path(&path).unwrap();

        let mut target = TemplateCatalog::empty(LibraryConfig::default());
        assert_eq!(target.load_from_path(&path).unwrap(), source.len());
        assert!(target.peek_template(&id).is_some());

        assert!(matches!(
            target.load_from_path(&dir.path().join("missing.json")),
            Err(CoreError::NotFound(_))
        ));
    }

    // ========================================================================
    // Administration Tests
    // ========================================================================

    #[test]
    fn test_reset_restores_builtins() {
        let mut catalog = TemplateCatalog::default();
        let events = recorder(&mut catalog);
        let id = add(&mut catalog, "Extra", TemplateCategory::Business);
        catalog.add_to_favorites(&id);
        catalog.record_usage(&id);

        catalog.reset();
        assert_eq!(catalog.len(), builtin_templates().len());
        assert!(catalog.get_favorite_ids().is_empty());
        assert!(catalog.get_history(10).is_empty());
        assert_eq!(events.lock().unwrap().last(), Some(&"reset"));
    }

    #[test]
    fn test_unsubscribe_stops_events() {
        let mut catalog = catalog();
        let names = Arc::new(StdMutex::new(Vec::new()));
        let sink = names.clone();
        let listener = catalog.subscribe(move |e: &CatalogEvent| sink.lock().unwrap().push(e.name()));

        add(&mut catalog, "A", TemplateCategory::Social);
        assert!(catalog.unsubscribe(listener));
        add(&mut catalog, "B", TemplateCategory::Social);

        assert_eq!(names.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_shared_catalog() {
        let shared = TemplateCatalog::default().into_shared();
        let id = shared.lock().await.get_featured()[0].id().to_string();

        let mut handles = Vec::new();
        for _ in 0..4 {
            let shared = shared.clone();
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                shared.lock().await.record_usage(&id)
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap());
        }

        assert_eq!(shared.lock().await.get_usage_count(&id), 4);
    }
}
