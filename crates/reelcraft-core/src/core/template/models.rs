//! Template Models
//!
//! The renderable template record shared by the engine and the catalog, and
//! the placeholder slots it carries.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::{new_id, now, PlaceholderId, TemplateId, TimeSec, Timestamp};

/// Default canvas width for records that omit it
pub const DEFAULT_WIDTH: u32 = 1920;
/// Default canvas height for records that omit it
pub const DEFAULT_HEIGHT: u32 = 1080;
/// Default frame rate
pub const DEFAULT_FPS: u32 = 30;
/// Default duration in seconds
pub const DEFAULT_DURATION: TimeSec = 10.0;
/// Default background color
pub const DEFAULT_BACKGROUND: &str = "#000000";
/// Default template version
pub const DEFAULT_VERSION: &str = "1.0.0";

fn default_width() -> u32 {
    DEFAULT_WIDTH
}

fn default_height() -> u32 {
    DEFAULT_HEIGHT
}

fn default_fps() -> u32 {
    DEFAULT_FPS
}

fn default_duration() -> TimeSec {
    DEFAULT_DURATION
}

fn default_background() -> String {
    DEFAULT_BACKGROUND.to_string()
}

fn default_version() -> String {
    DEFAULT_VERSION.to_string()
}

// =============================================================================
// Status
// =============================================================================

/// Template lifecycle status.
///
/// Set at creation or import time. Validation reports never write it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateStatus {
    /// Being authored
    #[default]
    Draft,
    /// Considered renderable
    Valid,
    /// Known to be broken
    Invalid,
}

impl std::fmt::Display for TemplateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateStatus::Draft => write!(f, "draft"),
            TemplateStatus::Valid => write!(f, "valid"),
            TemplateStatus::Invalid => write!(f, "invalid"),
        }
    }
}

// =============================================================================
// Placeholder
// =============================================================================

/// Kind of content substituted into a placeholder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderType {
    /// Text overlay
    Text,
    /// Still image
    Image,
    /// Video clip
    Video,
    /// Audio track
    Audio,
}

impl PlaceholderType {
    /// Returns whether this placeholder occupies canvas space
    pub fn is_visual(&self) -> bool {
        !matches!(self, PlaceholderType::Audio)
    }
}

impl std::fmt::Display for PlaceholderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaceholderType::Text => write!(f, "text"),
            PlaceholderType::Image => write!(f, "image"),
            PlaceholderType::Video => write!(f, "video"),
            PlaceholderType::Audio => write!(f, "audio"),
        }
    }
}

/// A positioned, timed content slot within a template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placeholder {
    /// Placeholder ID (unique within its template)
    #[serde(default = "new_id")]
    pub id: PlaceholderId,
    /// Display name, also accepted as a data key
    pub name: String,
    /// Content kind
    #[serde(rename = "type")]
    pub kind: PlaceholderType,
    /// Left edge in pixels
    #[serde(default)]
    pub x: f64,
    /// Top edge in pixels
    #[serde(default)]
    pub y: f64,
    /// Width in pixels
    #[serde(default)]
    pub width: f64,
    /// Height in pixels
    #[serde(default)]
    pub height: f64,
    /// Appearance time in seconds
    #[serde(default)]
    pub start_time: TimeSec,
    /// Visible duration in seconds
    #[serde(default)]
    pub duration: TimeSec,
    /// Whether render data must supply a value
    #[serde(default)]
    pub required: bool,
    /// Value substituted when render data has none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<serde_json::Value>,
    /// Free-form style properties
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<HashMap<String, serde_json::Value>>,
}

impl Placeholder {
    /// Right edge (x + width)
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge (y + height)
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// End time (start + duration)
    pub fn end_time(&self) -> TimeSec {
        self.start_time + self.duration
    }

    /// Returns whether the geometry lies within a `width` x `height` canvas.
    /// Negative extents never fit.
    pub fn fits_canvas(&self, width: u32, height: u32) -> bool {
        self.x >= 0.0
            && self.y >= 0.0
            && self.width >= 0.0
            && self.height >= 0.0
            && self.right() <= width as f64
            && self.bottom() <= height as f64
    }

    /// Returns whether the timing lies within `[0, duration]`
    pub fn fits_duration(&self, duration: TimeSec) -> bool {
        self.start_time >= 0.0 && self.end_time() <= duration
    }
}

/// Input for creating a placeholder; the owner assigns the id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPlaceholder {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: PlaceholderType,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub start_time: TimeSec,
    #[serde(default)]
    pub duration: TimeSec,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default_value: Option<serde_json::Value>,
    #[serde(default)]
    pub style: Option<HashMap<String, serde_json::Value>>,
}

impl NewPlaceholder {
    /// Creates a zero-sized, zero-length placeholder
    pub fn new(name: impl Into<String>, kind: PlaceholderType) -> Self {
        Self {
            name: name.into(),
            kind,
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            start_time: 0.0,
            duration: 0.0,
            required: false,
            default_value: None,
            style: None,
        }
    }

    /// Sets position and size
    pub fn with_geometry(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.x = x;
        self.y = y;
        self.width = width;
        self.height = height;
        self
    }

    /// Sets start time and duration
    pub fn with_timing(mut self, start_time: TimeSec, duration: TimeSec) -> Self {
        self.start_time = start_time;
        self.duration = duration;
        self
    }

    /// Sets whether required
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Sets the default value
    pub fn with_default<T: Into<serde_json::Value>>(mut self, value: T) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Sets a style property
    pub fn with_style(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.style
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value);
        self
    }

    /// Converts into a placeholder with a fresh id
    pub fn into_placeholder(self) -> Placeholder {
        Placeholder {
            id: new_id(),
            name: self.name,
            kind: self.kind,
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            start_time: self.start_time,
            duration: self.duration,
            required: self.required,
            default_value: self.default_value,
            style: self.style,
        }
    }
}

/// Partial placeholder update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlaceholderPatch {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<PlaceholderType>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub start_time: Option<TimeSec>,
    pub duration: Option<TimeSec>,
    pub required: Option<bool>,
    pub default_value: Option<serde_json::Value>,
    pub style: Option<HashMap<String, serde_json::Value>>,
}

impl PlaceholderPatch {
    /// Merges the set fields into `placeholder`
    pub fn apply(self, placeholder: &mut Placeholder) {
        if let Some(name) = self.name {
            placeholder.name = name;
        }
        if let Some(kind) = self.kind {
            placeholder.kind = kind;
        }
        if let Some(x) = self.x {
            placeholder.x = x;
        }
        if let Some(y) = self.y {
            placeholder.y = y;
        }
        if let Some(width) = self.width {
            placeholder.width = width;
        }
        if let Some(height) = self.height {
            placeholder.height = height;
        }
        if let Some(start_time) = self.start_time {
            placeholder.start_time = start_time;
        }
        if let Some(duration) = self.duration {
            placeholder.duration = duration;
        }
        if let Some(required) = self.required {
            placeholder.required = required;
        }
        if let Some(value) = self.default_value {
            placeholder.default_value = Some(value);
        }
        if let Some(style) = self.style {
            placeholder.style = Some(style);
        }
    }
}

// =============================================================================
// Template
// =============================================================================

/// Canonical renderable unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    /// Unique template ID
    #[serde(default)]
    pub id: TemplateId,
    /// Display name
    pub name: String,
    /// Description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Canvas width in pixels
    #[serde(default = "default_width")]
    pub width: u32,
    /// Canvas height in pixels
    #[serde(default = "default_height")]
    pub height: u32,
    /// Frame rate
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Total duration in seconds
    #[serde(default = "default_duration")]
    pub duration: TimeSec,
    /// Canvas background color (`#RRGGBB`)
    #[serde(default = "default_background")]
    pub background_color: String,
    /// Content slots
    #[serde(default)]
    pub placeholders: Vec<Placeholder>,
    /// Arbitrary template variables
    #[serde(default)]
    pub variables: HashMap<String, serde_json::Value>,
    /// Lifecycle status
    #[serde(default)]
    pub status: TemplateStatus,
    /// Version string
    #[serde(default = "default_version")]
    pub version: String,
    /// Creation timestamp
    #[serde(default = "now")]
    pub created_at: Timestamp,
    /// Last modification timestamp
    #[serde(default = "now")]
    pub updated_at: Timestamp,
}

impl Template {
    /// Creates a draft template with default fps, duration and background
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        let created = now();
        Self {
            id: new_id(),
            name: name.into(),
            description: None,
            width,
            height,
            fps: DEFAULT_FPS,
            duration: DEFAULT_DURATION,
            background_color: default_background(),
            placeholders: Vec::new(),
            variables: HashMap::new(),
            status: TemplateStatus::Draft,
            version: default_version(),
            created_at: created,
            updated_at: created,
        }
    }

    /// Sets the description
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Sets the frame rate
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    /// Sets the duration
    pub fn with_duration(mut self, seconds: TimeSec) -> Self {
        self.duration = seconds;
        self
    }

    /// Sets the background color
    pub fn with_background(mut self, color: impl Into<String>) -> Self {
        self.background_color = color.into();
        self
    }

    /// Adds a placeholder
    pub fn with_placeholder(mut self, placeholder: NewPlaceholder) -> Self {
        self.placeholders.push(placeholder.into_placeholder());
        self
    }

    /// Sets a variable
    pub fn with_variable(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.variables.insert(key.into(), value);
        self
    }

    /// Sets the status
    pub fn with_status(mut self, status: TemplateStatus) -> Self {
        self.status = status;
        self
    }

    /// Refreshes `updated_at`
    pub fn touch(&mut self) {
        self.updated_at = now();
    }

    /// Gets a placeholder by ID
    pub fn placeholder(&self, id: &str) -> Option<&Placeholder> {
        self.placeholders.iter().find(|p| p.id == id)
    }

    /// Gets a mutable placeholder by ID
    pub fn placeholder_mut(&mut self, id: &str) -> Option<&mut Placeholder> {
        self.placeholders.iter_mut().find(|p| p.id == id)
    }

    /// Returns the count of required placeholders
    pub fn required_placeholder_count(&self) -> usize {
        self.placeholders.iter().filter(|p| p.required).count()
    }

    /// Total frame count at the template frame rate
    pub fn frame_count(&self) -> u64 {
        (self.duration.max(0.0) * self.fps as f64).round() as u64
    }

    /// Returns the reduced aspect ratio as a string, e.g. `16:9`
    pub fn aspect_ratio(&self) -> String {
        let divisor = gcd(self.width, self.height).max(1);
        format!("{}:{}", self.width / divisor, self.height / divisor)
    }
}

/// Greatest common divisor for aspect ratio calculation
fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

/// Optional fields for [`TemplateEngine::create_template`](super::TemplateEngine::create_template)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateTemplateOptions {
    pub description: Option<String>,
    pub fps: Option<u32>,
    pub duration: Option<TimeSec>,
    pub background_color: Option<String>,
    pub variables: HashMap<String, serde_json::Value>,
    pub status: Option<TemplateStatus>,
}

/// Partial template update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TemplatePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fps: Option<u32>,
    pub duration: Option<TimeSec>,
    pub background_color: Option<String>,
    pub placeholders: Option<Vec<Placeholder>>,
    pub variables: Option<HashMap<String, serde_json::Value>>,
    pub status: Option<TemplateStatus>,
    pub version: Option<String>,
}

impl TemplatePatch {
    /// Merges the set fields into `template` and refreshes `updated_at`
    pub fn apply(self, template: &mut Template) {
        if let Some(name) = self.name {
            template.name = name;
        }
        if let Some(description) = self.description {
            template.description = Some(description);
        }
        if let Some(width) = self.width {
            template.width = width;
        }
        if let Some(height) = self.height {
            template.height = height;
        }
        if let Some(fps) = self.fps {
            template.fps = fps;
        }
        if let Some(duration) = self.duration {
            template.duration = duration;
        }
        if let Some(color) = self.background_color {
            template.background_color = color;
        }
        if let Some(placeholders) = self.placeholders {
            template.placeholders = placeholders;
        }
        if let Some(variables) = self.variables {
            template.variables = variables;
        }
        if let Some(status) = self.status {
            template.status = status;
        }
        if let Some(version) = self.version {
            template.version = version;
        }
        template.touch();
    }
}

// ============================================================================
// Tests
// ============================================================================
