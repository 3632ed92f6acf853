//! Template Engine
//!
//! Authoring-time template and placeholder management, structural validation
//! and the validation-gated render pipeline.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::cache::{CacheStats, TemplateCache};
use super::models::{
    CreateTemplateOptions, NewPlaceholder, Placeholder, PlaceholderPatch, PlaceholderType,
    Template, TemplatePatch, TemplateStatus, DEFAULT_BACKGROUND, DEFAULT_DURATION, DEFAULT_FPS,
};
use super::render::{
    MockRenderBackend, RenderBackend, RenderConfig, RenderJob, RenderRequest, RenderResult,
    RenderStatistics,
};
use super::validation::{self, TemplateData, ValidationResult};
use crate::core::events::{event_names, EventEmitter, NamedEvent};
use crate::core::{new_id, now, CoreResult, ListenerId, PlaceholderId, TemplateId, TimeSec};

/// Engine shared across tasks behind a single lock
pub type SharedTemplateEngine = Arc<Mutex<TemplateEngine>>;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the template engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Placeholders allowed per template
    pub max_placeholders: usize,
    /// Whether the key/value cache accepts writes
    pub cache_templates: bool,
    /// Frame rate for new templates
    pub default_fps: u32,
    /// Duration in seconds for new templates
    pub default_duration: TimeSec,
    /// Background color for new templates
    pub default_background_color: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_placeholders: 50,
            cache_templates: false,
            default_fps: DEFAULT_FPS,
            default_duration: DEFAULT_DURATION,
            default_background_color: DEFAULT_BACKGROUND.to_string(),
        }
    }
}

impl EngineConfig {
    /// Clamps values so the engine always has a usable configuration
    pub fn normalize(&mut self) {
        self.max_placeholders = self.max_placeholders.max(1);
        self.default_fps = self.default_fps.clamp(1, 240);
        if !self.default_duration.is_finite() || self.default_duration <= 0.0 {
            self.default_duration = DEFAULT_DURATION;
        }
        if self.default_background_color.trim().is_empty() {
            self.default_background_color = DEFAULT_BACKGROUND.to_string();
        }
    }
}

/// Partial engine configuration update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfigPatch {
    pub max_placeholders: Option<usize>,
    pub cache_templates: Option<bool>,
    pub default_fps: Option<u32>,
    pub default_duration: Option<TimeSec>,
    pub default_background_color: Option<String>,
}

// =============================================================================
// Events & Statistics
// =============================================================================

/// Engine notifications
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum EngineEvent {
    TemplateCreated {
        template_id: TemplateId,
    },
    TemplateUpdated {
        template_id: TemplateId,
    },
    TemplateDeleted {
        template_id: TemplateId,
    },
    TemplateDuplicated {
        source_id: TemplateId,
        template_id: TemplateId,
    },
    TemplateImported {
        template_id: TemplateId,
    },
    PlaceholderAdded {
        template_id: TemplateId,
        placeholder_id: PlaceholderId,
    },
    PlaceholderUpdated {
        template_id: TemplateId,
        placeholder_id: PlaceholderId,
    },
    PlaceholderRemoved {
        template_id: TemplateId,
        placeholder_id: PlaceholderId,
    },
    RenderStarted {
        template_id: TemplateId,
    },
    RenderCompleted {
        template_id: TemplateId,
        output_path: PathBuf,
        duration_ms: f64,
    },
    RenderFailed {
        template_id: TemplateId,
        error: String,
    },
    ConfigUpdated,
    Reset,
    ImportFailed {
        message: String,
    },
    Error {
        message: String,
    },
}

impl NamedEvent for EngineEvent {
    fn name(&self) -> &'static str {
        match self {
            EngineEvent::TemplateCreated { .. } => event_names::TEMPLATE_ADDED,
            EngineEvent::TemplateUpdated { .. } => event_names::TEMPLATE_UPDATED,
            EngineEvent::TemplateDeleted { .. } => event_names::TEMPLATE_REMOVED,
            EngineEvent::TemplateDuplicated { .. } => event_names::TEMPLATE_DUPLICATED,
            EngineEvent::TemplateImported { .. } => event_names::TEMPLATE_IMPORTED,
            EngineEvent::PlaceholderAdded { .. } => event_names::PLACEHOLDER_ADDED,
            EngineEvent::PlaceholderUpdated { .. } => event_names::PLACEHOLDER_UPDATED,
            EngineEvent::PlaceholderRemoved { .. } => event_names::PLACEHOLDER_REMOVED,
            EngineEvent::RenderStarted { .. } => event_names::RENDER_STARTED,
            EngineEvent::RenderCompleted { .. } => event_names::RENDER_COMPLETED,
            EngineEvent::RenderFailed { .. } => event_names::RENDER_FAILED,
            EngineEvent::ConfigUpdated => event_names::CONFIG_UPDATED,
            EngineEvent::Reset => event_names::RESET,
            EngineEvent::ImportFailed { .. } => event_names::IMPORT_FAILED,
            EngineEvent::Error { .. } => event_names::ERROR,
        }
    }
}

/// Engine statistics snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStatistics {
    pub total_templates: usize,
    pub total_placeholders: usize,
    /// Template count per status name
    pub templates_by_status: BTreeMap<String, usize>,
    #[serde(flatten)]
    pub render: RenderStatistics,
    pub cache: CacheStats,
}

// =============================================================================
// Engine
// =============================================================================

/// Main template engine
pub struct TemplateEngine {
    /// Authoring templates in creation order
    templates: IndexMap<TemplateId, Template>,
    /// Engine configuration
    config: EngineConfig,
    /// Advisory key/value cache
    cache: TemplateCache,
    /// Running render statistics
    render_stats: RenderStatistics,
    /// Output producer
    backend: Box<dyn RenderBackend>,
    /// Registered observers
    events: EventEmitter<EngineEvent>,
}

impl TemplateEngine {
    /// Creates an engine with the default config and the mock backend
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Creates an engine with config and the mock backend
    pub fn with_config(config: EngineConfig) -> Self {
        Self::with_backend(config, Box::new(MockRenderBackend::new()))
    }

    /// Creates an engine with config and a render backend
    pub fn with_backend(mut config: EngineConfig, backend: Box<dyn RenderBackend>) -> Self {
        config.normalize();
        Self {
            templates: IndexMap::new(),
            cache: TemplateCache::new(config.cache_templates),
            config,
            render_stats: RenderStatistics::default(),
            backend,
            events: EventEmitter::new(),
        }
    }

    /// Wraps the engine for shared use
    pub fn into_shared(self) -> SharedTemplateEngine {
        Arc::new(Mutex::new(self))
    }

    /// Replaces the render backend
    pub fn set_backend(&mut self, backend: Box<dyn RenderBackend>) {
        self.backend = backend;
    }

    /// Registers an observer
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: Fn(&EngineEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(listener)
    }

    /// Removes an observer
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }

    // -------------------------------------------------------------------------
    // Templates
    // -------------------------------------------------------------------------

    /// Creates a template and returns its id. New templates start as `valid`.
    pub fn create_template(
        &mut self,
        name: impl Into<String>,
        width: u32,
        height: u32,
        options: CreateTemplateOptions,
    ) -> TemplateId {
        let mut template = Template::new(name, width, height)
            .with_fps(options.fps.unwrap_or(self.config.default_fps))
            .with_duration(options.duration.unwrap_or(self.config.default_duration))
            .with_background(
                options
                    .background_color
                    .unwrap_or_else(|| self.config.default_background_color.clone()),
            )
            .with_status(options.status.unwrap_or(TemplateStatus::Valid));
        template.description = options.description;
        template.variables = options.variables;

        let id = template.id.clone();
        debug!(template_id = %id, name = %template.name, "template created");
        self.templates.insert(id.clone(), template);
        self.events.emit(&EngineEvent::TemplateCreated {
            template_id: id.clone(),
        });
        id
    }

    /// Gets a template by ID
    pub fn get_template(&self, id: &str) -> Option<&Template> {
        self.templates.get(id)
    }

    /// Gets all templates in creation order
    pub fn get_all_templates(&self) -> Vec<Template> {
        self.templates.values().cloned().collect()
    }

    /// Gets templates with a given status
    pub fn get_templates_by_status(&self, status: TemplateStatus) -> Vec<Template> {
        self.templates
            .values()
            .filter(|t| t.status == status)
            .cloned()
            .collect()
    }

    /// Number of templates
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Returns true if the engine holds no templates
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Merges a patch into a template. Returns false for an unknown id.
    pub fn update_template(&mut self, id: &str, patch: TemplatePatch) -> bool {
        let Some(template) = self.templates.get_mut(id) else {
            return false;
        };
        patch.apply(template);
        debug!(template_id = %id, "template updated");
        self.events.emit(&EngineEvent::TemplateUpdated {
            template_id: id.to_string(),
        });
        true
    }

    /// Deletes a template and its cache entry. Returns false for an unknown id.
    pub fn delete_template(&mut self, id: &str) -> bool {
        if self.templates.shift_remove(id).is_none() {
            return false;
        }
        self.cache.remove(id);
        debug!(template_id = %id, "template deleted");
        self.events.emit(&EngineEvent::TemplateDeleted {
            template_id: id.to_string(),
        });
        true
    }

    /// Deep-copies a template under a new id.
    ///
    /// The copy is named `<name> (Copy)` unless `new_name` is given.
    pub fn duplicate_template(
        &mut self,
        id: &str,
        new_name: Option<String>,
    ) -> Option<TemplateId> {
        let source = self.templates.get(id)?;

        let mut copy = source.clone();
        copy.id = new_id();
        copy.name = new_name.unwrap_or_else(|| format!("{} (Copy)", source.name));
        copy.created_at = now();
        copy.updated_at = copy.created_at;

        let copy_id = copy.id.clone();
        self.templates.insert(copy_id.clone(), copy);
        debug!(source_id = %id, template_id = %copy_id, "template duplicated");
        self.events.emit(&EngineEvent::TemplateDuplicated {
            source_id: id.to_string(),
            template_id: copy_id.clone(),
        });
        Some(copy_id)
    }

    // -------------------------------------------------------------------------
    // Placeholders
    // -------------------------------------------------------------------------

    /// Adds a placeholder and returns its id.
    ///
    /// Refusals (unknown template, placeholder limit reached) emit an
    /// [`EngineEvent::Error`] and return `None`.
    pub fn add_placeholder(
        &mut self,
        template_id: &str,
        placeholder: NewPlaceholder,
    ) -> Option<PlaceholderId> {
        let max = self.config.max_placeholders;
        let Some(template) = self.templates.get_mut(template_id) else {
            self.refuse(format!("Template not found: {template_id}"));
            return None;
        };

        if template.placeholders.len() >= max {
            self.refuse(format!(
                "Maximum placeholders ({max}) reached for template {template_id}"
            ));
            return None;
        }

        let placeholder = placeholder.into_placeholder();
        let placeholder_id = placeholder.id.clone();
        template.placeholders.push(placeholder);
        template.touch();

        self.events.emit(&EngineEvent::PlaceholderAdded {
            template_id: template_id.to_string(),
            placeholder_id: placeholder_id.clone(),
        });
        Some(placeholder_id)
    }

    /// Merges a patch into a placeholder. Returns false if either id is unknown.
    pub fn update_placeholder(
        &mut self,
        template_id: &str,
        placeholder_id: &str,
        patch: PlaceholderPatch,
    ) -> bool {
        let Some(template) = self.templates.get_mut(template_id) else {
            return false;
        };
        let Some(placeholder) = template.placeholder_mut(placeholder_id) else {
            return false;
        };

        patch.apply(placeholder);
        template.touch();
        self.events.emit(&EngineEvent::PlaceholderUpdated {
            template_id: template_id.to_string(),
            placeholder_id: placeholder_id.to_string(),
        });
        true
    }

    /// Removes a placeholder. Returns false if either id is unknown.
    pub fn remove_placeholder(&mut self, template_id: &str, placeholder_id: &str) -> bool {
        let Some(template) = self.templates.get_mut(template_id) else {
            return false;
        };

        let before = template.placeholders.len();
        template.placeholders.retain(|p| p.id != placeholder_id);
        if template.placeholders.len() == before {
            return false;
        }

        template.touch();
        self.events.emit(&EngineEvent::PlaceholderRemoved {
            template_id: template_id.to_string(),
            placeholder_id: placeholder_id.to_string(),
        });
        true
    }

    /// Gets a template's placeholders; empty for an unknown template
    pub fn get_placeholders(&self, template_id: &str) -> Vec<Placeholder> {
        self.templates
            .get(template_id)
            .map(|t| t.placeholders.clone())
            .unwrap_or_default()
    }

    /// Gets a template's placeholders of one kind
    pub fn get_placeholders_by_type(
        &self,
        template_id: &str,
        kind: PlaceholderType,
    ) -> Vec<Placeholder> {
        self.templates
            .get(template_id)
            .map(|t| {
                t.placeholders
                    .iter()
                    .filter(|p| p.kind == kind)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    // -------------------------------------------------------------------------
    // Validation & Rendering
    // -------------------------------------------------------------------------

    /// Validates a template's placeholders, optionally against render data.
    ///
    /// The template status is left untouched.
    pub fn validate_template(&self, id: &str, data: Option<&TemplateData>) -> ValidationResult {
        match self.templates.get(id) {
            Some(template) => validation::validate(template, data),
            None => ValidationResult::invalid(vec![format!("Template not found: {id}")]),
        }
    }

    /// Renders one template.
    ///
    /// Templates failing validation are refused without touching the render
    /// statistics.
    pub async fn render_template(
        &mut self,
        template_id: &str,
        data: &TemplateData,
        config: RenderConfig,
    ) -> RenderResult {
        let report = self.validate_template(template_id, Some(data));
        if !report.valid {
            let error = report.error_summary();
            warn!(template_id = %template_id, %error, "render refused by validation");
            return self.render_failed(template_id, error);
        }

        let Some(template) = self.templates.get(template_id).cloned() else {
            return self.render_failed(template_id, format!("Template not found: {template_id}"));
        };

        let output_path = config.output_dir.join(format!(
            "{}_{}.{}",
            template.id,
            now().timestamp_millis(),
            config.format.extension()
        ));
        let job = RenderJob {
            values: validation::resolve_values(&template, data),
            template,
            config,
            output_path,
        };
        let frames = job.frame_count();

        self.events.emit(&EngineEvent::RenderStarted {
            template_id: template_id.to_string(),
        });
        let started = Instant::now();
        let outcome = self.backend.render(&job).await;
        let duration_ms = started.elapsed().as_secs_f64() * 1000.0;

        self.render_stats.record(duration_ms, outcome.is_ok());

        match outcome {
            Ok(output_path) => {
                info!(
                    template_id = %template_id,
                    backend = self.backend.name(),
                    output = %output_path.display(),
                    duration_ms,
                    "render completed"
                );
                self.events.emit(&EngineEvent::RenderCompleted {
                    template_id: template_id.to_string(),
                    output_path: output_path.clone(),
                    duration_ms,
                });
                RenderResult::succeeded(output_path, duration_ms, frames)
            }
            Err(e) => {
                warn!(template_id = %template_id, error = %e, "render backend failed");
                self.render_failed(template_id, e.to_string())
            }
        }
    }

    /// Renders requests one after another and returns results in input order
    pub async fn render_batch(&mut self, requests: Vec<RenderRequest>) -> Vec<RenderResult> {
        let mut results = Vec::with_capacity(requests.len());
        for request in requests {
            let result = self
                .render_template(&request.template_id, &request.data, request.config)
                .await;
            results.push(result);
        }
        results
    }

    fn render_failed(&self, template_id: &str, error: String) -> RenderResult {
        self.events.emit(&EngineEvent::RenderFailed {
            template_id: template_id.to_string(),
            error: error.clone(),
        });
        RenderResult::failed(error)
    }

    // -------------------------------------------------------------------------
    // Import / Export
    // -------------------------------------------------------------------------

    /// Serializes one template as pretty JSON
    pub fn export_template(&self, id: &str) -> Option<String> {
        let template = self.templates.get(id)?;
        match serde_json::to_string_pretty(template) {
            Ok(json) => Some(json),
            Err(e) => {
                warn!(template_id = %id, error = %e, "template export failed");
                None
            }
        }
    }

    /// Serializes every template as a JSON array
    pub fn export_all_templates(&self) -> CoreResult<String> {
        let templates: Vec<&Template> = self.templates.values().collect();
        Ok(serde_json::to_string_pretty(&templates)?)
    }

    /// Imports one template from JSON under a fresh id.
    ///
    /// Accepts any record with a `name`, including exported catalog
    /// templates. Failures emit [`EngineEvent::ImportFailed`] and return `None`.
    pub fn import_template(&mut self, json: &str) -> Option<TemplateId> {
        let value: serde_json::Value = match serde_json::from_str(json) {
            Ok(value) => value,
            Err(e) => return self.import_failed(format!("Malformed template JSON: {e}")),
        };

        if !value.get("name").is_some_and(|name| name.is_string()) {
            return self.import_failed("Template record has no name".to_string());
        }

        let mut template: Template = match serde_json::from_value(value) {
            Ok(template) => template,
            Err(e) => return self.import_failed(format!("Invalid template record: {e}")),
        };

        template.id = new_id();
        template.touch();

        let id = template.id.clone();
        info!(template_id = %id, name = %template.name, "template imported");
        self.templates.insert(id.clone(), template);
        self.events.emit(&EngineEvent::TemplateImported {
            template_id: id.clone(),
        });
        Some(id)
    }

    fn import_failed(&self, message: String) -> Option<TemplateId> {
        warn!(%message, "template import failed");
        self.events.emit(&EngineEvent::ImportFailed { message });
        None
    }

    fn refuse(&self, message: String) {
        warn!(%message, "engine refused operation");
        self.events.emit(&EngineEvent::Error { message });
    }

    // -------------------------------------------------------------------------
    // Cache
    // -------------------------------------------------------------------------

    /// Stores a cache value; ignored unless `cache_templates` is enabled
    pub fn cache_set(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.cache.set(key, value);
    }

    /// Reads a cache value, counting a hit or a miss
    pub fn cache_get(&mut self, key: &str) -> Option<serde_json::Value> {
        self.cache.get(key)
    }

    /// Clears the cache; ignored unless `cache_templates` is enabled
    pub fn cache_clear(&mut self) {
        self.cache.clear();
    }

    /// Number of cached entries
    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }

    // -------------------------------------------------------------------------
    // Administration
    // -------------------------------------------------------------------------

    /// Gets a statistics snapshot
    pub fn statistics(&self) -> EngineStatistics {
        let mut templates_by_status = BTreeMap::new();
        for template in self.templates.values() {
            *templates_by_status
                .entry(template.status.to_string())
                .or_insert(0) += 1;
        }

        EngineStatistics {
            total_templates: self.templates.len(),
            total_placeholders: self.templates.values().map(|t| t.placeholders.len()).sum(),
            templates_by_status,
            render: self.render_stats.clone(),
            cache: self.cache.stats(),
        }
    }

    /// Gets the engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Merges a config patch
    pub fn update_config(&mut self, patch: EngineConfigPatch) {
        if let Some(max) = patch.max_placeholders {
            self.config.max_placeholders = max;
        }
        if let Some(enabled) = patch.cache_templates {
            self.config.cache_templates = enabled;
        }
        if let Some(fps) = patch.default_fps {
            self.config.default_fps = fps;
        }
        if let Some(duration) = patch.default_duration {
            self.config.default_duration = duration;
        }
        if let Some(color) = patch.default_background_color {
            self.config.default_background_color = color;
        }
        self.config.normalize();
        self.cache.set_enabled(self.config.cache_templates);

        debug!(config = ?self.config, "engine config updated");
        self.events.emit(&EngineEvent::ConfigUpdated);
    }

    /// Drops all templates, cache entries and statistics. Config is kept.
    pub fn reset(&mut self) {
        self.templates.clear();
        self.cache.reset();
        self.render_stats = RenderStatistics::default();
        info!("template engine reset");
        self.events.emit(&EngineEvent::Reset);
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TemplateEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateEngine")
            .field("templates", &self.templates.len())
            .field("config", &self.config)
            .field("render_stats", &self.render_stats)
            .field("backend", &self.backend.name())
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
    use crate::core::CoreError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex as StdMutex;

    fn recorder(engine: &mut TemplateEngine) -> Arc<StdMutex<Vec<EngineEvent>>> {
        let events = Arc::new(StdMutex::new(Vec::new()));
        let sink = events.clone();
        engine.subscribe(move |e| sink.lock().unwrap().push(e.clone()));
        events
    }

    fn text(name: &str) -> NewPlaceholder {
        NewPlaceholder::new(name, PlaceholderType::Text)
            .with_geometry(100.0, 100.0, 400.0, 100.0)
            .with_timing(0.0, 5.0)
    }

    struct FailingBackend;

    #[async_trait]
    impl RenderBackend for FailingBackend {
        fn name(&self) -> &str {
            "failing"
        }

        async fn render(&self, _job: &RenderJob) -> CoreResult<PathBuf> {
            Err(CoreError::RenderFailed("encoder crashed".to_string()))
        }
    }

    // ========================================================================
    // Template CRUD Tests
    // ========================================================================

    #[test]
    fn test_create_template_defaults() {
        let mut engine = TemplateEngine::new();
        let id = engine.create_template("Intro", 1920, 1080, CreateTemplateOptions::default());

        let template = engine.get_template(&id).unwrap();
        assert_eq!(template.fps, 30);
        assert_eq!(template.duration, 10.0);
        assert!(template.placeholders.is_empty());
        assert_eq!(template.status, TemplateStatus::Valid);
    }

    #[test]
    fn test_create_template_options() {
        let mut engine = TemplateEngine::new();
        let id = engine.create_template(
            "Promo",
            1080,
            1920,
            CreateTemplateOptions {
                fps: Some(60),
                duration: Some(15.0),
                background_color: Some("#112233".to_string()),
                description: Some("Vertical".to_string()),
                status: Some(TemplateStatus::Draft),
                ..Default::default()
            },
        );

        let template = engine.get_template(&id).unwrap();
        assert_eq!(template.fps, 60);
        assert_eq!(template.duration, 15.0);
        assert_eq!(template.background_color, "#112233");
        assert_eq!(template.description.as_deref(), Some("Vertical"));
        assert_eq!(
            engine.get_templates_by_status(TemplateStatus::Draft).len(),
            1
        );
    }

    #[test]
    fn test_update_and_delete_template() {
        let mut engine = TemplateEngine::new();
        let events = recorder(&mut engine);
        let id = engine.create_template("Intro", 1920, 1080, CreateTemplateOptions::default());

        assert!(engine.update_template(
            &id,
            TemplatePatch {
                name: Some("Outro".to_string()),
                ..Default::default()
            }
        ));
        assert_eq!(engine.get_template(&id).unwrap().name, "Outro");
        assert!(!engine.update_template("missing", TemplatePatch::default()));

        assert!(engine.delete_template(&id));
        assert!(!engine.delete_template(&id));
        assert!(engine.is_empty());

        let names: Vec<_> = events.lock().unwrap().iter().map(|e| e.name()).collect();
        assert_eq!(
            names,
            vec![
                event_names::TEMPLATE_ADDED,
                event_names::TEMPLATE_UPDATED,
                event_names::TEMPLATE_REMOVED
            ]
        );
    }

    #[test]
    fn test_duplicate_is_deep_copy() {
        let mut engine = TemplateEngine::new();
        let id = engine.create_template("Intro", 1920, 1080, CreateTemplateOptions::default());
        let placeholder_id = engine.add_placeholder(&id, text("Title")).unwrap();

        let copy_id = engine.duplicate_template(&id, None).unwrap();
        assert_ne!(copy_id, id);
        assert_eq!(engine.get_template(&copy_id).unwrap().name, "Intro (Copy)");

        engine.update_placeholder(
            &copy_id,
            &placeholder_id,
            PlaceholderPatch {
                name: Some("Changed".to_string()),
                ..Default::default()
            },
        );
        engine.add_placeholder(&copy_id, text("Extra"));

        let original = engine.get_template(&id).unwrap();
        assert_eq!(original.placeholders.len(), 1);
        assert_eq!(original.placeholders[0].name, "Title");
        assert_eq!(engine.get_placeholders(&copy_id).len(), 2);
        assert!(engine.duplicate_template("missing", None).is_none());
    }

    #[test]
    fn test_duplicate_with_name() {
        let mut engine = TemplateEngine::new();
        let id = engine.create_template("Intro", 1920, 1080, CreateTemplateOptions::default());
        let copy_id = engine
            .duplicate_template(&id, Some("Intro v2".to_string()))
            .unwrap();
        assert_eq!(engine.get_template(&copy_id).unwrap().name, "Intro v2");
        assert_eq!(engine.get_all_templates().len(), 2);
    }

    // ========================================================================
    // Placeholder Tests
    // ========================================================================

    #[test]
    fn test_placeholder_crud() {
        let mut engine = TemplateEngine::new();
        let id = engine.create_template("Intro", 1920, 1080, CreateTemplateOptions::default());

        let title = engine.add_placeholder(&id, text("Title")).unwrap();
        engine.add_placeholder(
            &id,
            NewPlaceholder::new("Music", PlaceholderType::Audio).with_timing(0.0, 10.0),
        );

        assert_eq!(engine.get_placeholders(&id).len(), 2);
        assert_eq!(
            engine
                .get_placeholders_by_type(&id, PlaceholderType::Audio)
                .len(),
            1
        );

        assert!(engine.update_placeholder(
            &id,
            &title,
            PlaceholderPatch {
                x: Some(0.0),
                ..Default::default()
            }
        ));
        assert_eq!(engine.get_template(&id).unwrap().placeholder(&title).unwrap().x, 0.0);
        assert!(!engine.update_placeholder(&id, "missing", PlaceholderPatch::default()));

        assert!(engine.remove_placeholder(&id, &title));
        assert!(!engine.remove_placeholder(&id, &title));
        assert_eq!(engine.get_placeholders(&id).len(), 1);
        assert!(engine.get_placeholders("missing").is_empty());
    }

    #[test]
    fn test_placeholder_limit_emits_error_and_returns_none() {
        let mut engine = TemplateEngine::with_config(EngineConfig {
            max_placeholders: 2,
            ..Default::default()
        });
        let events = recorder(&mut engine);
        let id = engine.create_template("Intro", 1920, 1080, CreateTemplateOptions::default());

        assert!(engine.add_placeholder(&id, text("One")).is_some());
        assert!(engine.add_placeholder(&id, text("Two")).is_some());
        assert!(engine.add_placeholder(&id, text("Three")).is_none());

        assert_eq!(engine.get_placeholders(&id).len(), 2);
        let events = events.lock().unwrap();
        assert!(matches!(
            events.last(),
            Some(EngineEvent::Error { message }) if message.contains("Maximum placeholders")
        ));
    }

    #[test]
    fn test_add_placeholder_unknown_template() {
        let mut engine = TemplateEngine::new();
        let events = recorder(&mut engine);

        assert!(engine.add_placeholder("missing", text("Title")).is_none());
        assert_eq!(events.lock().unwrap()[0].name(), event_names::ERROR);
    }

    // ========================================================================
    // Validation Tests
    // ========================================================================

    #[test]
    fn test_validate_unknown_template() {
        let engine = TemplateEngine::new();
        let result = engine.validate_template("missing", None);
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn test_validate_does_not_change_status() {
        let mut engine = TemplateEngine::new();
        let id = engine.create_template("Intro", 1920, 1080, CreateTemplateOptions::default());
        engine.add_placeholder(&id, text("Wide").with_geometry(0.0, 0.0, 4000.0, 10.0));

        let result = engine.validate_template(&id, None);
        assert!(!result.valid);
        assert!(result.errors[0].contains("bounds"));
        assert_eq!(
            engine.get_template(&id).unwrap().status,
            TemplateStatus::Valid
        );
    }

    // ========================================================================
    // Render Tests
    // ========================================================================

    #[tokio::test]
    async fn test_render_valid_template() {
        let mut engine = TemplateEngine::new();
        let events = recorder(&mut engine);
        let id = engine.create_template("Intro", 1920, 1080, CreateTemplateOptions::default());
        engine.add_placeholder(&id, text("Title").with_required(true));

        let data = TemplateData::from([("Title".to_string(), json!("Hello"))]);
        let result = engine
            .render_template(&id, &data, RenderConfig::default())
            .await;

        assert!(result.success);
        let path = result.output_path.unwrap();
        assert!(path.starts_with("renders"));
        assert_eq!(path.extension().unwrap(), "mp4");
        assert_eq!(result.frames, Some(300));
        assert!(result.duration_ms.unwrap() >= 0.0);
        assert_eq!(engine.statistics().render.total_renders, 1);

        let names: Vec<_> = events.lock().unwrap().iter().map(|e| e.name()).collect();
        assert!(names.ends_with(&[event_names::RENDER_STARTED, event_names::RENDER_COMPLETED]));
    }

    #[tokio::test]
    async fn test_render_invalid_template_leaves_stats() {
        let mut engine = TemplateEngine::new();
        let id = engine.create_template("Intro", 1920, 1080, CreateTemplateOptions::default());
        engine.add_placeholder(&id, text("Late").with_timing(8.0, 5.0));

        let result = engine
            .render_template(&id, &TemplateData::new(), RenderConfig::default())
            .await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("duration"));
        let stats = engine.statistics();
        assert_eq!(stats.render.total_renders, 0);
        assert_eq!(stats.render.average_render_time_ms, 0.0);
    }

    #[tokio::test]
    async fn test_render_missing_required_value_fails() {
        let mut engine = TemplateEngine::new();
        let id = engine.create_template("Intro", 1920, 1080, CreateTemplateOptions::default());
        engine.add_placeholder(&id, text("Title").with_required(true));

        let result = engine
            .render_template(&id, &TemplateData::new(), RenderConfig::default())
            .await;
        assert!(!result.success);
        assert_eq!(engine.statistics().render.total_renders, 0);
    }

    #[tokio::test]
    async fn test_render_backend_failure_counts_attempt() {
        let mut engine =
            TemplateEngine::with_backend(EngineConfig::default(), Box::new(FailingBackend));
        let id = engine.create_template("Intro", 1920, 1080, CreateTemplateOptions::default());

        let result = engine
            .render_template(&id, &TemplateData::new(), RenderConfig::default())
            .await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("encoder crashed"));
        let stats = engine.statistics().render;
        assert_eq!(stats.total_renders, 1);
        assert_eq!(stats.failed_renders, 1);
    }

    #[tokio::test]
    async fn test_render_batch_sequential_in_order() {
        let mut engine = TemplateEngine::new();
        let good = engine.create_template("Good", 1920, 1080, CreateTemplateOptions::default());
        let bad = engine.create_template("Bad", 1920, 1080, CreateTemplateOptions::default());
        engine.add_placeholder(&bad, text("Wide").with_geometry(0.0, 0.0, 5000.0, 10.0));

        let results = engine
            .render_batch(vec![
                RenderRequest::new(good.clone(), TemplateData::new()),
                RenderRequest::new(bad, TemplateData::new()),
                RenderRequest::new("missing", TemplateData::new()),
                RenderRequest::new(good, TemplateData::new()),
            ])
            .await;

        let outcomes: Vec<bool> = results.iter().map(|r| r.success).collect();
        assert_eq!(outcomes, vec![true, false, false, true]);
        assert_eq!(engine.statistics().render.total_renders, 2);
    }

    // ========================================================================
    // Import / Export Tests
    // ========================================================================

    #[test]
    fn test_export_import_mints_new_id() {
        let mut engine = TemplateEngine::new();
        let id = engine.create_template("Intro", 1280, 720, CreateTemplateOptions::default());
        engine.add_placeholder(&id, text("Title"));

        let json = engine.export_template(&id).unwrap();
        let imported = engine.import_template(&json).unwrap();

        assert_ne!(imported, id);
        let copy = engine.get_template(&imported).unwrap();
        assert_eq!(copy.name, "Intro");
        assert_eq!(copy.width, 1280);
        assert_eq!(copy.placeholders.len(), 1);
        assert!(engine.export_template("missing").is_none());
    }

    #[test]
    fn test_import_failures_return_none() {
        let mut engine = TemplateEngine::new();
        let events = recorder(&mut engine);

        assert!(engine.import_template("{not json").is_none());
        assert!(engine.import_template(r#"{"width": 100}"#).is_none());
        assert!(engine.import_template(r#"[1, 2]"#).is_none());
        assert!(engine.is_empty());

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 3);
        assert!(events
            .iter()
            .all(|e| e.name() == event_names::IMPORT_FAILED));
    }

    #[test]
    fn test_export_all_templates() {
        let mut engine = TemplateEngine::new();
        engine.create_template("A", 100, 100, CreateTemplateOptions::default());
        engine.create_template("B", 100, 100, CreateTemplateOptions::default());

        let json = engine.export_all_templates().unwrap();
        let parsed: Vec<Template> = serde_json::from_str(&json).unwrap();
        let names: Vec<_> = parsed.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    // ========================================================================
    // Cache & Administration Tests
    // ========================================================================

    #[test]
    fn test_cache_is_opt_in() {
        let mut engine = TemplateEngine::new();
        engine.cache_set("k", json!(1));
        assert_eq!(engine.cache_size(), 0);
        assert_eq!(engine.cache_get("k"), None);
        assert_eq!(engine.statistics().cache.misses, 1);

        engine.update_config(EngineConfigPatch {
            cache_templates: Some(true),
            ..Default::default()
        });
        engine.cache_set("k", json!(1));
        assert_eq!(engine.cache_get("k"), Some(json!(1)));
        assert_eq!(engine.cache_size(), 1);

        engine.cache_clear();
        assert_eq!(engine.cache_size(), 0);
        let stats = engine.statistics().cache;
        assert_eq!((stats.hits, stats.misses), (1, 1));
    }

    #[test]
    fn test_delete_template_drops_cache_entry() {
        let mut engine = TemplateEngine::with_config(EngineConfig {
            cache_templates: true,
            ..Default::default()
        });
        let id = engine.create_template("Intro", 1920, 1080, CreateTemplateOptions::default());
        engine.cache_set(id.clone(), json!({ "rendered": true }));

        engine.delete_template(&id);
        assert_eq!(engine.cache_size(), 0);
    }

    #[test]
    fn test_update_config_normalizes() {
        let mut engine = TemplateEngine::new();
        let events = recorder(&mut engine);

        engine.update_config(EngineConfigPatch {
            max_placeholders: Some(0),
            default_fps: Some(1000),
            default_duration: Some(-1.0),
            ..Default::default()
        });

        let config = engine.config();
        assert_eq!(config.max_placeholders, 1);
        assert_eq!(config.default_fps, 240);
        assert_eq!(config.default_duration, DEFAULT_DURATION);
        assert_eq!(events.lock().unwrap()[0], EngineEvent::ConfigUpdated);
    }

    #[tokio::test]
    async fn test_statistics_and_reset() {
        let mut engine = TemplateEngine::new();
        let a = engine.create_template("A", 1920, 1080, CreateTemplateOptions::default());
        engine.create_template(
            "B",
            1920,
            1080,
            CreateTemplateOptions {
                status: Some(TemplateStatus::Draft),
                ..Default::default()
            },
        );
        engine.add_placeholder(&a, text("Title"));
        engine
            .render_template(&a, &TemplateData::new(), RenderConfig::default())
            .await;

        let stats = engine.statistics();
        assert_eq!(stats.total_templates, 2);
        assert_eq!(stats.total_placeholders, 1);
        assert_eq!(stats.templates_by_status["valid"], 1);
        assert_eq!(stats.templates_by_status["draft"], 1);

        engine.reset();
        let stats = engine.statistics();
        assert_eq!(stats.total_templates, 0);
        assert_eq!(stats.render.total_renders, 0);
    }

    #[tokio::test]
    async fn test_shared_engine() {
        let shared = TemplateEngine::new().into_shared();
        let id = {
            let mut engine = shared.lock().await;
            engine.create_template("Shared", 640, 360, CreateTemplateOptions::default())
        };

        let handle = {
            let shared = shared.clone();
            tokio::spawn(async move {
                let mut engine = shared.lock().await;
                engine
                    .render_template(&id, &TemplateData::new(), RenderConfig::default())
                    .await
            })
        };

        assert!(handle.await.unwrap().success);
        assert_eq!(shared.lock().await.statistics().render.total_renders, 1);
    }
}
