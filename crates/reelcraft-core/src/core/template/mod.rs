//! Template System
//!
//! Video templates for rapid content creation.
//!
//! # Modules
//!
//! - `models`: Template and placeholder data structures
//! - `validation`: Geometry, timing and required-value checks
//! - `engine`: Authoring, validation-gated rendering and caching
//! - `render`: Render jobs, results and the pluggable backend
//! - `catalog`: Published template repository with search and ranking
//! - `catalog_models`: Catalog metadata, search and library payloads
//! - `analytics`: Catalog statistics and usage breakdowns
//! - `builtin`: Seeded system templates

pub mod analytics;
pub mod builtin;
pub mod cache;
pub mod catalog;
pub mod catalog_models;
pub mod engine;
pub mod models;
pub mod render;
pub mod validation;

// Re-export main types
pub use analytics::{CatalogStatistics, TemplateSummary, UsageBreakdown};
pub use cache::{CacheStats, TemplateCache};
pub use catalog::{SharedTemplateCatalog, TemplateCatalog};
pub use catalog_models::{
    CatalogEvent, CatalogTemplate, CatalogTemplatePatch, CustomTemplateRequest, HistoryAction,
    HistoryEntry, LibraryConfig, LibraryConfigPatch, LibraryExport, NewCatalogTemplate,
    SearchFilters, SearchQuery, SearchResults, TemplateCategory, TemplateSize,
};
pub use engine::{
    EngineConfig, EngineConfigPatch, EngineEvent, EngineStatistics, SharedTemplateEngine,
    TemplateEngine,
};
pub use models::{
    CreateTemplateOptions, NewPlaceholder, Placeholder, PlaceholderPatch, PlaceholderType,
    Template, TemplatePatch, TemplateStatus,
};
pub use render::{
    MockRenderBackend, RenderBackend, RenderConfig, RenderFormat, RenderJob, RenderQuality,
    RenderRequest, RenderResult, RenderStatistics,
};
pub use validation::{TemplateData, ValidationResult};
