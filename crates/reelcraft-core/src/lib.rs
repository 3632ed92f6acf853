//! Reelcraft Core Library
//!
//! Video template catalog and template engine.
//!
//! - [`TemplateCatalog`]: searchable, ranked repository of published templates
//!   with favorites, usage history, ratings and analytics.
//! - [`TemplateEngine`]: authoring-time template and placeholder CRUD,
//!   structural validation and a validation-gated render pipeline.
//!
//! The two components share the [`Template`] shape but never call each other;
//! an exported catalog template is accepted as-is by
//! [`TemplateEngine::import_template`].

pub mod core;

pub use crate::core::events::{EventEmitter, NamedEvent};
pub use crate::core::template::{
    CatalogEvent, CatalogTemplate, EngineConfig, EngineEvent, LibraryConfig, Placeholder,
    PlaceholderType, RenderConfig, RenderResult, SearchFilters, SearchResults, Template,
    TemplateCatalog, TemplateCategory, TemplateEngine, TemplateSize, TemplateStatus,
    ValidationResult,
};
pub use crate::core::{CoreError, CoreResult, TemplateId};
