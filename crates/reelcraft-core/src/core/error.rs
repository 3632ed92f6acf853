//! Reelcraft Error Definitions
//!
//! Defines error types used throughout the project.

use thiserror::Error;

use super::TemplateId;

/// Core error types
#[derive(Error, Debug)]
pub enum CoreError {
    // =========================================================================
    // Catalog Errors
    // =========================================================================
    #[error("Invalid rating: {0} (must be between 1 and 5)")]
    InvalidRating(f64),

    #[error("Capacity exceeded: {0}")]
    CapacityExceeded(String),

    #[error("Template already exists: {0}")]
    AlreadyExists(TemplateId),

    #[error("Import failed: {0}")]
    ImportFailed(String),

    // =========================================================================
    // Render Errors
    // =========================================================================
    #[error("Render failed: {0}")]
    RenderFailed(String),

    // =========================================================================
    // General Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Core result type
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Returns true for errors caused by bad caller input rather than I/O.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            CoreError::InvalidRating(_)
                | CoreError::CapacityExceeded(_)
                | CoreError::AlreadyExists(_)
                | CoreError::ValidationError(_)
                | CoreError::NotFound(_)
        )
    }
}
