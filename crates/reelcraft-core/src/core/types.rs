//! Reelcraft Core Type Definitions
//!
//! Defines fundamental types used throughout the project.

use chrono::{DateTime, Utc};

// =============================================================================
// ID Types
// =============================================================================

/// Template unique identifier (ULID)
pub type TemplateId = String;

/// Placeholder unique identifier (ULID, unique within its template)
pub type PlaceholderId = String;

/// Event listener handle
pub type ListenerId = u64;

// =============================================================================
// Time Types
// =============================================================================

/// Time in seconds (floating point)
pub type TimeSec = f64;

/// UTC timestamp
pub type Timestamp = DateTime<Utc>;

/// Generates a new ULID string
pub fn new_id() -> String {
    ulid::Ulid::new().to_string()
}

/// Returns the current UTC time
pub fn now() -> Timestamp {
    Utc::now()
}
