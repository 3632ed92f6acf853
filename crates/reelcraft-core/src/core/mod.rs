//! Reelcraft Core
//!
//! Template catalog, template engine and the shared plumbing they use
//! (errors, ids, observer notifications, atomic file writes).

pub mod events;
pub mod fs;
pub mod template;

// Re-export common types
mod types;
pub use types::*;

mod error;
pub use error::*;
