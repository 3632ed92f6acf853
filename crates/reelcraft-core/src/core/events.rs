//! Observer Notifications
//!
//! Synchronous, fire-and-forget listener registry used by the catalog and the
//! engine. Listeners run in registration order on the caller's thread; there
//! is no acknowledgment and no buffering.

use std::fmt;

use super::ListenerId;

// =============================================================================
// Event Names
// =============================================================================

/// Event names carried by catalog and engine notifications
pub mod event_names {
    /// Template added to the catalog or created in the engine
    pub const TEMPLATE_ADDED: &str = "template:added";
    /// Template fields changed
    pub const TEMPLATE_UPDATED: &str = "template:updated";
    /// Template removed
    pub const TEMPLATE_REMOVED: &str = "template:removed";
    /// Template duplicated (engine)
    pub const TEMPLATE_DUPLICATED: &str = "template:duplicated";
    /// Template imported (engine)
    pub const TEMPLATE_IMPORTED: &str = "template:imported";
    /// Template marked as favorite
    pub const FAVORITE_ADDED: &str = "favorite:added";
    /// Template unmarked as favorite
    pub const FAVORITE_REMOVED: &str = "favorite:removed";
    /// Template usage recorded
    pub const TEMPLATE_USED: &str = "template:used";
    /// Template rating submitted
    pub const TEMPLATE_RATED: &str = "template:rated";
    /// Usage history cleared
    pub const HISTORY_CLEARED: &str = "history:cleared";
    /// Whole library replaced by an import
    pub const LIBRARY_IMPORTED: &str = "library:imported";
    /// Placeholder added
    pub const PLACEHOLDER_ADDED: &str = "placeholder:added";
    /// Placeholder changed
    pub const PLACEHOLDER_UPDATED: &str = "placeholder:updated";
    /// Placeholder removed
    pub const PLACEHOLDER_REMOVED: &str = "placeholder:removed";
    /// Render started after validation passed
    pub const RENDER_STARTED: &str = "render:started";
    /// Render finished successfully
    pub const RENDER_COMPLETED: &str = "render:completed";
    /// Render refused or failed
    pub const RENDER_FAILED: &str = "render:failed";
    /// Configuration changed
    pub const CONFIG_UPDATED: &str = "config:updated";
    /// State reset
    pub const RESET: &str = "reset";
    /// Single template import failed
    pub const IMPORT_FAILED: &str = "import:failed";
    /// Refused operation
    pub const ERROR: &str = "error";
}

/// An event with a stable wire name
pub trait NamedEvent {
    /// Returns the event name (one of [`event_names`])
    fn name(&self) -> &'static str;
}

type Listener<E> = Box<dyn Fn(&E) + Send + Sync>;

/// Registration-ordered listener list
pub struct EventEmitter<E> {
    listeners: Vec<(ListenerId, Listener<E>)>,
    next_id: ListenerId,
}

impl<E: NamedEvent> EventEmitter<E> {
    /// Creates an emitter with no listeners
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
            next_id: 1,
        }
    }

    /// Registers a listener and returns its handle
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener. Returns false if the handle is unknown.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// Notifies every listener in registration order
    pub fn emit(&self, event: &E) {
        tracing::trace!(
            event = event.name(),
            listeners = self.listeners.len(),
            "emit"
        );
        for (_, listener) in &self.listeners {
            listener(event);
        }
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl<E: NamedEvent> Default for EventEmitter<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for EventEmitter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
