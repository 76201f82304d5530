//! Shared signal for server-visible context changes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Set when context the server sees (node metadata, locality) changed and
/// must be re-announced. Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct DynamicContextFlag {
    changed: Arc<AtomicBool>,
}

impl DynamicContextFlag {
    /// Creates an unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the context as changed.
    pub fn set_changed(&self) {
        self.changed.store(true, Ordering::SeqCst);
    }

    /// Returns true if a change has not been announced yet.
    pub fn is_changed(&self) -> bool {
        self.changed.load(Ordering::SeqCst)
    }

    /// Clears the flag once a request carrying the change has been produced.
    pub fn clear(&self) {
        self.changed.store(false, Ordering::SeqCst);
    }
}
