//! Boundary through which validated updates are delivered upward.

use crate::error::SubscriptionError;
use deltasub_protocol::Resource;

/// Why an update could not be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureReason {
    /// The stream could not be established, or broke before a response arrived.
    ConnectionFailure,
    /// No response arrived within the initial fetch timeout.
    FetchTimedOut,
    /// A response was received but failed validation.
    UpdateRejected,
}

/// Receives the results of response handling.
pub trait ConfigUpdateCallbacks {
    /// Called with the non-heartbeat resources and removed names of an accepted update.
    fn on_config_update(&mut self, added: &[Resource], removed: &[String], version: &str);

    /// Called when an update fails. `error` is `None` for connection failures.
    fn on_config_update_failed(
        &mut self,
        reason: FailureReason,
        error: Option<&SubscriptionError>,
    );
}

impl<C: ConfigUpdateCallbacks + ?Sized> ConfigUpdateCallbacks for &mut C {
    fn on_config_update(&mut self, added: &[Resource], removed: &[String], version: &str) {
        (**self).on_config_update(added, removed, version);
    }

    fn on_config_update_failed(
        &mut self,
        reason: FailureReason,
        error: Option<&SubscriptionError>,
    ) {
        (**self).on_config_update_failed(reason, error);
    }
}

/// A recorded callback invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackEvent {
    /// An accepted update.
    Update {
        /// Delivered resources.
        added: Vec<Resource>,
        /// Delivered removals.
        removed: Vec<String>,
        /// Response-wide version.
        version: String,
    },
    /// A failed update.
    Failed {
        /// Failure reason.
        reason: FailureReason,
        /// Validation error, if any.
        error: Option<SubscriptionError>,
    },
}

/// Callbacks that record every invocation.
#[derive(Debug, Default)]
pub struct MemoryCallbacks {
    events: Vec<CallbackEvent>,
}

impl MemoryCallbacks {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded events, oldest first.
    pub fn events(&self) -> &[CallbackEvent] {
        &self.events
    }

    /// The most recent event.
    pub fn last(&self) -> Option<&CallbackEvent> {
        self.events.last()
    }

    /// Removes and returns all recorded events.
    pub fn take_events(&mut self) -> Vec<CallbackEvent> {
        std::mem::take(&mut self.events)
    }
}

impl ConfigUpdateCallbacks for MemoryCallbacks {
    fn on_config_update(&mut self, added: &[Resource], removed: &[String], version: &str) {
        self.events.push(CallbackEvent::Update {
            added: added.to_vec(),
            removed: removed.to_vec(),
            version: version.to_string(),
        });
    }

    fn on_config_update_failed(
        &mut self,
        reason: FailureReason,
        error: Option<&SubscriptionError>,
    ) {
        self.events.push(CallbackEvent::Failed {
            reason,
            error: error.cloned(),
        });
    }
}
