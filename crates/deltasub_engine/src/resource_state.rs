//! Per-resource version ledger entries.

/// What this client knows about one subscribed resource.
///
/// Either waiting for the server (subscribed, no version yet) or known at a
/// version. Entries are replaced wholesale, never edited in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceState {
    version: Option<String>,
}

impl ResourceState {
    /// Subscribed, but no version has been received.
    pub fn waiting_for_server() -> Self {
        Self { version: None }
    }

    /// Held at the given version.
    pub fn known(version: impl Into<String>) -> Self {
        Self {
            version: Some(version.into()),
        }
    }

    /// Returns true if no version has been received.
    pub fn is_waiting_for_server(&self) -> bool {
        self.version.is_none()
    }

    /// Returns the held version, if any.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }
}
