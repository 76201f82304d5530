//! Error types for the subscription engine.

use thiserror::Error;

/// Result type for subscription operations.
pub type SubscriptionResult<T> = Result<T, SubscriptionError>;

/// Reasons a delta response is rejected.
///
/// Every variant is a protocol violation that fails the whole response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The same name appears twice among added/updated resources.
    #[error("duplicate name {name} found among added/updated resources")]
    DuplicateResourceName {
        /// Offending resource name.
        name: String,
    },

    /// A removed name was already listed as added or removed in the same response.
    #[error("duplicate name {name} found in the union of added+removed resources")]
    DuplicateAddedRemoved {
        /// Offending resource name.
        name: String,
    },

    /// A resource payload's type does not match the response type.
    #[error(
        "type URL {embedded} embedded in an individual resource does not match the message-wide type URL {expected}"
    )]
    TypeUrlMismatch {
        /// Type identifier found in the payload.
        embedded: String,
        /// Type identifier of the response.
        expected: String,
    },
}

impl SubscriptionError {
    /// Returns the resource name the violation is about.
    pub fn resource_name(&self) -> Option<&str> {
        match self {
            SubscriptionError::DuplicateResourceName { name }
            | SubscriptionError::DuplicateAddedRemoved { name } => Some(name),
            SubscriptionError::TypeUrlMismatch { .. } => None,
        }
    }
}
