//! Acknowledgement state carried from a response into the next request.

use crate::status::ErrorDetail;

/// The outcome of handling a response, to be folded into the next request.
///
/// The nonce is always echoed. A present `error_detail` turns the request
/// into a rejection (NACK); an absent one is a plain acknowledgement (ACK).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateAck {
    /// Nonce of the response being acknowledged.
    pub nonce: String,
    /// Type identifier of the acknowledged response.
    pub type_url: String,
    /// Rejection detail. `None` means ACK.
    pub error_detail: Option<ErrorDetail>,
}

impl UpdateAck {
    /// Creates a plain acknowledgement.
    pub fn new(nonce: impl Into<String>, type_url: impl Into<String>) -> Self {
        Self {
            nonce: nonce.into(),
            type_url: type_url.into(),
            error_detail: None,
        }
    }

    /// Creates a rejection.
    pub fn nack(
        nonce: impl Into<String>,
        type_url: impl Into<String>,
        error_detail: ErrorDetail,
    ) -> Self {
        Self {
            nonce: nonce.into(),
            type_url: type_url.into(),
            error_detail: Some(error_detail),
        }
    }

    /// Returns true if this is a rejection.
    pub fn is_nack(&self) -> bool {
        self.error_detail.is_some()
    }
}
