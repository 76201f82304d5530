//! Status codes and error details carried by NACKs.
//!
//! [`StatusCode`] mirrors the gRPC canonical codes so the protocol crate
//! does not depend on a gRPC stack.

use serde::{Deserialize, Serialize};

/// Maximum length in bytes of a status message before it is truncated.
pub const MAX_STATUS_MESSAGE_LEN: usize = 4096;

const TRUNCATED_SUFFIX: &str = "...(truncated)";

/// Canonical gRPC status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum StatusCode {
    /// Not an error.
    Ok = 0,
    /// The operation was cancelled.
    Cancelled = 1,
    /// Unknown error.
    Unknown = 2,
    /// Client specified an invalid argument.
    InvalidArgument = 3,
    /// Deadline expired before the operation could complete.
    DeadlineExceeded = 4,
    /// Requested entity was not found.
    NotFound = 5,
    /// Entity already exists.
    AlreadyExists = 6,
    /// Caller lacks permission.
    PermissionDenied = 7,
    /// Some resource has been exhausted.
    ResourceExhausted = 8,
    /// System is not in a state required for the operation.
    FailedPrecondition = 9,
    /// The operation was aborted.
    Aborted = 10,
    /// Operation was attempted past the valid range.
    OutOfRange = 11,
    /// Operation is not implemented.
    Unimplemented = 12,
    /// Internal invariant broken.
    Internal = 13,
    /// The service is currently unavailable.
    Unavailable = 14,
    /// Unrecoverable data loss or corruption.
    DataLoss = 15,
    /// Request lacks valid authentication credentials.
    Unauthenticated = 16,
}

impl StatusCode {
    /// Returns the numeric wire value.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Maps a numeric wire value back to a code. Unrecognized values become `Unknown`.
    pub fn from_i32(code: i32) -> Self {
        match code {
            0 => StatusCode::Ok,
            1 => StatusCode::Cancelled,
            3 => StatusCode::InvalidArgument,
            4 => StatusCode::DeadlineExceeded,
            5 => StatusCode::NotFound,
            6 => StatusCode::AlreadyExists,
            7 => StatusCode::PermissionDenied,
            8 => StatusCode::ResourceExhausted,
            9 => StatusCode::FailedPrecondition,
            10 => StatusCode::Aborted,
            11 => StatusCode::OutOfRange,
            12 => StatusCode::Unimplemented,
            13 => StatusCode::Internal,
            14 => StatusCode::Unavailable,
            15 => StatusCode::DataLoss,
            16 => StatusCode::Unauthenticated,
            _ => StatusCode::Unknown,
        }
    }
}

/// Error detail attached to a request that rejects a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Status code.
    pub code: StatusCode,
    /// Human-readable message, already truncated.
    pub message: String,
}

impl ErrorDetail {
    /// Creates a new error detail, truncating the message if needed.
    pub fn new(code: StatusCode, message: impl AsRef<str>) -> Self {
        Self {
            code,
            message: truncate_status_message(message.as_ref()),
        }
    }
}

/// Truncates a status message to at most [`MAX_STATUS_MESSAGE_LEN`] bytes of content.
///
/// The cut lands on a char boundary and is followed by a `...(truncated)` marker.
pub fn truncate_status_message(message: &str) -> String {
    if message.len() <= MAX_STATUS_MESSAGE_LEN {
        return message.to_string();
    }
    let mut end = MAX_STATUS_MESSAGE_LEN;
    while !message.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}{}", &message[..end], TRUNCATED_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_message_untouched() {
        assert_eq!(truncate_status_message("bad resource"), "bad resource");
    }

    #[test]
    fn long_message_truncated() {
        let message = "x".repeat(MAX_STATUS_MESSAGE_LEN + 10);
        let truncated = truncate_status_message(&message);
        assert!(truncated.ends_with("...(truncated)"));
        assert_eq!(
            truncated.len(),
            MAX_STATUS_MESSAGE_LEN + "...(truncated)".len()
        );
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        // 'é' is two bytes, so the limit falls in the middle of a char
        let message = format!("a{}", "é".repeat(MAX_STATUS_MESSAGE_LEN));
        let truncated = truncate_status_message(&message);
        let content = truncated.trim_end_matches("...(truncated)");
        assert!(content.len() <= MAX_STATUS_MESSAGE_LEN);
        assert!(content.starts_with('a'));
    }

    #[test]
    fn status_code_wire_values() {
        assert_eq!(StatusCode::Internal.as_i32(), 13);
        assert_eq!(StatusCode::from_i32(13), StatusCode::Internal);
        assert_eq!(StatusCode::from_i32(0), StatusCode::Ok);
        assert_eq!(StatusCode::from_i32(99), StatusCode::Unknown);
    }
}
