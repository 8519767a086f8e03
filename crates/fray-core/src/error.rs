//! Error types for the message boundary.

use thiserror::Error;

/// Errors from decoding an inbound client message.
///
/// Malformed input is logged and dropped by the caller; it never
/// reaches simulation logic.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MessageError {
    /// The payload is not valid for any recognized message type.
    #[error("malformed client message: {reason}")]
    Malformed {
        /// Decoder diagnostic.
        reason: String,
    },
}

impl From<serde_json::Error> for MessageError {
    fn from(e: serde_json::Error) -> Self {
        Self::Malformed {
            reason: e.to_string(),
        }
    }
}
