//! Error types for the protocol codecs.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors that can occur while encoding or decoding wire messages.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// The message is not valid JSON.
    #[error("malformed message: {0}")]
    Malformed(#[source] serde_json::Error),

    /// The message is valid JSON but not an object or an array of objects.
    #[error("unexpected message shape: {0}")]
    UnexpectedShape(String),

    /// A recognized tag carried a payload that could not be used.
    #[error("invalid payload for `{tag}`: {reason}")]
    InvalidPayload {
        /// The wire tag.
        tag: String,
        /// Why the payload was rejected.
        reason: String,
    },

    /// Serialization failed.
    #[error("encode error: {0}")]
    Encode(#[source] serde_json::Error),
}

impl ProtocolError {
    pub(crate) fn invalid_payload(tag: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPayload {
            tag: tag.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns true if the whole message was unusable.
    ///
    /// Per-entry payload errors leave the rest of a batch decodable.
    pub fn drops_message(&self) -> bool {
        matches!(
            self,
            ProtocolError::Malformed(_) | ProtocolError::UnexpectedShape(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ProtocolError::invalid_payload("replace", "missing id");
        assert_eq!(err.to_string(), "invalid payload for `replace`: missing id");

        let err = ProtocolError::UnexpectedShape("number".into());
        assert!(err.to_string().contains("number"));
    }

    #[test]
    fn message_level_errors() {
        let malformed = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(ProtocolError::Malformed(malformed).drops_message());
        assert!(ProtocolError::UnexpectedShape("null".into()).drops_message());
        assert!(!ProtocolError::invalid_payload("remove", "missing id").drops_message());
    }
}
