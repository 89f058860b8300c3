//! Error types for the sync client.

use thiserror::Error;
use topsync_protocol::{NodeId, ProtocolError};

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors raised by a [`Document`](crate::Document) implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// The addressed node is not in the document.
    ///
    /// Expected under races (the node was removed by an earlier patch).
    #[error("target node `{0}` not found")]
    TargetMissing(NodeId),

    /// The markup fragment could not be parsed.
    #[error("invalid markup: {0}")]
    Markup(String),
}

/// Errors that can occur in the sync client.
///
/// None of these are fatal: decode and apply failures are contained,
/// and only transport failures are escalated to the user.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Inbound payload could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] ProtocolError),

    /// The document refused an operation.
    #[error("document error: {0}")]
    Document(#[from] DocumentError),

    /// Channel-level failure.
    #[error("transport error: {message}")]
    Transport {
        /// Error detail reported by the transport.
        message: String,
    },

    /// The server rejected a field's value.
    #[error("server rejected value of `{id}`")]
    ServerRejection {
        /// Field identifier.
        id: NodeId,
    },

    /// No open connection to send on.
    #[error("not connected to server")]
    NotConnected,

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl SyncError {
    /// Creates a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Returns true if the addressed node was missing.
    pub fn is_target_missing(&self) -> bool {
        matches!(self, SyncError::Document(DocumentError::TargetMissing(_)))
    }

    /// Returns true if this error should surface as a user-visible notice.
    pub fn is_user_visible(&self) -> bool {
        matches!(self, SyncError::Transport { .. })
    }
}
