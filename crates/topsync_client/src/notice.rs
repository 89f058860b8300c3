//! User-visible connection notices.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// A connection event the user should be told about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The connection failed with a transport error.
    ConnectionFailed,
    /// The connection closed.
    ConnectionLost {
        /// Close reason reported by the transport.
        reason: Option<String>,
    },
    /// A connection opened again after a loss.
    Reconnected,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::ConnectionFailed => f.write_str("Failed to connect to the server"),
            Notice::ConnectionLost { reason: Some(reason) } if !reason.is_empty() => {
                write!(f, "Lost connection: {reason}")
            }
            Notice::ConnectionLost { .. } => f.write_str("Lost connection"),
            Notice::Reconnected => f.write_str("Reconnected"),
        }
    }
}

/// Surfaces notices to the user.
pub trait Notifier {
    /// Shows a notice.
    fn notify(&mut self, notice: Notice);
}

impl<N: Notifier + ?Sized> Notifier for Box<N> {
    fn notify(&mut self, notice: Notice) {
        (**self).notify(notice)
    }
}

/// Logs notices through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&mut self, notice: Notice) {
        match notice {
            Notice::Reconnected => info!("{notice}"),
            _ => warn!("{notice}"),
        }
    }
}

/// Records notices, for tests. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl RecordingNotifier {
    /// Creates a new recording notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Notices received so far.
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&mut self, notice: Notice) {
        self.notices.lock().push(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notice_display() {
        assert_eq!(Notice::ConnectionFailed.to_string(), "Failed to connect to the server");
        assert_eq!(
            Notice::ConnectionLost { reason: Some("going away".into()) }.to_string(),
            "Lost connection: going away"
        );
        assert_eq!(Notice::ConnectionLost { reason: Some(String::new()) }.to_string(), "Lost connection");
        assert_eq!(Notice::ConnectionLost { reason: None }.to_string(), "Lost connection");
    }

    #[test]
    fn recording_notifier_shares_state() {
        let mut notifier = RecordingNotifier::new();
        let handle = notifier.clone();
        notifier.notify(Notice::Reconnected);
        assert_eq!(handle.notices(), vec![Notice::Reconnected]);
    }
}
