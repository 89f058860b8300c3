//! Retry timer backed by a tokio deadline.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use topsync_client::RetryTimer;

/// A [`RetryTimer`] that records a deadline for the session loop to await.
///
/// Clones share state.
#[derive(Debug, Clone, Default)]
pub struct TokioTimer {
    deadline: Arc<Mutex<Option<Instant>>>,
}

impl TokioTimer {
    /// Creates a disarmed timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// When the armed retry is due.
    pub fn deadline(&self) -> Option<Instant> {
        *self.deadline.lock()
    }

    /// Disarms the timer. Returns true if it was armed.
    pub fn clear(&self) -> bool {
        self.deadline.lock().take().is_some()
    }
}

impl RetryTimer for TokioTimer {
    fn schedule(&mut self, delay: Duration) {
        *self.deadline.lock() = Some(Instant::now() + delay);
    }

    fn cancel(&mut self) {
        self.clear();
    }
}
