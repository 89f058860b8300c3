//! Reconnection policy.

use crate::config::ReconnectConfig;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Schedules the single pending retry.
///
/// The client calls [`RetryTimer::schedule`] at most once per pending retry
/// and expects [`SyncClient::on_retry_timer`](crate::SyncClient::on_retry_timer)
/// to be invoked when the delay elapses.
pub trait RetryTimer {
    /// Arms the timer.
    fn schedule(&mut self, delay: Duration);

    /// Disarms the timer, if armed.
    fn cancel(&mut self);
}

impl<T: RetryTimer + ?Sized> RetryTimer for Box<T> {
    fn schedule(&mut self, delay: Duration) {
        (**self).schedule(delay)
    }

    fn cancel(&mut self) {
        (**self).cancel()
    }
}

/// Decides whether and when to reconnect.
///
/// Holds at most one pending retry: a disconnect while a retry is already
/// pending schedules nothing.
#[derive(Debug, Clone)]
pub struct Reconnector {
    config: ReconnectConfig,
    attempts: u32,
    pending: Option<Duration>,
}

impl Reconnector {
    /// Creates a reconnector.
    pub fn new(config: ReconnectConfig) -> Self {
        Self {
            config,
            attempts: 0,
            pending: None,
        }
    }

    /// Returns the policy.
    pub fn config(&self) -> &ReconnectConfig {
        &self.config
    }

    /// Called on disconnect. Returns the delay to arm a timer with, or
    /// `None` if no new timer is needed.
    pub fn on_disconnect(&mut self) -> Option<Duration> {
        if self.pending.is_some() || !self.config.allows_attempt(self.attempts) {
            return None;
        }
        let delay = self.config.delay_for_attempt(self.attempts);
        self.pending = Some(delay);
        Some(delay)
    }

    /// Called when the armed timer fires. Returns false if nothing was pending.
    pub fn on_timer_fired(&mut self) -> bool {
        if self.pending.take().is_none() {
            return false;
        }
        self.attempts = self.attempts.saturating_add(1);
        true
    }

    /// Called when a connection opens.
    pub fn on_open(&mut self) {
        self.attempts = 0;
    }

    /// Drops any pending retry. Returns true if one was pending.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    /// Returns the pending delay, if a retry is scheduled.
    pub fn pending(&self) -> Option<Duration> {
        self.pending
    }

    /// Consecutive retries since the last successful open.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

#[derive(Debug, Default)]
struct ManualTimerState {
    armed: Option<Duration>,
    scheduled: Vec<Duration>,
    cancels: usize,
}

/// A timer that only records, for tests and hand-driven loops.
///
/// Clones share state.
#[derive(Debug, Clone, Default)]
pub struct ManualTimer {
    state: Arc<Mutex<ManualTimerState>>,
}

impl ManualTimer {
    /// Creates a new manual timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently armed delay.
    pub fn armed(&self) -> Option<Duration> {
        self.state.lock().armed
    }

    /// Every delay ever scheduled, in order.
    pub fn scheduled(&self) -> Vec<Duration> {
        self.state.lock().scheduled.clone()
    }

    /// Number of `cancel` calls.
    pub fn cancels(&self) -> usize {
        self.state.lock().cancels
    }

    /// Disarms the timer as if it had fired. Returns the delay it was armed with.
    pub fn fire(&self) -> Option<Duration> {
        self.state.lock().armed.take()
    }
}

impl RetryTimer for ManualTimer {
    fn schedule(&mut self, delay: Duration) {
        let mut state = self.state.lock();
        state.armed = Some(delay);
        state.scheduled.push(delay);
    }

    fn cancel(&mut self) {
        let mut state = self.state.lock();
        state.armed = None;
        state.cancels += 1;
    }
}
