//! Configuration for the sync client.

use crate::endpoint::Endpoint;
use crate::status::StatusMarkers;
use std::time::Duration;

/// Default id of the root container targeted by `newContent`.
pub const DEFAULT_ROOT_ID: &str = "topsync-content";

/// How a `replace` instruction treats the addressed node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplaceMode {
    /// Replace the node's children; the node itself (and its id) stays.
    #[default]
    Inner,
    /// Swap the node itself for the parsed fragment.
    Outer,
}

/// Configuration for the sync client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// WebSocket endpoint.
    pub endpoint: Endpoint,
    /// Id of the root container replaced by `newContent`.
    pub root_id: String,
    /// Replace semantics.
    pub replace_mode: ReplaceMode,
    /// How field status is mirrored onto elements.
    pub markers: StatusMarkers,
    /// Reconnection policy.
    pub reconnect: ReconnectConfig,
}

impl ClientConfig {
    /// Creates a new client configuration.
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            root_id: DEFAULT_ROOT_ID.to_string(),
            replace_mode: ReplaceMode::default(),
            markers: StatusMarkers::default(),
            reconnect: ReconnectConfig::default(),
        }
    }

    /// Sets the root container id.
    pub fn with_root_id(mut self, root_id: impl Into<String>) -> Self {
        self.root_id = root_id.into();
        self
    }

    /// Sets the replace semantics.
    pub fn with_replace_mode(mut self, mode: ReplaceMode) -> Self {
        self.replace_mode = mode;
        self
    }

    /// Sets the status markers.
    pub fn with_markers(mut self, markers: StatusMarkers) -> Self {
        self.markers = markers;
        self
    }

    /// Sets the reconnection policy.
    pub fn with_reconnect(mut self, reconnect: ReconnectConfig) -> Self {
        self.reconnect = reconnect;
        self
    }
}

/// Configuration for reconnect behavior.
///
/// The default is a fixed one-second delay, retried indefinitely.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectConfig {
    /// Whether to reconnect at all.
    pub enabled: bool,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound for any single delay (before jitter).
    pub max_delay: Duration,
    /// Growth factor per attempt; 1.0 keeps the delay fixed.
    pub backoff_multiplier: f64,
    /// Whether to add up to 25% random jitter.
    pub add_jitter: bool,
    /// Maximum consecutive retries, or `None` for no cap.
    pub max_attempts: Option<u32>,
}

impl ReconnectConfig {
    /// Retries with a fixed delay, forever.
    pub fn fixed(delay: Duration) -> Self {
        Self {
            enabled: true,
            initial_delay: delay,
            max_delay: delay,
            backoff_multiplier: 1.0,
            add_jitter: false,
            max_attempts: None,
        }
    }

    /// Never reconnects; the user has to reload.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::fixed(Duration::ZERO)
        }
    }

    /// Sets the maximum delay.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the backoff multiplier.
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Enables or disables jitter.
    pub fn with_jitter(mut self, add_jitter: bool) -> Self {
        self.add_jitter = add_jitter;
        self
    }

    /// Caps the number of consecutive retries.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Calculates the delay for a retry attempt (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let cap = self.max_delay.max(self.initial_delay);
        let factor = self
            .backoff_multiplier
            .powi(attempt.min(i32::MAX as u32) as i32);
        let delay = Duration::try_from_secs_f64(self.initial_delay.as_secs_f64() * factor)
            .map_or(cap, |d| d.min(cap));

        if self.add_jitter {
            delay.saturating_add(delay.mul_f64(0.25 * rand::random::<f64>()))
        } else {
            delay
        }
    }

    /// Returns true if another retry is allowed after `attempts` retries.
    pub fn allows_attempt(&self, attempts: u32) -> bool {
        self.enabled && self.max_attempts.map_or(true, |max| attempts < max)
    }
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self::fixed(Duration::from_secs(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_config_builder() {
        let config = ClientConfig::new(Endpoint::new("ws://localhost/ws"))
            .with_root_id("app")
            .with_replace_mode(ReplaceMode::Outer)
            .with_reconnect(ReconnectConfig::disabled());

        assert_eq!(config.endpoint.url(), "ws://localhost/ws");
        assert_eq!(config.root_id, "app");
        assert_eq!(config.replace_mode, ReplaceMode::Outer);
        assert!(!config.reconnect.enabled);
    }

    #[test]
    fn defaults() {
        let config = ClientConfig::new(Endpoint::new("ws://h/"));
        assert_eq!(config.root_id, DEFAULT_ROOT_ID);
        assert_eq!(config.replace_mode, ReplaceMode::Inner);
        assert_eq!(config.reconnect, ReconnectConfig::fixed(Duration::from_secs(1)));
    }

    #[test]
    fn fixed_delay_does_not_grow() {
        let config = ReconnectConfig::fixed(Duration::from_secs(5));
        assert_eq!(config.delay_for_attempt(0), Duration::from_secs(5));
        assert_eq!(config.delay_for_attempt(10), Duration::from_secs(5));
        assert!(config.allows_attempt(1_000_000));
    }

    #[test]
    fn disabled_never_allows() {
        assert!(!ReconnectConfig::disabled().allows_attempt(0));
    }

    #[test]
    fn backoff_respects_max() {
        let config = ReconnectConfig::fixed(Duration::from_millis(100))
            .with_backoff_multiplier(2.0)
            .with_max_delay(Duration::from_secs(1));

        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(config.delay_for_attempt(10), Duration::from_secs(1));
    }

    #[test]
    fn jitter_bounds() {
        let config = ReconnectConfig::fixed(Duration::from_secs(1)).with_jitter(true);
        for attempt in 0..20 {
            let delay = config.delay_for_attempt(attempt);
            assert!(delay >= Duration::from_secs(1));
            assert!(delay <= Duration::from_millis(1250));
        }
    }

    #[test]
    fn jitter_saturates_near_max() {
        let config = ReconnectConfig::fixed(Duration::MAX).with_jitter(true);
        for attempt in 0..20 {
            assert_eq!(config.delay_for_attempt(attempt), Duration::MAX);
        }
    }

    #[test]
    fn attempt_cap() {
        let config = ReconnectConfig::default().with_max_attempts(3);
        assert!(config.allows_attempt(2));
        assert!(!config.allows_attempt(3));
    }
}
