//! Manager tuning

use std::time::Duration;
use tether_common::ClientConfig;
use tether_core::BackoffPolicy;

/// How long a dial may take before it is abandoned
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Cadence of outbound heartbeat frames while open
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_millis(30_000);

/// Timers and retry policy for a [`ConnectionManager`](super::ConnectionManager)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Reconnect delay and budget
    pub backoff: BackoffPolicy,
    /// Dial timeout
    pub connect_timeout: Duration,
    /// Heartbeat cadence; zero disables heartbeats
    pub heartbeat_interval: Duration,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            backoff: BackoffPolicy::default(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
        }
    }
}

impl ManagerConfig {
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }
}

impl From<&ClientConfig> for ManagerConfig {
    fn from(config: &ClientConfig) -> Self {
        Self {
            backoff: config.reconnect.policy(),
            connect_timeout: config.timeouts.connect_timeout(),
            heartbeat_interval: config.timeouts.heartbeat_interval(),
        }
    }
}
