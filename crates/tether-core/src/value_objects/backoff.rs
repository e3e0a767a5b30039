//! Linear reconnect backoff
//!
//! `delay(n) = base_interval * n` for reconnect attempt `n` (1-based), up to
//! `max_attempts` reconnects.

use std::time::Duration;

/// Default delay unit between reconnect attempts
pub const DEFAULT_BASE_INTERVAL: Duration = Duration::from_millis(3_000);

/// Default reconnect budget before the manager disables itself
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Reconnect delay policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Delay unit; attempt `n` waits `n` units
    pub base_interval: Duration,
    /// Number of reconnects allowed after consecutive failures
    pub max_attempts: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base_interval: DEFAULT_BASE_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl BackoffPolicy {
    /// Create a new policy
    #[must_use]
    pub fn new(base_interval: Duration, max_attempts: u32) -> Self {
        Self {
            base_interval,
            max_attempts,
        }
    }

    /// Check if another reconnect is allowed after `attempts_so_far`
    #[must_use]
    pub fn allows(&self, attempts_so_far: u32) -> bool {
        attempts_so_far < self.max_attempts
    }

    /// Get the delay before reconnect attempt `attempt`
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_interval.saturating_mul(attempt)
    }
}
