//! Connection state

use serde::{Deserialize, Serialize};

/// Lifecycle state of the shared connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConnectionState {
    /// No transport, nothing scheduled
    #[default]
    Idle,
    /// A transport is being opened
    Connecting,
    /// The transport is open
    Open,
    /// The transport closed; a reconnect may be pending
    Closed,
    /// Reconnect budget exhausted; only an explicit `connect()` resumes
    Disabled,
}

impl ConnectionState {
    /// Returns true if frames can be written
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }

    /// Returns true if `connect()` would be a no-op
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Connecting | Self::Open)
    }

    /// Get the name of this state
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Connecting => "Connecting",
            Self::Open => "Open",
            Self::Closed => "Closed",
            Self::Disabled => "Disabled",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Read-only view handed to consumers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSnapshot {
    pub is_connected: bool,
    pub is_connecting: bool,
    pub error: Option<String>,
}

impl ConnectionSnapshot {
    /// Derive a snapshot from the manager's state
    #[must_use]
    pub fn new(state: ConnectionState, last_error: Option<&str>) -> Self {
        Self {
            is_connected: state == ConnectionState::Open,
            is_connecting: state == ConnectionState::Connecting,
            error: last_error.map(str::to_string),
        }
    }
}
