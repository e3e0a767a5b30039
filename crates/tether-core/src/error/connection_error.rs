//! Connection errors - advisory failures delivered to subscribers

use thiserror::Error;

/// Failures surfaced to subscribers through `on_error`
///
/// None of these ever propagate through caller code. Unparseable inbound
/// frames are not represented here: they are logged and dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    /// No usable bearer token, so no connection target exists
    #[error("cannot resolve connection target: {0}")]
    Configuration(String),

    /// The transport reported an error; a forced close always follows
    #[error("transport error: {0}")]
    Transport(String),

    /// The reconnect budget is spent and the manager has disabled itself
    #[error("max reconnection attempts reached")]
    Exhausted { attempts: u32 },
}

impl ConnectionError {
    /// Check if retrying without caller intervention could succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Get a stable error code for logs and status displays
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Transport(_) => "TRANSPORT_ERROR",
            Self::Exhausted { .. } => "RECONNECT_EXHAUSTED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhausted_message() {
        let err = ConnectionError::Exhausted { attempts: 5 };
        assert_eq!(err.to_string(), "max reconnection attempts reached");
        assert_eq!(err.code(), "RECONNECT_EXHAUSTED");
    }

    #[test]
    fn test_retryable() {
        assert!(ConnectionError::Transport("reset".to_string()).is_retryable());
        assert!(!ConnectionError::Configuration("no token".to_string()).is_retryable());
        assert!(!ConnectionError::Exhausted { attempts: 5 }.is_retryable());
    }

    #[test]
    fn test_display() {
        let err = ConnectionError::Configuration("token is missing".to_string());
        assert_eq!(
            err.to_string(),
            "cannot resolve connection target: token is missing"
        );
    }
}
