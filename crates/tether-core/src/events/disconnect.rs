//! Disconnect reasons

use std::fmt;
use std::time::Duration;

/// Why a transport went away
///
/// Carried to `on_disconnect` and into logs. Every variant except
/// `Requested` takes the same retry path; the close code is informational.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The connection-timeout guard fired before the transport opened
    ConnectTimeout(Duration),
    /// The dial itself failed
    ConnectFailed(String),
    /// The peer closed the socket, or the stream ended
    PeerClosed { code: Option<u16>, reason: String },
    /// The transport reported an error and was force-closed
    TransportError(String),
    /// `disconnect()` was called
    Requested,
}

impl DisconnectReason {
    /// Check if this closure was caller-initiated
    #[must_use]
    pub fn is_requested(&self) -> bool {
        matches!(self, Self::Requested)
    }

    /// Get the peer close code, if one was received
    #[must_use]
    pub fn close_code(&self) -> Option<u16> {
        match self {
            Self::PeerClosed { code, .. } => *code,
            _ => None,
        }
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectTimeout(after) => {
                write!(f, "connection attempt timed out after {}ms", after.as_millis())
            }
            Self::ConnectFailed(reason) => write!(f, "connection failed: {reason}"),
            Self::PeerClosed { code: Some(code), reason } if !reason.is_empty() => {
                write!(f, "closed by peer ({code}: {reason})")
            }
            Self::PeerClosed { code: Some(code), .. } => write!(f, "closed by peer ({code})"),
            Self::PeerClosed { code: None, .. } => write!(f, "closed by peer"),
            Self::TransportError(reason) => write!(f, "transport error: {reason}"),
            Self::Requested => write!(f, "disconnect requested"),
        }
    }
}
