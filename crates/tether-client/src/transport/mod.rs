//! Transport seam
//!
//! The connection manager never touches sockets directly. A [`Connector`]
//! dials a [`ConnectionTarget`] and hands back a pair of channels: one for
//! frames going out, one for events coming in. `WsConnector` backs this with
//! a real WebSocket, `LoopbackConnector` with an in-memory peer for tests.

mod loopback;
mod ws;

pub use loopback::{DialBehavior, DialRecord, LoopbackConnector, LoopbackPeer};
pub use ws::WsConnector;

use crate::resolver::ConnectionTarget;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Buffer size for frames queued towards the socket
pub const OUTBOUND_BUFFER_SIZE: usize = 256;

/// Buffer size for events queued towards the manager
pub const INBOUND_BUFFER_SIZE: usize = 256;

/// A frame the manager asks the transport to write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    /// Serialized JSON text frame
    Text(String),
    /// Start a graceful close
    Close,
}

/// Something the transport observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Inbound text frame, not yet parsed
    Frame(String),
    /// Transport-level failure; the transport is unusable afterwards
    Error(String),
    /// The socket closed
    Closed { code: Option<u16>, reason: String },
}

/// Manager-side ends of an open transport
#[derive(Debug)]
pub struct TransportHandle {
    pub outbound: mpsc::Sender<OutboundFrame>,
    pub inbound: mpsc::Receiver<TransportEvent>,
}

/// Transport-side ends of an open transport
#[derive(Debug)]
pub struct TransportSide {
    pub outbound: mpsc::Receiver<OutboundFrame>,
    pub inbound: mpsc::Sender<TransportEvent>,
}

/// Create the linked channel pair for a freshly opened transport
#[must_use]
pub fn transport_channel() -> (TransportHandle, TransportSide) {
    let (out_tx, out_rx) = mpsc::channel(OUTBOUND_BUFFER_SIZE);
    let (in_tx, in_rx) = mpsc::channel(INBOUND_BUFFER_SIZE);

    (
        TransportHandle {
            outbound: out_tx,
            inbound: in_rx,
        },
        TransportSide {
            outbound: out_rx,
            inbound: in_tx,
        },
    )
}

/// Dial failures
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("invalid target: {0}")]
    InvalidTarget(String),

    #[error("handshake failed: {0}")]
    Handshake(String),

    #[error("connection refused: {0}")]
    Refused(String),
}

/// Opens transports
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Dial `target` and return the manager-side channel ends
    ///
    /// The manager bounds this call with its connect timeout and drops the
    /// future if the timeout fires first.
    async fn connect(&self, target: &ConnectionTarget) -> Result<TransportHandle, TransportError>;
}
