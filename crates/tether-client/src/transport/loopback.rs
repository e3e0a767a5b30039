//! In-memory transport
//!
//! `LoopbackConnector` answers dials from a script instead of the network
//! and hands the far end of every accepted transport to the caller as a
//! [`LoopbackPeer`]. Dial times are taken from `tokio::time::Instant`, so
//! they follow a paused test clock.

use super::{
    transport_channel, Connector, OutboundFrame, TransportError, TransportEvent, TransportHandle,
    TransportSide,
};
use crate::resolver::ConnectionTarget;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// How the connector answers a dial
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialBehavior {
    /// Open the transport and hand the peer end out
    Accept,
    /// Fail the dial immediately
    Refuse(String),
    /// Never answer; only the manager's connect timeout ends the dial
    Hang,
}

/// One recorded dial
#[derive(Debug, Clone)]
pub struct DialRecord {
    pub target: ConnectionTarget,
    pub at: Instant,
}

#[derive(Debug)]
struct ScriptState {
    script: VecDeque<DialBehavior>,
    fallback: DialBehavior,
    dials: Vec<DialRecord>,
}

/// Scripted connector backed by in-memory channels
#[derive(Debug)]
pub struct LoopbackConnector {
    state: Mutex<ScriptState>,
    peers_tx: mpsc::UnboundedSender<LoopbackPeer>,
    peers_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<LoopbackPeer>>,
}

impl Default for LoopbackConnector {
    fn default() -> Self {
        Self::new(DialBehavior::Accept)
    }
}

impl LoopbackConnector {
    /// Create a connector answering every unscripted dial with `fallback`
    #[must_use]
    pub fn new(fallback: DialBehavior) -> Self {
        let (peers_tx, peers_rx) = mpsc::unbounded_channel();
        Self {
            state: Mutex::new(ScriptState {
                script: VecDeque::new(),
                fallback,
                dials: Vec::new(),
            }),
            peers_tx,
            peers_rx: tokio::sync::Mutex::new(peers_rx),
        }
    }

    /// Queue behaviors for the next dials, in order
    pub fn script(&self, behaviors: impl IntoIterator<Item = DialBehavior>) {
        self.state.lock().script.extend(behaviors);
    }

    /// Change the answer for unscripted dials
    pub fn set_fallback(&self, fallback: DialBehavior) {
        self.state.lock().fallback = fallback;
    }

    /// Get every dial seen so far
    #[must_use]
    pub fn dials(&self) -> Vec<DialRecord> {
        self.state.lock().dials.clone()
    }

    /// Get the number of dials seen so far
    #[must_use]
    pub fn dial_count(&self) -> usize {
        self.state.lock().dials.len()
    }

    /// Wait for the peer end of the next accepted transport
    pub async fn next_peer(&self) -> Option<LoopbackPeer> {
        self.peers_rx.lock().await.recv().await
    }
}

#[async_trait]
impl Connector for LoopbackConnector {
    async fn connect(&self, target: &ConnectionTarget) -> Result<TransportHandle, TransportError> {
        let behavior = {
            let mut state = self.state.lock();
            state.dials.push(DialRecord {
                target: target.clone(),
                at: Instant::now(),
            });
            state
                .script
                .pop_front()
                .unwrap_or_else(|| state.fallback.clone())
        };

        match behavior {
            DialBehavior::Accept => {
                let (handle, side) = transport_channel();
                if self.peers_tx.send(LoopbackPeer::new(side)).is_err() {
                    return Err(TransportError::Refused("loopback closed".to_string()));
                }
                Ok(handle)
            }
            DialBehavior::Refuse(reason) => Err(TransportError::Refused(reason)),
            DialBehavior::Hang => std::future::pending().await,
        }
    }
}

/// Far end of a loopback transport, playing the server
#[derive(Debug)]
pub struct LoopbackPeer {
    outbound: mpsc::Receiver<OutboundFrame>,
    inbound: mpsc::Sender<TransportEvent>,
}

impl LoopbackPeer {
    fn new(side: TransportSide) -> Self {
        Self {
            outbound: side.outbound,
            inbound: side.inbound,
        }
    }

    /// Push a raw text frame to the client
    pub fn send_text(&self, text: impl Into<String>) -> bool {
        self.inbound
            .try_send(TransportEvent::Frame(text.into()))
            .is_ok()
    }

    /// Push a JSON frame to the client
    pub fn send_json<T: Serialize>(&self, value: &T) -> bool {
        serde_json::to_string(value).is_ok_and(|text| self.send_text(text))
    }

    /// Report a transport failure to the client
    pub fn fail(&self, reason: impl Into<String>) -> bool {
        self.inbound
            .try_send(TransportEvent::Error(reason.into()))
            .is_ok()
    }

    /// Close the transport from the server side
    pub fn close(&self, code: Option<u16>, reason: impl Into<String>) -> bool {
        self.inbound
            .try_send(TransportEvent::Closed {
                code,
                reason: reason.into(),
            })
            .is_ok()
    }

    /// Wait for the next frame the client writes
    ///
    /// Returns `None` once the client has dropped its end.
    pub async fn recv(&mut self) -> Option<OutboundFrame> {
        self.outbound.recv().await
    }

    /// Take every frame already written by the client
    pub fn drain(&mut self) -> Vec<OutboundFrame> {
        let mut frames = Vec::new();
        while let Ok(frame) = self.outbound.try_recv() {
            frames.push(frame);
        }
        frames
    }

    /// Check whether the client has released its end of the transport
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.outbound.is_closed()
    }

    /// Echo every text frame back to the client until it closes
    pub fn echo(mut self) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(frame) = self.outbound.recv().await {
                match frame {
                    OutboundFrame::Text(text) => {
                        if self.inbound.send(TransportEvent::Frame(text)).await.is_err() {
                            break;
                        }
                    }
                    OutboundFrame::Close => {
                        let _ = self
                            .inbound
                            .send(TransportEvent::Closed {
                                code: Some(1000),
                                reason: String::new(),
                            })
                            .await;
                        break;
                    }
                }
            }
        })
    }
}
