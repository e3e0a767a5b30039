//! Mutable manager state
//!
//! Lives behind the manager's mutex. Every task the manager spawns is
//! tagged with an epoch; a task whose epoch no longer matches is stale and
//! its events are ignored.

use crate::transport::OutboundFrame;
use tether_core::ConnectionState;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

/// The current transport, from dial until close
pub(crate) struct Link {
    pub generation: u64,
    /// Task dialing and then reading this transport
    pub task: AbortHandle,
    /// Set once the transport opens
    pub outbound: Option<mpsc::Sender<OutboundFrame>>,
}

/// A scheduled reconnect
pub(crate) struct PendingReconnect {
    pub token: u64,
    pub task: AbortHandle,
}

#[derive(Default)]
pub(crate) struct ManagerState {
    pub state: ConnectionState,
    /// Consecutive reconnects since the last successful open
    pub attempt_count: u32,
    pub last_error: Option<String>,
    epoch: u64,
    pub link: Option<Link>,
    pub reconnect: Option<PendingReconnect>,
    pub heartbeat: Option<AbortHandle>,
}

impl ManagerState {
    /// Allocate a fresh epoch for a link or timer
    pub fn next_epoch(&mut self) -> u64 {
        self.epoch += 1;
        self.epoch
    }

    /// Check if `generation` is the current link
    pub fn owns(&self, generation: u64) -> bool {
        self.link
            .as_ref()
            .is_some_and(|link| link.generation == generation)
    }

    /// Get the writer for the open transport
    pub fn outbound(&self) -> Option<&mpsc::Sender<OutboundFrame>> {
        if self.state != ConnectionState::Open {
            return None;
        }
        self.link.as_ref().and_then(|link| link.outbound.as_ref())
    }

    pub fn cancel_reconnect(&mut self) {
        if let Some(pending) = self.reconnect.take() {
            pending.task.abort();
        }
    }

    pub fn stop_heartbeat(&mut self) {
        if let Some(task) = self.heartbeat.take() {
            task.abort();
        }
    }

    /// Tear down the current link, asking the transport to close
    ///
    /// Returns true if a link existed.
    pub fn abort_link(&mut self) -> bool {
        match self.link.take() {
            Some(link) => {
                link.task.abort();
                if let Some(outbound) = link.outbound {
                    let _ = outbound.try_send(OutboundFrame::Close);
                }
                true
            }
            None => false,
        }
    }

    /// Stop every task the manager owns
    pub fn abort_all(&mut self) -> bool {
        self.cancel_reconnect();
        self.stop_heartbeat();
        self.abort_link()
    }
}
