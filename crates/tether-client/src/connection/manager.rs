//! Connection manager
//!
//! Owns the single shared transport. Consumers subscribe for fan-out and
//! call `connect`, `disconnect`, and `send_message`; the manager handles
//! dialing, the connect timeout, linear-backoff reconnects, and heartbeats.
//!
//! State sits behind one mutex that is never held across an `.await` or
//! while subscriber callbacks run. Notifications are queued under that
//! mutex and delivered afterwards through one ordered dispatcher, so every
//! subscriber sees events in the order the state changed, even when a
//! callback calls back into the manager. Spawned tasks hold a `Weak`
//! reference and an epoch, so tasks from a superseded link find themselves
//! stale and do nothing.

use super::state::{Link, ManagerState, PendingReconnect};
use super::ManagerConfig;
use crate::resolver::{ConnectionTarget, UriResolver};
use crate::subscription::{Dispatcher, Notice, Subscriber, Subscription, SubscriptionRegistry};
use crate::transport::{Connector, OutboundFrame, TransportEvent, TransportHandle, WsConnector};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tether_core::{
    ConnectionError, ConnectionSnapshot, ConnectionState, DisconnectReason, Envelope,
};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

struct Inner {
    config: ManagerConfig,
    resolver: UriResolver,
    connector: Arc<dyn Connector>,
    registry: SubscriptionRegistry,
    dispatcher: Dispatcher,
    runtime: Handle,
    state: Mutex<ManagerState>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.state.get_mut().abort_all();
    }
}

/// Handle to the shared connection
///
/// Cheap to clone; every clone drives the same transport. When the last
/// handle is dropped all timers stop and the transport is closed.
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<Inner>,
}

impl ConnectionManager {
    /// Create a manager dialing through `connector`
    ///
    /// # Panics
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn new(config: ManagerConfig, resolver: UriResolver, connector: Arc<dyn Connector>) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                resolver,
                connector,
                registry: SubscriptionRegistry::new(),
                dispatcher: Dispatcher::default(),
                runtime: Handle::current(),
                state: Mutex::new(ManagerState::default()),
            }),
        }
    }

    /// Create a manager dialing real WebSocket servers
    ///
    /// # Panics
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn websocket(config: ManagerConfig, resolver: UriResolver) -> Self {
        Self::new(config, resolver, Arc::new(WsConnector::new()))
    }

    fn upgrade(inner: &Weak<Inner>) -> Option<Self> {
        inner.upgrade().map(|inner| Self { inner })
    }

    /// Get the manager configuration
    #[must_use]
    pub fn config(&self) -> &ManagerConfig {
        &self.inner.config
    }

    /// Register a subscriber
    ///
    /// If the connection is already open the subscriber gets `on_connect`
    /// before this returns. Called from inside a callback, the catch-up is
    /// delivered right after the event currently being delivered. Dropping
    /// the returned guard unsubscribes.
    pub fn subscribe(&self, subscriber: Arc<dyn Subscriber>) -> Subscription {
        // Registering under the state lock orders this against handle_open,
        // so the subscriber sees exactly one on_connect for the open link.
        let subscription = {
            let state = self.inner.state.lock();
            let fresh = self.inner.registry.find(&subscriber).is_none();
            let subscription = self.inner.registry.add(subscriber.clone());
            if fresh && state.state.is_open() {
                self.inner.dispatcher.push_to(Notice::Connect, vec![subscriber]);
            }
            subscription
        };

        self.dispatch();
        subscription
    }

    /// Open the shared connection
    ///
    /// No-op while connecting or open. From `Closed` any pending reconnect
    /// is cancelled and the dial happens now; from `Disabled` the reconnect
    /// budget is reset first. Without a usable token subscribers get a
    /// configuration error and the manager stays `Idle`.
    pub fn connect(&self) {
        {
            let mut state = self.inner.state.lock();
            match state.state {
                ConnectionState::Connecting | ConnectionState::Open => {
                    tracing::debug!(state = %state.state, "connect() ignored; already active");
                    return;
                }
                ConnectionState::Disabled => {
                    tracing::info!("Re-enabling after exhausted reconnect budget");
                    state.attempt_count = 0;
                }
                ConnectionState::Idle | ConnectionState::Closed => {}
            }
            self.begin_dial(&mut state);
        }

        self.dispatch();
    }

    /// Close the shared connection and stop retrying
    ///
    /// Cancels every timer, closes the transport, and resets the reconnect
    /// budget. Subscribers get `on_disconnect(Requested)` if a transport was
    /// connecting or open.
    pub fn disconnect(&self) {
        {
            let mut state = self.inner.state.lock();
            let was_live = state.abort_all();
            let previous = state.state;

            state.state = ConnectionState::Idle;
            state.attempt_count = 0;
            state.last_error = None;

            tracing::info!(previous = %previous, "Disconnected");
            if was_live {
                self.inner
                    .dispatcher
                    .push(Notice::Disconnect(DisconnectReason::Requested));
            }
        }

        self.dispatch();
    }

    /// Serialize `message` as JSON and write it to the open transport
    ///
    /// Returns false, without writing anything, when the connection is not
    /// open or the message cannot be serialized.
    pub fn send_message<T: Serialize + ?Sized>(&self, message: &T) -> bool {
        let state = self.inner.state.lock();

        let Some(outbound) = state.outbound() else {
            tracing::debug!(state = %state.state, "Not open; message not sent");
            return false;
        };

        let json = match serde_json::to_string(message) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize outbound message");
                return false;
            }
        };

        match outbound.try_send(OutboundFrame::Text(json)) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Outbound queue rejected message");
                false
            }
        }
    }

    /// Get the consumer-facing view of the connection
    #[must_use]
    pub fn connection_state(&self) -> ConnectionSnapshot {
        let state = self.inner.state.lock();
        ConnectionSnapshot::new(state.state, state.last_error.as_deref())
    }

    /// Get the lifecycle state
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.inner.state.lock().state
    }

    /// Get the number of consecutive reconnects since the last open
    #[must_use]
    pub fn attempt_count(&self) -> u32 {
        self.inner.state.lock().attempt_count
    }

    /// Get the number of registered subscribers
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.registry.len()
    }

    /// Deliver queued notifications; never called with the state lock held
    fn dispatch(&self) {
        self.inner.dispatcher.drain(&self.inner.registry);
    }

    // === Link lifecycle ===

    /// Resolve a target and start a dial
    ///
    /// Without a target the manager goes `Idle` and a configuration error
    /// is queued for subscribers.
    fn begin_dial(&self, state: &mut ManagerState) {
        state.cancel_reconnect();

        let target = match self.inner.resolver.resolve() {
            Ok(target) => target,
            Err(e) => {
                tracing::warn!(error = %e, "No connection target; not dialing");
                let error = ConnectionError::Configuration(e.to_string());
                state.state = ConnectionState::Idle;
                state.last_error = Some(error.to_string());
                self.inner.dispatcher.push(Notice::Error(error));
                return;
            }
        };

        let generation = state.next_epoch();
        state.state = ConnectionState::Connecting;

        tracing::info!(
            uri = %target,
            generation,
            attempt = state.attempt_count,
            "Connecting"
        );

        let task = self
            .inner
            .runtime
            .spawn(run_link(Arc::downgrade(&self.inner), generation, target))
            .abort_handle();

        state.link = Some(Link {
            generation,
            task,
            outbound: None,
        });
    }

    /// The transport opened
    ///
    /// Returns false if the link was superseded while dialing.
    fn handle_open(&self, generation: u64, outbound: mpsc::Sender<OutboundFrame>) -> bool {
        {
            let mut state = self.inner.state.lock();
            if !state.owns(generation) || state.state != ConnectionState::Connecting {
                return false;
            }

            state.state = ConnectionState::Open;
            state.attempt_count = 0;
            state.last_error = None;
            if let Some(link) = state.link.as_mut() {
                link.outbound = Some(outbound);
            }
            state.heartbeat = self.spawn_heartbeat(generation);

            let targets = self.inner.registry.snapshot();
            tracing::info!(generation, subscribers = targets.len(), "Connection open");
            self.inner.dispatcher.push_to(Notice::Connect, targets);
        }

        self.dispatch();
        true
    }

    /// An inbound text frame arrived
    fn handle_frame(&self, generation: u64, text: &str) {
        let message = match Envelope::from_json(text) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(
                    generation,
                    error = %e,
                    len = text.len(),
                    "Dropping malformed frame"
                );
                return;
            }
        };

        {
            let state = self.inner.state.lock();
            if !state.owns(generation) {
                return;
            }
            tracing::trace!(generation, kind = %message.kind, "Frame received");
            self.inner.dispatcher.push(Notice::Message(message));
        }

        self.dispatch();
    }

    /// The transport failed; force it closed
    fn handle_error(&self, generation: u64, message: String) {
        {
            let mut state = self.inner.state.lock();
            if !state.owns(generation) {
                return;
            }
            if let Some(outbound) = state.link.as_mut().and_then(|link| link.outbound.take()) {
                let _ = outbound.try_send(OutboundFrame::Close);
            }
            state.last_error = Some(message.clone());

            tracing::warn!(generation, error = %message, "Transport error");
            self.inner
                .dispatcher
                .push(Notice::Error(ConnectionError::Transport(message)));
        }

        self.dispatch();
    }

    /// The transport is gone; schedule a reconnect or give up
    fn handle_close(&self, generation: u64, reason: DisconnectReason) {
        {
            let mut state = self.inner.state.lock();
            if !state.owns(generation) {
                return;
            }

            state.link = None;
            state.stop_heartbeat();
            state.state = ConnectionState::Closed;
            state.last_error = Some(reason.to_string());

            let policy = self.inner.config.backoff;
            if policy.allows(state.attempt_count) {
                state.attempt_count += 1;
                let delay = policy.delay_for(state.attempt_count);
                let token = state.next_epoch();
                let task = self.spawn_reconnect(token, delay);
                state.reconnect = Some(PendingReconnect { token, task });

                tracing::info!(
                    generation,
                    reason = %reason,
                    attempt = state.attempt_count,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "Connection closed; reconnect scheduled"
                );
                self.inner.dispatcher.push(Notice::Disconnect(reason));
            } else {
                let error = ConnectionError::Exhausted {
                    attempts: state.attempt_count,
                };
                state.state = ConnectionState::Disabled;
                state.last_error = Some(error.to_string());

                tracing::warn!(
                    generation,
                    reason = %reason,
                    attempts = state.attempt_count,
                    "Connection closed; reconnect budget exhausted"
                );
                self.inner.dispatcher.push(Notice::Disconnect(reason));
                self.inner.dispatcher.push(Notice::Error(error));
            }
        }

        self.dispatch();
    }

    // === Timers ===

    fn spawn_reconnect(&self, token: u64, delay: Duration) -> AbortHandle {
        let inner = Arc::downgrade(&self.inner);
        self.inner
            .runtime
            .spawn(async move {
                tokio::time::sleep(delay).await;
                if let Some(manager) = Self::upgrade(&inner) {
                    manager.fire_reconnect(token);
                }
            })
            .abort_handle()
    }

    fn fire_reconnect(&self, token: u64) {
        {
            let mut state = self.inner.state.lock();
            match &state.reconnect {
                Some(pending) if pending.token == token => {}
                _ => return,
            }
            state.reconnect = None;
            if state.state != ConnectionState::Closed {
                return;
            }

            tracing::debug!(attempt = state.attempt_count, "Reconnecting");
            self.begin_dial(&mut state);
        }

        self.dispatch();
    }

    fn spawn_heartbeat(&self, generation: u64) -> Option<AbortHandle> {
        let period = self.inner.config.heartbeat_interval;
        if period.is_zero() {
            return None;
        }

        let inner = Arc::downgrade(&self.inner);
        let task = self.inner.runtime.spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let Some(manager) = Self::upgrade(&inner) else {
                    break;
                };
                if !manager.send_heartbeat(generation) {
                    break;
                }
            }
        });
        Some(task.abort_handle())
    }

    /// Write one heartbeat; returns false once the link is gone
    fn send_heartbeat(&self, generation: u64) -> bool {
        let state = self.inner.state.lock();
        if !state.owns(generation) {
            return false;
        }
        let Some(outbound) = state.outbound() else {
            return false;
        };

        match Envelope::heartbeat_now().to_json() {
            Ok(json) => {
                if outbound.try_send(OutboundFrame::Text(json)).is_err() {
                    tracing::debug!(generation, "Heartbeat dropped; outbound queue unavailable");
                } else {
                    tracing::trace!(generation, "Heartbeat sent");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Failed to serialize heartbeat"),
        }
        true
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("ConnectionManager")
            .field("state", &state.state)
            .field("attempt_count", &state.attempt_count)
            .field("subscribers", &self.inner.registry.len())
            .finish_non_exhaustive()
    }
}

/// Dial one link and pump its events into the manager until it closes
async fn run_link(inner: Weak<Inner>, generation: u64, target: ConnectionTarget) {
    let Some(manager) = ConnectionManager::upgrade(&inner) else {
        return;
    };
    let connector = manager.inner.connector.clone();
    let connect_timeout = manager.inner.config.connect_timeout;
    drop(manager);

    let dialed = tokio::time::timeout(connect_timeout, connector.connect(&target)).await;

    let TransportHandle {
        outbound,
        mut inbound,
    } = match dialed {
        Ok(Ok(handle)) => handle,
        Ok(Err(e)) => {
            if let Some(manager) = ConnectionManager::upgrade(&inner) {
                manager.handle_error(generation, e.to_string());
                manager.handle_close(generation, DisconnectReason::ConnectFailed(e.to_string()));
            }
            return;
        }
        Err(_) => {
            if let Some(manager) = ConnectionManager::upgrade(&inner) {
                tracing::warn!(
                    generation,
                    timeout_ms = connect_timeout.as_millis() as u64,
                    "Connection attempt timed out"
                );
                manager.handle_close(generation, DisconnectReason::ConnectTimeout(connect_timeout));
            }
            return;
        }
    };

    let Some(manager) = ConnectionManager::upgrade(&inner) else {
        return;
    };
    if !manager.handle_open(generation, outbound) {
        return;
    }
    drop(manager);

    let reason = loop {
        let Some(event) = inbound.recv().await else {
            break DisconnectReason::PeerClosed {
                code: None,
                reason: String::new(),
            };
        };
        let Some(manager) = ConnectionManager::upgrade(&inner) else {
            return;
        };

        match event {
            TransportEvent::Frame(text) => manager.handle_frame(generation, &text),
            TransportEvent::Error(message) => {
                manager.handle_error(generation, message.clone());
                break DisconnectReason::TransportError(message);
            }
            TransportEvent::Closed { code, reason } => {
                break DisconnectReason::PeerClosed { code, reason };
            }
        }
    };

    if let Some(manager) = ConnectionManager::upgrade(&inner) {
        manager.handle_close(generation, reason);
    }
}
