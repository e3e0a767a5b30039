//! Consumer adapter
//!
//! Ties one subscriber's registration to the authentication state: a
//! signed-in consumer is subscribed and keeps the shared connection up, a
//! signed-out one holds no subscription. The subscription is an RAII guard,
//! so it is released on every exit path, unwinding included.

use crate::connection::ConnectionManager;
use crate::subscription::{Subscriber, Subscription};
use serde::Serialize;
use std::sync::Arc;
use tether_core::{AuthProvider, ConnectionSnapshot, ConnectionState};

/// One consumer of the shared connection
pub struct Consumer {
    manager: ConnectionManager,
    auth: Arc<dyn AuthProvider>,
    subscriber: Arc<dyn Subscriber>,
    subscription: Option<Subscription>,
    authenticated: bool,
}

impl Consumer {
    /// Attach `subscriber` to the shared connection
    ///
    /// If a user is signed in the subscriber is registered and the manager
    /// is asked to connect; otherwise nothing happens until
    /// [`refresh_auth`](Self::refresh_auth) sees a sign-in.
    pub fn mount(
        manager: &ConnectionManager,
        auth: Arc<dyn AuthProvider>,
        subscriber: Arc<dyn Subscriber>,
    ) -> Self {
        let mut consumer = Self {
            manager: manager.clone(),
            auth,
            subscriber,
            subscription: None,
            authenticated: false,
        };
        consumer.refresh_auth();
        consumer
    }

    /// React to a change in authentication state
    pub fn refresh_auth(&mut self) {
        let authenticated = self.auth.snapshot().has_identity();

        match (self.authenticated, authenticated) {
            (false, true) => {
                tracing::debug!("Consumer signed in; subscribing");
                self.subscription = Some(self.manager.subscribe(self.subscriber.clone()));
                if !self.manager.state().is_active() {
                    self.manager.connect();
                }
            }
            (true, false) => {
                tracing::debug!("Consumer signed out; unsubscribing");
                self.subscription = None;
                if self.manager.state() != ConnectionState::Idle {
                    self.manager.disconnect();
                }
            }
            _ => {}
        }

        self.authenticated = authenticated;
    }

    /// Check whether this consumer currently receives fan-out
    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// Get the connection status
    #[must_use]
    pub fn state(&self) -> ConnectionSnapshot {
        self.manager.connection_state()
    }

    /// Send a message over the shared connection
    pub fn send_message<T: Serialize + ?Sized>(&self, message: &T) -> bool {
        self.manager.send_message(message)
    }

    pub fn connect(&self) {
        self.manager.connect();
    }

    pub fn disconnect(&self) {
        self.manager.disconnect();
    }

    /// Detach from the shared connection
    ///
    /// Same as dropping the consumer. The connection itself stays up for
    /// other consumers.
    pub fn unmount(mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }
}

impl std::fmt::Debug for Consumer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Consumer")
            .field("subscription", &self.subscription)
            .field("authenticated", &self.authenticated)
            .finish_non_exhaustive()
    }
}
