//! # tether-client
//!
//! One shared, self-healing WebSocket connection for many consumers.
//!
//! A [`ConnectionManager`] owns the transport: it resolves the target from
//! the current credentials, dials with a timeout, reconnects with linear
//! backoff, and sends heartbeats while open. Consumers register a
//! [`Subscriber`] and receive every inbound [`Envelope`](tether_core::Envelope)
//! plus connect, disconnect, and error notifications.

mod app;
pub mod auth;
pub mod connection;
pub mod consumer;
pub mod resolver;
pub mod subscription;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use app::run;
pub use auth::StaticAuth;
pub use connection::{ConnectionManager, ManagerConfig};
pub use consumer::Consumer;
pub use resolver::{ConnectionTarget, Deployment, ResolveError, UriResolver};
pub use subscription::{Callbacks, Subscriber, SubscriberId, Subscription, SubscriptionRegistry};
pub use transport::{Connector, LoopbackConnector, WsConnector};
