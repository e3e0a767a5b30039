//! # tether-core
//!
//! Domain layer for the shared socket client: the wire envelope, connection
//! state, retry policy, and the authentication port.
//! This crate has zero dependencies on infrastructure (runtime, transport, etc.).

pub mod entities;
pub mod error;
pub mod events;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::Envelope;
pub use error::ConnectionError;
pub use events::DisconnectReason;
pub use traits::{AuthProvider, AuthSnapshot};
pub use value_objects::{
    BackoffPolicy, BearerToken, ConnectionSnapshot, ConnectionState, TokenShapeError,
};
