//! Value objects - immutable types that represent domain concepts

mod backoff;
mod bearer_token;
mod connection_state;

pub use backoff::BackoffPolicy;
pub use bearer_token::{BearerToken, TokenShapeError};
pub use connection_state::{ConnectionSnapshot, ConnectionState};
