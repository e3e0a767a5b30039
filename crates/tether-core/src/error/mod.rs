//! Domain errors

mod connection_error;

pub use connection_error::ConnectionError;
