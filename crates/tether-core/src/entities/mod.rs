//! Entities - the messages that travel over the socket

mod envelope;

pub use envelope::{Envelope, HEARTBEAT, START_STREAM, STOP_STREAM};
