//! Connection lifecycle events

mod disconnect;

pub use disconnect::DisconnectReason;
