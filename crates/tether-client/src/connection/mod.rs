//! Shared connection management

mod config;
mod manager;
mod state;

pub use config::{ManagerConfig, DEFAULT_CONNECT_TIMEOUT, DEFAULT_HEARTBEAT_INTERVAL};
pub use manager::ConnectionManager;
