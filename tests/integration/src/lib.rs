//! Integration test utilities for the tether client
//!
//! This crate provides an in-process WebSocket server and subscriber
//! fixtures for end-to-end tests of the real transport.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
