//! Ports implemented outside the domain layer

mod auth;

pub use auth::{AuthProvider, AuthSnapshot};
