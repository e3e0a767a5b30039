//! Authentication providers

mod static_auth;

pub use static_auth::StaticAuth;
