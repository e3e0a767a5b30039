//! Consumer adapter

mod adapter;

pub use adapter::Consumer;
