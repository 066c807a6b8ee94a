//! Configuration surface for the strew batching pipeline.

mod config;

pub use config::{BatcherConfig, TimeoutConfig};
