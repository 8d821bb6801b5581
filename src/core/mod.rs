//! Core module containing configuration, the config store and error types
//!
//! This module provides the basic building blocks shared by the gateway, the sinks
//! and the command line.

pub mod config;
pub mod errors;
pub mod store;

// Re-export for convenience
pub use config::{DeliverySettings, ForwarderConfig, LoggingConfig};
pub use errors::{ForwarderError, ForwarderResult};
pub use store::ConfigStore;
