//! snap2http - forwards desktop activity tracker events to an HTTPS ingestion endpoint
//!
//! The host fires named events; each one is turned into a small JSON record and posted
//! once, in the background, without ever blocking or failing the host.

pub mod core;
pub mod events;
pub mod gateway;
pub mod logging;
pub mod plugin;
pub mod tracing_context;

#[cfg(test)]
mod test_support;

// Re-export for convenience
pub use crate::core::{ConfigStore, DeliverySettings, ForwarderConfig, ForwarderError, ForwarderResult};
pub use events::{DeliveryOutcome, EventData, EventRecord, EventSink, ReportType};
pub use gateway::{EventGateway, ShutdownReport};
pub use plugin::{HostPlugin, TimeLoggerPlugin};
