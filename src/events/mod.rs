//! Event processing module for the forwarder
//!
//! This module contains everything between a host event and the wire: the payload
//! model, the delivery outcome and the sinks that deliver records.

use crate::core::ForwarderConfig;
use async_trait::async_trait;

pub mod outcome;
pub mod payload;
pub mod sink;

// Re-export for convenience
pub use outcome::DeliveryOutcome;
pub use payload::{build_record, EventData, EventRecord, ReportType};
pub use sink::{create_sink, SinkKind};

/// EventSink trait for delivering one record
///
/// Implementations make exactly one attempt and report what happened. The return type
/// is an outcome rather than a `Result` so that no error can escape a delivery.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Sink type identifier used in diagnostics
    fn sink_type(&self) -> &'static str;

    /// Deliver one record using the configuration snapshot taken for it
    async fn send_event(&self, record: &EventRecord, config: &ForwarderConfig) -> DeliveryOutcome;
}
