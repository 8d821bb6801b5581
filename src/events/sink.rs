//! Event sink implementations
//!
//! Provides the HTTP sink used for real deliveries and a STDOUT sink for dry runs.

use crate::core::{DeliverySettings, ForwarderError, ForwarderResult};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub mod http;
pub mod stdout;

pub use http::HttpEventSink;
pub use stdout::StdoutEventSink;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SinkKind {
    #[default]
    Http,
    Stdout,
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkKind::Http => write!(f, "http"),
            SinkKind::Stdout => write!(f, "stdout"),
        }
    }
}

impl FromStr for SinkKind {
    type Err = ForwarderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "http" => Ok(SinkKind::Http),
            "stdout" => Ok(SinkKind::Stdout),
            other => Err(ForwarderError::config(format!(
                "Event sink must be one of: 'http' or 'stdout', got '{}'",
                other
            ))),
        }
    }
}

/// Create an event sink of the given kind
pub fn create_sink(
    kind: SinkKind,
    settings: &DeliverySettings,
) -> ForwarderResult<Arc<dyn super::EventSink>> {
    match kind {
        SinkKind::Http => Ok(Arc::new(HttpEventSink::new(settings)?)),
        SinkKind::Stdout => Ok(Arc::new(StdoutEventSink::new())),
    }
}
