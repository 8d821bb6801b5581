//! Delivery IDs and tracing spans
//!
//! Every handled event gets a delivery ID so that the "Event received" line and the
//! delivery outcome line can be tied together in the diagnostic log.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;
use tracing::Span;

/// Global counter for generating sequential delivery IDs
static DELIVERY_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Identifies one delivery from capture to outcome
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeliveryId(String);

impl DeliveryId {
    /// Generate a new delivery ID using timestamp and counter
    pub fn new() -> Self {
        let timestamp = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        let counter = DELIVERY_COUNTER.fetch_add(1, Ordering::SeqCst);

        // Format: timestamp-counter for readability and uniqueness
        DeliveryId(format!("{}-{}", timestamp, counter))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for DeliveryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DeliveryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Span wrapping one delivery task
pub fn delivery_span(delivery_id: &DeliveryId, event_type: &str) -> Span {
    tracing::info_span!(
        "delivery",
        delivery_id = %delivery_id,
        event_type = event_type,
        component = "snap2http"
    )
}
