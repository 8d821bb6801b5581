//! STDOUT event sink implementation
//!
//! Writes the exact JSON body that would have been posted, one line per event. Used for
//! dry runs. Reports a synthetic 200 so dry runs log like successful deliveries; a
//! failed write to stdout is the sink's transport error.

use async_trait::async_trait;
use std::io::{self, Write};

use super::super::{DeliveryOutcome, EventRecord, EventSink};
use crate::core::ForwarderConfig;

/// Event sink that writes records to standard output
pub struct StdoutEventSink {}

impl StdoutEventSink {
    /// Create a new STDOUT event sink
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for StdoutEventSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventSink for StdoutEventSink {
    fn sink_type(&self) -> &'static str {
        "stdout"
    }

    async fn send_event(&self, record: &EventRecord, _config: &ForwarderConfig) -> DeliveryOutcome {
        let line = record.encode();
        let mut stdout = io::stdout().lock();
        match writeln!(stdout, "{}", line).and_then(|_| stdout.flush()) {
            Ok(()) => DeliveryOutcome::Success {
                status: 200,
                body: String::new(),
            },
            Err(e) => DeliveryOutcome::transport(&e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{build_record, EventData};
    use chrono::Utc;

    #[tokio::test]
    async fn test_stdout_sink_send_event() {
        let sink = StdoutEventSink::new();
        let record = build_record("FlagSaved", &EventData::from("red"), Utc::now());

        let outcome = sink.send_event(&record, &ForwarderConfig::default()).await;
        assert!(outcome.is_success());
        assert_eq!(sink.sink_type(), "stdout");
    }
}
