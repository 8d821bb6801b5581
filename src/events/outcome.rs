//! Result of a single delivery attempt
//!
//! An outcome is only ever logged. Nothing feeds it back into the gateway or the host.

use crate::core::{ForwarderError, ForwarderResult};
use std::fmt;
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The endpoint answered with a 2xx status
    Success { status: u16, body: String },
    /// The endpoint answered with any other status
    Failure { status: u16, body: String },
    /// No response: connection, DNS, TLS or timeout failure
    TransportError { cause: String },
}

impl DeliveryOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DeliveryOutcome::Success { .. })
    }

    /// Describe a transport error with its full source chain
    pub fn transport(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut cause = err.to_string();
        let mut source = err.source();
        while let Some(inner) = source {
            cause.push_str(": ");
            cause.push_str(&inner.to_string());
            source = inner.source();
        }
        DeliveryOutcome::TransportError { cause }
    }

    /// One-line diagnostic text for this outcome
    pub fn summary(&self, event_name: &str) -> String {
        match self {
            DeliveryOutcome::Success { status, body } => format!(
                "Successfully sent {} event (status {}). Response: {}",
                event_name, status, body
            ),
            DeliveryOutcome::Failure { status, body } => format!(
                "Failed to send {} event. Status Code: {}, Error: {}",
                event_name, status, body
            ),
            DeliveryOutcome::TransportError { cause } => {
                format!("Error sending {} event: {}", event_name, cause)
            }
        }
    }

    /// Emit exactly one diagnostic for this outcome
    pub fn log(&self, event_name: &str) {
        let summary = self.summary(event_name);
        match self {
            DeliveryOutcome::Success { status, .. } => {
                info!(event_type = event_name, status = *status, "{}", summary)
            }
            DeliveryOutcome::Failure { status, .. } => {
                warn!(event_type = event_name, status = *status, "{}", summary)
            }
            DeliveryOutcome::TransportError { .. } => {
                error!(event_type = event_name, "{}", summary)
            }
        }
    }

    /// Map the outcome onto the error taxonomy
    pub fn into_result(self) -> ForwarderResult<String> {
        match self {
            DeliveryOutcome::Success { body, .. } => Ok(body),
            DeliveryOutcome::Failure { status, body } => Err(ForwarderError::rejected(status, body)),
            DeliveryOutcome::TransportError { cause } => Err(ForwarderError::transport(cause)),
        }
    }
}

impl fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryOutcome::Success { status, .. } => write!(f, "success ({})", status),
            DeliveryOutcome::Failure { status, .. } => write!(f, "failure ({})", status),
            DeliveryOutcome::TransportError { cause } => write!(f, "transport error ({})", cause),
        }
    }
}
