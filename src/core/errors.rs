//! Error types for the event forwarder
//! Provides structured error handling using thiserror. None of these errors are allowed
//! to cross the gateway boundary back into the host.

use thiserror::Error;

/// Main error type for the event forwarder
#[derive(Error, Debug)]
pub enum ForwarderError {
    /// Configuration related errors (unreadable store, invalid endpoint, bad env override)
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Event data could not be rendered or the record could not be encoded
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Network, TLS or timeout failure while talking to the endpoint
    #[error("Transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The endpoint answered with a non-2xx status
    #[error("Remote rejected event with status {status}: {body}")]
    RemoteRejection { status: u16, body: String },

    /// Local IO errors
    #[error("IO error")]
    NetworkIO(#[from] std::io::Error),
}

/// Result type alias for convenience
pub type ForwarderResult<T> = std::result::Result<T, ForwarderError>;

impl ForwarderError {
    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization<S: Into<String>>(message: S) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create a transport error without an underlying source
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// Create a remote rejection error
    pub fn rejected<S: Into<String>>(status: u16, body: S) -> Self {
        Self::RemoteRejection {
            status,
            body: body.into(),
        }
    }
}

impl From<reqwest::Error> for ForwarderError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_json::Error> for ForwarderError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}
