//! Configuration management for the event forwarder
//!
//! Two kinds of configuration live here:
//! - [`ForwarderConfig`], the persisted endpoint URL and API key pair
//! - [`DeliverySettings`] and [`LoggingConfig`], runtime bounds read from the environment
//!   with sensible defaults

use super::{ForwarderError, ForwarderResult};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Endpoint used when no configuration has been saved yet
pub const DEFAULT_ENDPOINT_URL: &str =
    "https://npsbvriuvfksuvnalrke.supabase.co/functions/v1/timesnapper-events";

/// Endpoint URL and credential used for deliveries
///
/// Deliveries never hold a live reference to this value; each one takes its own
/// snapshot when the event is handled.
#[derive(Clone, PartialEq, Eq)]
pub struct ForwarderConfig {
    pub endpoint_url: String,
    pub api_key: String,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            endpoint_url: DEFAULT_ENDPOINT_URL.to_string(),
            api_key: String::new(),
        }
    }
}

impl fmt::Debug for ForwarderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForwarderConfig")
            .field("endpoint_url", &self.endpoint_url)
            .field("api_key", &self.redacted_api_key())
            .finish()
    }
}

impl ForwarderConfig {
    pub fn new<U: Into<String>, K: Into<String>>(endpoint_url: U, api_key: K) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Validate the endpoint URL before it is persisted or used
    pub fn validate(&self) -> ForwarderResult<()> {
        let url = self.endpoint_url.trim();
        if url.is_empty() {
            return Err(ForwarderError::config("Endpoint URL cannot be empty"));
        }

        if self.endpoint_url.contains(['\r', '\n']) {
            return Err(ForwarderError::config(
                "Endpoint URL cannot contain line breaks",
            ));
        }

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ForwarderError::config(
                "Endpoint URL must start with http:// or https://",
            ));
        }

        reqwest::Url::parse(url)
            .map_err(|e| ForwarderError::config(format!("Invalid endpoint URL {:?}: {}", url, e)))?;

        if self.api_key.contains(['\r', '\n']) {
            return Err(ForwarderError::config(
                "API key cannot contain line breaks",
            ));
        }

        Ok(())
    }

    /// Bearer credential, if one is configured
    pub fn bearer_token(&self) -> Option<&str> {
        let key = self.api_key.trim();
        if key.is_empty() { None } else { Some(key) }
    }

    /// API key with all but the last four characters masked
    pub fn redacted_api_key(&self) -> String {
        let chars: Vec<char> = self.api_key.chars().collect();
        match chars.len() {
            0 => "<none>".to_string(),
            n if n <= 4 => "*".repeat(n),
            n => {
                let tail: String = chars[n - 4..].iter().collect();
                format!("{}{}", "*".repeat(n - 4), tail)
            }
        }
    }
}

/// Bounds applied to every delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliverySettings {
    /// Total time allowed for one POST, including reading the response
    pub request_timeout: Duration,
    /// Time allowed to establish the connection
    pub connect_timeout: Duration,
    /// Maximum number of deliveries in flight at once; extra events are dropped
    pub max_in_flight: usize,
    /// How long shutdown waits for in-flight deliveries
    pub shutdown_grace: Duration,
}

impl Default for DeliverySettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            max_in_flight: 32,
            shutdown_grace: Duration::from_secs(5),
        }
    }
}

impl DeliverySettings {
    /// Load delivery settings from environment variables
    ///
    /// # Environment Variables
    ///
    /// Optional (with defaults):
    /// - `SNAP2HTTP_REQUEST_TIMEOUT_SECS`: per-request timeout (default: 10)
    /// - `SNAP2HTTP_CONNECT_TIMEOUT_SECS`: connect timeout (default: 5)
    /// - `SNAP2HTTP_MAX_IN_FLIGHT`: concurrent delivery bound (default: 32)
    /// - `SNAP2HTTP_SHUTDOWN_GRACE_SECS`: shutdown grace period (default: 5)
    pub fn from_env() -> ForwarderResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> ForwarderResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let request_timeout = parse_positive(&lookup, "SNAP2HTTP_REQUEST_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);
        let connect_timeout = parse_positive(&lookup, "SNAP2HTTP_CONNECT_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.connect_timeout);
        let max_in_flight = parse_positive(&lookup, "SNAP2HTTP_MAX_IN_FLIGHT")?
            .map(|n| n as usize)
            .unwrap_or(defaults.max_in_flight);
        let shutdown_grace = parse_positive(&lookup, "SNAP2HTTP_SHUTDOWN_GRACE_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.shutdown_grace);

        Ok(Self {
            request_timeout,
            connect_timeout,
            max_in_flight,
            shutdown_grace,
        })
    }
}

fn parse_positive<F>(lookup: &F, key: &str) -> ForwarderResult<Option<u64>>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };

    match raw.trim().parse::<u64>() {
        Ok(0) => Err(ForwarderError::config(format!("{} must be greater than zero", key))),
        Ok(n) => Ok(Some(n)),
        Err(_) => Err(ForwarderError::config(format!(
            "{} must be a positive integer, got {:?}",
            key, raw
        ))),
    }
}

/// Diagnostic logging configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set
    pub level: String,
    /// Append-only diagnostic log file, if any
    pub log_file: Option<PathBuf>,
    /// Emit JSON lines on stderr instead of human-readable text
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_file: None,
            json: false,
        }
    }
}

impl LoggingConfig {
    /// Load logging configuration from environment variables
    ///
    /// - `LOG_FORMAT`: `json` for JSON lines, anything else for text
    /// - `SNAP2HTTP_LOG_FILE`: path of the diagnostic log file
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let json = lookup("LOG_FORMAT")
            .map(|v| v.trim().eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        let log_file = lookup("SNAP2HTTP_LOG_FILE")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Self {
            json,
            log_file,
            ..Self::default()
        }
    }

    /// Use the given diagnostic log file unless one is already configured
    pub fn with_default_log_file(mut self, path: PathBuf) -> Self {
        if self.log_file.is_none() {
            self.log_file = Some(path);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ForwarderConfig::default();
        assert_eq!(config.endpoint_url, DEFAULT_ENDPOINT_URL);
        assert_eq!(config.api_key, "");
        assert!(config.bearer_token().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_urls() {
        let err = ForwarderConfig::new("", "k").validate().unwrap_err();
        assert!(err.to_string().contains("cannot be empty"));

        let err = ForwarderConfig::new("ftp://example.com", "k")
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("http://"));

        let err = ForwarderConfig::new("https://example.com", "a\nb")
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("line breaks"));

        let err = ForwarderConfig::new("https://", "k").validate().unwrap_err();
        assert!(err.to_string().contains("Invalid endpoint URL"));
    }

    #[test]
    fn test_validate_rejects_line_breaks_in_url() {
        for url in [
            "https://a.example/x\nApiKey=injected",
            "https://a.example/x\r\nSupabaseUrl=https://other",
            "https://a.example/x\r",
        ] {
            let err = ForwarderConfig::new(url, "k").validate().unwrap_err();
            assert!(err.to_string().contains("line breaks"), "{:?} accepted", url);
        }
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = ForwarderConfig::new("https://example.com", "supersecretkey");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("supersecretkey"));
        assert!(debug.contains("tkey"));
        assert_eq!(ForwarderConfig::default().redacted_api_key(), "<none>");
        assert_eq!(ForwarderConfig::new("https://x", "abc").redacted_api_key(), "***");
    }

    #[test]
    fn test_bearer_token_ignores_whitespace_only_key() {
        let config = ForwarderConfig::new("https://example.com", "   ");
        assert!(config.bearer_token().is_none());

        let config = ForwarderConfig::new("https://example.com", " abc ");
        assert_eq!(config.bearer_token(), Some("abc"));
    }

    #[test]
    fn test_delivery_settings_defaults() {
        let settings = DeliverySettings::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(settings, DeliverySettings::default());
        assert_eq!(settings.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_delivery_settings_overrides() {
        let settings = DeliverySettings::from_lookup(lookup_from(&[
            ("SNAP2HTTP_REQUEST_TIMEOUT_SECS", "3"),
            ("SNAP2HTTP_MAX_IN_FLIGHT", "4"),
        ]))
        .unwrap();
        assert_eq!(settings.request_timeout, Duration::from_secs(3));
        assert_eq!(settings.max_in_flight, 4);
        assert_eq!(settings.connect_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_delivery_settings_reject_zero_and_garbage() {
        let err = DeliverySettings::from_lookup(lookup_from(&[("SNAP2HTTP_MAX_IN_FLIGHT", "0")]))
            .unwrap_err();
        assert!(err.to_string().contains("greater than zero"));

        let err = DeliverySettings::from_lookup(lookup_from(&[(
            "SNAP2HTTP_SHUTDOWN_GRACE_SECS",
            "soon",
        )]))
        .unwrap_err();
        assert!(err.to_string().contains("SNAP2HTTP_SHUTDOWN_GRACE_SECS"));
    }

    #[test]
    fn test_logging_config_from_lookup() {
        let config = LoggingConfig::from_lookup(lookup_from(&[
            ("LOG_FORMAT", "JSON"),
            ("SNAP2HTTP_LOG_FILE", "/tmp/snap.log"),
        ]));
        assert!(config.json);
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/snap.log")));

        let config = LoggingConfig::from_lookup(lookup_from(&[]))
            .with_default_log_file(PathBuf::from("/var/log/x.log"));
        assert!(!config.json);
        assert_eq!(config.log_file, Some(PathBuf::from("/var/log/x.log")));
    }
}
