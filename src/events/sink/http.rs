use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::debug;

use super::super::{DeliveryOutcome, EventRecord, EventSink};
use crate::core::{DeliverySettings, ForwarderConfig, ForwarderResult};

/// HTTP event sink for posting records to the ingestion endpoint
///
/// The client (and its connection pool) is shared by every delivery. Each record is
/// posted exactly once: there is no retry and no backoff.
#[derive(Clone)]
pub struct HttpEventSink {
    pub(crate) http_client: Client,
}

impl HttpEventSink {
    /// Create a new HTTP event sink with bounded request and connect timeouts
    pub fn new(settings: &DeliverySettings) -> ForwarderResult<Self> {
        let http_client = Client::builder()
            .timeout(settings.request_timeout)
            .connect_timeout(settings.connect_timeout)
            .user_agent(concat!("snap2http/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http_client })
    }
}

#[async_trait]
impl EventSink for HttpEventSink {
    fn sink_type(&self) -> &'static str {
        "http"
    }

    /// Post one record to the endpoint from the config snapshot
    async fn send_event(&self, record: &EventRecord, config: &ForwarderConfig) -> DeliveryOutcome {
        let mut request = self
            .http_client
            .post(&config.endpoint_url)
            .header(CONTENT_TYPE, "application/json")
            .body(record.encode());
        if let Some(token) = config.bearer_token() {
            request = request.bearer_auth(token);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => return DeliveryOutcome::transport(&e),
        };

        let status = response.status();
        // A missing or unreadable body is not an error in itself
        let body = response.text().await.unwrap_or_else(|e| {
            debug!("Could not read response body: {}", e);
            String::new()
        });

        if status.is_success() {
            DeliveryOutcome::Success {
                status: status.as_u16(),
                body,
            }
        } else {
            DeliveryOutcome::Failure {
                status: status.as_u16(),
                body,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{build_record, EventData};
    use crate::test_support::{refused_url, spawn_server, Reply};
    use chrono::Utc;
    use std::time::{Duration, Instant};

    fn sink_with_timeout(timeout: Duration) -> HttpEventSink {
        let settings = DeliverySettings {
            request_timeout: timeout,
            connect_timeout: timeout,
            ..DeliverySettings::default()
        };
        HttpEventSink::new(&settings).unwrap()
    }

    #[tokio::test]
    async fn test_success_posts_json_with_bearer() {
        let mut server = spawn_server(Reply::Status(200, "{\"ok\":true}")).await;
        let sink = sink_with_timeout(Duration::from_secs(5));
        let config = ForwarderConfig::new(server.url.clone(), "secret-key");
        let record = build_record("FlagSaved", &EventData::from("red"), Utc::now());

        let outcome = sink.send_event(&record, &config).await;
        assert_eq!(
            outcome,
            DeliveryOutcome::Success {
                status: 200,
                body: "{\"ok\":true}".to_string()
            }
        );

        let request = server.next_request(Duration::from_secs(1)).await.unwrap();
        assert!(request.head.starts_with("POST /ingest"));
        assert_eq!(request.header("authorization").as_deref(), Some("Bearer secret-key"));
        assert_eq!(request.header("content-type").as_deref(), Some("application/json"));

        let body = request.json();
        assert_eq!(body["eventType"], "FlagSaved");
        assert_eq!(body["data"], "red");
        assert_eq!(body["reportType"], "flags");
        assert_eq!(body["timestamp"], record.timestamp_rfc3339());
    }

    #[tokio::test]
    async fn test_no_authorization_header_without_api_key() {
        let mut server = spawn_server(Reply::Status(204, "")).await;
        let sink = sink_with_timeout(Duration::from_secs(5));
        let config = ForwarderConfig::new(server.url.clone(), "");
        let record = build_record("SnapshotSaved", &EventData::Absent, Utc::now());

        let outcome = sink.send_event(&record, &config).await;
        assert!(outcome.is_success());

        let request = server.next_request(Duration::from_secs(1)).await.unwrap();
        assert!(request.header("authorization").is_none());
        assert_eq!(request.json()["data"], "No Data");
        assert_eq!(request.json()["reportType"], "snapshot");
    }

    #[tokio::test]
    async fn test_server_error_is_reported_as_failure() {
        let server = spawn_server(Reply::Status(500, "database down")).await;
        let sink = sink_with_timeout(Duration::from_secs(5));
        let config = ForwarderConfig::new(server.url.clone(), "k");
        let record = build_record("DiskSpaceUsage", &EventData::from("12GB"), Utc::now());

        let outcome = sink.send_event(&record, &config).await;
        assert_eq!(
            outcome,
            DeliveryOutcome::Failure {
                status: 500,
                body: "database down".to_string()
            }
        );
        assert!(outcome.summary("DiskSpaceUsage").contains("500"));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let sink = sink_with_timeout(Duration::from_secs(5));
        let config = ForwarderConfig::new(refused_url().await, "");
        let record = build_record("FlagSaved", &EventData::Absent, Utc::now());

        let outcome = sink.send_event(&record, &config).await;
        assert!(matches!(outcome, DeliveryOutcome::TransportError { .. }));
        assert!(outcome.summary("FlagSaved").starts_with("Error sending FlagSaved event"));
    }

    #[tokio::test]
    async fn test_hanging_endpoint_times_out() {
        let server = spawn_server(Reply::Hang).await;
        let sink = sink_with_timeout(Duration::from_millis(200));
        let config = ForwarderConfig::new(server.url.clone(), "");
        let record = build_record("ActivityCloud", &EventData::Absent, Utc::now());

        let started = Instant::now();
        let outcome = sink.send_event(&record, &config).await;
        assert!(matches!(outcome, DeliveryOutcome::TransportError { .. }));
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_invalid_url_is_transport_error() {
        let sink = sink_with_timeout(Duration::from_secs(1));
        let config = ForwarderConfig::new("not a url", "");
        let record = build_record("FlagSaved", &EventData::Absent, Utc::now());

        let outcome = sink.send_event(&record, &config).await;
        assert!(matches!(outcome, DeliveryOutcome::TransportError { .. }));
    }
}
