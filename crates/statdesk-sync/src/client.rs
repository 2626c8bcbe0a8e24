//! # Remote Sync Client
//!
//! Protocol adapter for the external statistics collection service.
//!
//! ## Endpoints
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  {base}/statistics_collector                                            │
//! │                                                                         │
//! │  POST   /                           snapshot JSON → 200 "\"<uuid>\""    │
//! │                                                 → 409 conflict text     │
//! │  DELETE /{id}                       always 200, response ignored        │
//! │  GET    /{id}/config                statistics payload for export       │
//! │  POST   /{id}/send_emails/{type}    status passed through               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Retry Policy
//! Transport failures (connect errors, timeouts) are retried with
//! exponential backoff up to `max_attempts`. Any HTTP status is an answer
//! and goes straight back to the caller.

use async_trait::async_trait;
use backoff::backoff::Backoff;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{RequestBuilder, Response, StatusCode};
use statdesk_core::{CollectorSnapshot, StatisticsPayload};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::RemoteConfig;
use crate::error::{SyncError, SyncResult};

static CONFLICT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^Conflict: statistics collector with name .+ and client .+ with id ([\w-]+) already exists",
    )
    .expect("CONFLICT_PATTERN should compile - this is a bug")
});

// =============================================================================
// Outcomes
// =============================================================================

/// Interpreted answer to a create request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The mirror exists under this identifier.
    Created(Uuid),

    /// A mirror with the same name and client already exists.
    /// `existing_id` is `None` when the message could not be parsed.
    Conflict {
        existing_id: Option<Uuid>,
        message: String,
    },

    /// Any other status, uninterpreted.
    Rejected { status: u16, body: String },
}

// =============================================================================
// Remote Trait
// =============================================================================

/// Operations the orchestrator needs from the statistics service.
#[async_trait]
pub trait RemoteStatistics: Send + Sync {
    /// Submits a full collector snapshot.
    async fn create(&self, snapshot: &CollectorSnapshot) -> SyncResult<CreateOutcome>;

    /// Deletes a mirror. The service reports success whether or not the
    /// identifier existed, so only transport failures surface.
    async fn delete(&self, external_id: Uuid) -> SyncResult<()>;

    /// Reads collected statistics. A non-success status is
    /// [`SyncError::Upstream`].
    async fn read_config(&self, external_id: Uuid) -> SyncResult<StatisticsPayload>;

    /// Triggers reminder e-mails; returns the service's status code.
    async fn send_reminder(&self, external_id: Uuid, reminder_type: &str) -> SyncResult<u16>;
}

// =============================================================================
// HTTP Implementation
// =============================================================================

/// [`RemoteStatistics`] over HTTP with reqwest.
#[derive(Debug, Clone)]
pub struct HttpRemoteClient {
    http: reqwest::Client,
    config: RemoteConfig,
}

impl HttpRemoteClient {
    /// Builds a client from explicit configuration.
    pub fn new(config: RemoteConfig) -> SyncResult<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for (name, value) in &config.headers {
            let header = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| SyncError::InvalidConfig(format!("header name '{name}': {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| SyncError::InvalidConfig(format!("header '{name}' value: {e}")))?;
            headers.insert(header, value);
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| SyncError::InvalidConfig(e.to_string()))?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    fn collector_url(&self, external_id: Uuid) -> String {
        format!("{}/{}", self.config.collectors_url(), external_id)
    }

    /// Sends a request, retrying transport failures.
    async fn send(&self, builder: RequestBuilder) -> SyncResult<Response> {
        let attempts = self.config.max_attempts.max(1);
        let mut backoff = self.config.backoff_policy();
        let mut attempt = 1;

        loop {
            let request = builder.try_clone().ok_or_else(|| {
                SyncError::Internal("request body cannot be cloned for retry".into())
            })?;

            let err = match request.send().await {
                Ok(response) => {
                    debug!(attempt, status = %response.status(), url = %response.url(), "Statistics service responded");
                    return Ok(response);
                }
                Err(err) => SyncError::from(err).with_timeout(self.config.timeout_secs),
            };

            if attempt >= attempts || !err.is_retryable() {
                return Err(err);
            }

            let delay = backoff
                .next_backoff()
                .unwrap_or_else(|| self.config.backoff_policy().max_interval);
            warn!(
                attempt,
                max_attempts = attempts,
                error = %err,
                delay_ms = delay.as_millis() as u64,
                "Statistics service unreachable, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

#[async_trait]
impl RemoteStatistics for HttpRemoteClient {
    async fn create(&self, snapshot: &CollectorSnapshot) -> SyncResult<CreateOutcome> {
        let body = serde_json::to_vec(snapshot)
            .map_err(|e| SyncError::Internal(format!("snapshot serialization: {e}")))?;

        let response = self
            .send(self.http.post(self.config.collectors_url()).body(body))
            .await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            return parse_created_id(&text).map(CreateOutcome::Created);
        }

        if status == StatusCode::CONFLICT {
            return Ok(CreateOutcome::Conflict {
                existing_id: parse_conflict(&text),
                message: text,
            });
        }

        Ok(CreateOutcome::Rejected {
            status: status.as_u16(),
            body: text,
        })
    }

    async fn delete(&self, external_id: Uuid) -> SyncResult<()> {
        let response = self
            .send(self.http.delete(self.collector_url(external_id)))
            .await?;
        debug!(%external_id, status = %response.status(), "Deleted remote mirror");
        Ok(())
    }

    async fn read_config(&self, external_id: Uuid) -> SyncResult<StatisticsPayload> {
        let url = format!("{}/config", self.collector_url(external_id));
        let response = self.send(self.http.get(url)).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Upstream {
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn send_reminder(&self, external_id: Uuid, reminder_type: &str) -> SyncResult<u16> {
        let url = format!(
            "{}/send_emails/{}",
            self.collector_url(external_id),
            urlencoding::encode(reminder_type)
        );
        let response = self.send(self.http.post(url)).await?;
        Ok(response.status().as_u16())
    }
}

// =============================================================================
// Response Parsing
// =============================================================================

/// Parses the create response body, a JSON string holding the new id.
pub fn parse_created_id(body: &str) -> SyncResult<Uuid> {
    let raw = body.trim().trim_matches('"');
    Uuid::parse_str(raw)
        .map_err(|e| SyncError::InvalidResponse(format!("expected collector id, got '{body}': {e}")))
}

/// Extracts the existing collector id from a conflict message.
pub fn parse_conflict(body: &str) -> Option<Uuid> {
    let text = body.trim().trim_matches('"');
    CONFLICT_PATTERN
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|id| Uuid::parse_str(id.as_str()).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use statdesk_core::Periodicity;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn snapshot() -> CollectorSnapshot {
        CollectorSnapshot {
            name: "Spring".into(),
            client: "Acme".into(),
            periodicity: Periodicity::Daily,
            weekday: None,
            placement_types: vec![],
            periods: vec![],
        }
    }

    fn client_for(server: &MockServer) -> HttpRemoteClient {
        let mut config = RemoteConfig::new(format!("{}/", server.uri()));
        config.headers.insert("Authorization".into(), "Token abc".into());
        config.initial_backoff_ms = 1;
        HttpRemoteClient::new(config).unwrap()
    }

    #[test]
    fn test_parse_conflict_message() {
        let id = Uuid::new_v4();
        let message = format!(
            "Conflict: statistics collector with name Spring and client Acme with id {id} already exists"
        );
        assert_eq!(parse_conflict(&message), Some(id));
        assert_eq!(parse_conflict(&format!("\"{message}\"")), Some(id));
        assert_eq!(parse_conflict("Conflict: something else"), None);
    }

    #[test]
    fn test_parse_created_id_strips_quotes() {
        let id = Uuid::new_v4();
        assert_eq!(parse_created_id(&format!("\"{id}\"\n")).unwrap(), id);
        assert!(matches!(
            parse_created_id("oops"),
            Err(SyncError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_new_rejects_bad_header() {
        let mut config = RemoteConfig::default();
        config.headers.insert("bad header".into(), "x".into());
        assert!(matches!(
            HttpRemoteClient::new(config),
            Err(SyncError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_create_success() {
        let server = MockServer::start().await;
        let id = Uuid::new_v4();

        Mock::given(method("POST"))
            .and(path("/statistics_collector"))
            .and(header("Authorization", "Token abc"))
            .and(body_partial_json(serde_json::json!({
                "name": "Spring",
                "client": "Acme",
                "periodicity": "daily",
                "weekday": ""
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!("\"{id}\"")))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = client_for(&server).create(&snapshot()).await.unwrap();
        assert_eq!(outcome, CreateOutcome::Created(id));
    }

    #[tokio::test]
    async fn test_create_conflict() {
        let server = MockServer::start().await;
        let existing = Uuid::new_v4();

        Mock::given(method("POST"))
            .and(path("/statistics_collector"))
            .respond_with(ResponseTemplate::new(409).set_body_string(format!(
                "Conflict: statistics collector with name Spring and client Acme with id {existing} already exists"
            )))
            .mount(&server)
            .await;

        let outcome = client_for(&server).create(&snapshot()).await.unwrap();
        assert!(matches!(
            outcome,
            CreateOutcome::Conflict { existing_id: Some(id), .. } if id == existing
        ));
    }

    #[tokio::test]
    async fn test_create_rejected_is_not_retried() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/statistics_collector"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = client_for(&server).create(&snapshot()).await.unwrap();
        assert_eq!(
            outcome,
            CreateOutcome::Rejected {
                status: 503,
                body: "maintenance".into()
            }
        );
    }

    #[tokio::test]
    async fn test_delete_ignores_status() {
        let server = MockServer::start().await;
        let id = Uuid::new_v4();

        Mock::given(method("DELETE"))
            .and(path(format!("/statistics_collector/{id}")))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server).delete(id).await.unwrap();
    }

    #[tokio::test]
    async fn test_read_config_payload_and_upstream_status() {
        let server = MockServer::start().await;
        let linked = Uuid::new_v4();
        let broken = Uuid::new_v4();

        Mock::given(method("GET"))
            .and(path(format!("/statistics_collector/{linked}/config")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "Spring",
                "client": "Acme",
                "periods": [{"name": "2024.01.01", "startDate": "2024.01.01", "endDate": "2024.01.01"}],
                "placementTypes": []
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path(format!("/statistics_collector/{broken}/config")))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let payload = client.read_config(linked).await.unwrap();
        assert_eq!(payload.client.as_deref(), Some("Acme"));
        assert_eq!(payload.periods.len(), 1);

        let err = client.read_config(broken).await.unwrap_err();
        assert!(matches!(err, SyncError::Upstream { status: 502 }));
    }

    #[tokio::test]
    async fn test_send_reminder_passes_status() {
        let server = MockServer::start().await;
        let id = Uuid::new_v4();

        Mock::given(method("POST"))
            .and(path(format!("/statistics_collector/{id}/send_emails/first")))
            .respond_with(ResponseTemplate::new(202))
            .mount(&server)
            .await;

        let status = client_for(&server).send_reminder(id, "first").await.unwrap();
        assert_eq!(status, 202);
    }

    #[tokio::test]
    async fn test_transport_failure_retries_then_fails() {
        // Bind and drop a listener so the port refuses connections.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut config = RemoteConfig::new(format!("http://{addr}/"));
        config.initial_backoff_ms = 1;
        config.max_attempts = 2;
        let client = HttpRemoteClient::new(config).unwrap();

        let err = client.delete(Uuid::new_v4()).await.unwrap_err();
        assert!(err.is_transport_error());
    }
}
