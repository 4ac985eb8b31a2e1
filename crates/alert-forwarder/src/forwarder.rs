//! Alert Sink HTTP Client

use std::fmt;
use std::time::Duration;

use alerting::AlertBatch;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{DeliveryError, ForwarderError};
use crate::AlertSink;

/// Production alerts ingestion endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.bigpanda.io/data/v2/alerts";

/// Default delivery timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Forwarder configuration
#[derive(Clone)]
pub struct ForwarderConfig {
    /// Sink ingestion endpoint
    pub endpoint: String,
    /// Bearer token for the sink API
    pub token: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl ForwarderConfig {
    /// Config for the production endpoint with the default timeout
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            token: token.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl fmt::Debug for ForwarderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForwarderConfig")
            .field("endpoint", &self.endpoint)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// What the sink answered. The status code is reported as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOutcome {
    /// HTTP status code returned by the sink
    pub status: u16,
    /// Raw response body
    pub body: String,
}

impl DeliveryOutcome {
    /// Whether the sink answered with a 2xx status
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Posts alert batches to the sink, one request per batch
#[derive(Clone)]
pub struct AlertForwarder {
    client: reqwest::Client,
    endpoint: Url,
    token: String,
    timeout: Duration,
}

impl AlertForwarder {
    /// Create a new forwarder
    pub fn new(config: ForwarderConfig) -> Result<Self, ForwarderError> {
        let endpoint =
            Url::parse(&config.endpoint).map_err(|source| ForwarderError::InvalidEndpoint {
                url: config.endpoint.clone(),
                source,
            })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ForwarderError::UnsupportedScheme(endpoint.scheme().to_string()));
        }

        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        info!("Creating alert forwarder for {}", endpoint);
        Ok(Self {
            client,
            endpoint,
            token: config.token,
            timeout: config.timeout,
        })
    }

    /// Sink ingestion endpoint
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Serialize a batch and POST it to the sink
    pub async fn forward(&self, batch: &AlertBatch) -> Result<DeliveryOutcome, DeliveryError> {
        let payload = serde_json::to_vec(batch)?;
        debug!(
            "Posting {} alert(s) for host {} to {}",
            batch.alerts.len(),
            batch.host,
            self.endpoint
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .bearer_auth(&self.token)
            .body(payload)
            .send()
            .await
            .map_err(|e| self.classify_error(e))?;

        let status = response.status().as_u16();
        // Any answered status is an outcome, even if the body cannot be read
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!("Failed to read alert sink response body (status {}): {}", status, e);
                String::new()
            }
        };
        let outcome = DeliveryOutcome { status, body };

        if outcome.is_success() {
            info!("Alert sink answered {}: {}", outcome.status, outcome.body);
        } else {
            warn!("Alert sink answered {}: {}", outcome.status, outcome.body);
        }

        Ok(outcome)
    }

    fn classify_error(&self, err: reqwest::Error) -> DeliveryError {
        if err.is_timeout() {
            DeliveryError::Timeout(self.timeout)
        } else {
            DeliveryError::Transport(err)
        }
    }
}

impl fmt::Debug for AlertForwarder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlertForwarder")
            .field("endpoint", &self.endpoint.as_str())
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[async_trait]
impl AlertSink for AlertForwarder {
    async fn forward(&self, batch: &AlertBatch) -> Result<DeliveryOutcome, DeliveryError> {
        AlertForwarder::forward(self, batch).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alerting::{Alert, AlertStatus};
    use axum::{
        body::Bytes,
        extract::State,
        http::{HeaderMap, StatusCode},
        routing::post,
        Router,
    };
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::sync::Mutex;

    type Captured = Arc<Mutex<Vec<(HeaderMap, Bytes)>>>;

    async fn spawn_sink(status: StatusCode, delay: Duration) -> (String, Captured) {
        let captured: Captured = Arc::default();
        let app = Router::new()
            .route(
                "/data/v2/alerts",
                post(
                    move |State(captured): State<Captured>,
                          headers: HeaderMap,
                          body: Bytes| async move {
                        captured.lock().await.push((headers, body));
                        tokio::time::sleep(delay).await;
                        (status, "{\"status\":\"created\"}")
                    },
                ),
            )
            .with_state(captured.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{addr}/data/v2/alerts"), captured)
    }

    /// Sink that sends a status line, then closes before the promised body is complete
    async fn spawn_truncating_sink() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
                if request_complete(&request) {
                    break;
                }
            }
            socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\npartial")
                .await
                .unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{addr}/data/v2/alerts")
    }

    fn request_complete(request: &[u8]) -> bool {
        let text = String::from_utf8_lossy(request);
        let Some(head_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..head_end]
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        request.len() >= head_end + 4 + content_length
    }

    fn forwarder(endpoint: String, timeout: Duration) -> AlertForwarder {
        AlertForwarder::new(ForwarderConfig {
            endpoint,
            token: "secret-token".to_string(),
            timeout,
        })
        .unwrap()
    }

    fn sample_batch() -> AlertBatch {
        let mut batch = AlertBatch::new("key-1", "srv1", "CloudIQ");
        batch.alerts.push(Alert {
            status: AlertStatus::Critical,
            host: "srv1".to_string(),
            timestamp: 1650000000,
            check: "R1".to_string(),
            description: "D1".to_string(),
            cluster: String::new(),
            incident_identifier: "I1".to_string(),
        });
        batch
    }

    #[tokio::test]
    async fn test_posts_batch_with_headers() {
        let (endpoint, captured) = spawn_sink(StatusCode::CREATED, Duration::ZERO).await;
        let forwarder = forwarder(endpoint, Duration::from_secs(5));

        let outcome = forwarder.forward(&sample_batch()).await.unwrap();
        assert_eq!(outcome.status, 201);
        assert!(outcome.is_success());
        assert!(outcome.body.contains("created"));

        let captured = captured.lock().await;
        assert_eq!(captured.len(), 1);
        let (headers, body) = &captured[0];
        assert_eq!(headers["content-type"], "application/json");
        assert_eq!(headers["authorization"], "Bearer secret-token");

        let sent: serde_json::Value = serde_json::from_slice(body).unwrap();
        assert_eq!(sent["app_key"], "key-1");
        assert_eq!(sent["alerts"][0]["status"], "critical");
        assert_eq!(sent["alerts"][0]["incident_identifier"], "I1");
    }

    #[tokio::test]
    async fn test_error_status_is_an_outcome() {
        let (endpoint, _captured) = spawn_sink(StatusCode::UNAUTHORIZED, Duration::ZERO).await;
        let forwarder = forwarder(endpoint, Duration::from_secs(5));

        let outcome = forwarder.forward(&sample_batch()).await.unwrap();
        assert_eq!(outcome.status, 401);
        assert!(!outcome.is_success());
    }

    #[tokio::test]
    async fn test_empty_batch_is_still_sent() {
        let (endpoint, captured) = spawn_sink(StatusCode::OK, Duration::ZERO).await;
        let forwarder = forwarder(endpoint, Duration::from_secs(5));

        forwarder
            .forward(&AlertBatch::new("key-1", "srv1", "CloudIQ"))
            .await
            .unwrap();
        assert_eq!(captured.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_truncated_body_still_an_outcome() {
        let forwarder = forwarder(spawn_truncating_sink().await, Duration::from_secs(5));

        let outcome = forwarder.forward(&sample_batch()).await.unwrap();
        assert_eq!(outcome.status, 200);
        assert!(outcome.body.is_empty());
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let forwarder = forwarder(format!("http://{addr}/alerts"), Duration::from_secs(5));
        let result = forwarder.forward(&sample_batch()).await;
        assert!(matches!(result, Err(DeliveryError::Transport(_))));
    }

    #[tokio::test]
    async fn test_timeout() {
        let (endpoint, _captured) = spawn_sink(StatusCode::OK, Duration::from_secs(3)).await;
        let forwarder = forwarder(endpoint, Duration::from_millis(200));

        let result = forwarder.forward(&sample_batch()).await;
        assert!(matches!(result, Err(DeliveryError::Timeout(_))));
    }

    #[test]
    fn test_rejects_bad_endpoint() {
        let config = ForwarderConfig {
            endpoint: "not a url".to_string(),
            ..ForwarderConfig::new("t")
        };
        assert!(matches!(
            AlertForwarder::new(config),
            Err(ForwarderError::InvalidEndpoint { .. })
        ));

        let config = ForwarderConfig {
            endpoint: "ftp://example.com/alerts".to_string(),
            ..ForwarderConfig::new("t")
        };
        assert!(matches!(
            AlertForwarder::new(config),
            Err(ForwarderError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn test_config_debug_redacts_token() {
        let rendered = format!("{:?}", ForwarderConfig::new("secret-token"));
        assert!(!rendered.contains("secret-token"));
        assert_eq!(ForwarderConfig::new("t").endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_forwarder_debug_redacts_token() {
        let forwarder = forwarder(
            "http://127.0.0.1:9/data/v2/alerts".to_string(),
            Duration::from_secs(1),
        );
        let rendered = format!("{forwarder:?}");
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("<redacted>"));
        assert!(rendered.contains("127.0.0.1:9"));
        assert_eq!(forwarder.endpoint().port(), Some(9));
    }
}
