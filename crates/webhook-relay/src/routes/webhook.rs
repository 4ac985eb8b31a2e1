//! Health Webhook Route
//!
//! Routes on the `X-ciq-event` header:
//! - `ping` answers `pong!` without looking at the body
//! - `health-issue-change` decodes, maps and forwards the event
//! - anything else is refused with 406

use std::sync::Arc;

use alert_forwarder::DeliveryError;
use alerting::{EventError, HealthEvent};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use metrics::counter;
use thiserror::Error;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::signature::{SignatureError, SIGNATURE_HEADER};
use crate::AppState;

/// Discriminator header naming the webhook event kind
pub const EVENT_HEADER: &str = "x-ciq-event";

/// Body sent back for liveness checks
pub const PONG: &str = "pong!";

/// Webhook event kinds this relay understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Liveness check
    Ping,
    /// Health score or issue list changed
    HealthIssueChange,
}

impl EventKind {
    /// Read the event kind from the request headers
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, WebhookError> {
        match headers.get(EVENT_HEADER).and_then(|v| v.to_str().ok()) {
            Some("ping") => Ok(EventKind::Ping),
            Some("health-issue-change") => Ok(EventKind::HealthIssueChange),
            _ => Err(WebhookError::UnknownEvent),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Ping => "ping",
            EventKind::HealthIssueChange => "health-issue-change",
        }
    }
}

/// Errors answered to the webhook caller
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("unknown or missing x-ciq-event")]
    UnknownEvent,

    #[error("Signature check failed: {0}")]
    Signature(#[from] SignatureError),

    #[error("Failed to decode health event: {0}")]
    Decode(#[from] EventError),

    #[error("Delivery to alert sink failed: {0}")]
    Delivery(#[from] DeliveryError),
}

impl WebhookError {
    fn reason(&self) -> &'static str {
        match self {
            WebhookError::UnknownEvent => "unknown_event",
            WebhookError::Signature(_) => "signature",
            WebhookError::Decode(_) => "decode",
            WebhookError::Delivery(_) => "delivery",
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        // Parse and transport details stay in the logs
        match self {
            WebhookError::UnknownEvent => {
                (StatusCode::NOT_ACCEPTABLE, "unknown or missing x-ciq-event").into_response()
            }
            WebhookError::Signature(_) => {
                (StatusCode::UNAUTHORIZED, "invalid or missing signature").into_response()
            }
            WebhookError::Decode(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "Bad Request").into_response()
            }
            WebhookError::Delivery(_) => {
                (StatusCode::BAD_GATEWAY, "delivery to alert sink failed").into_response()
            }
        }
    }
}

/// Handle one inbound webhook call
pub async fn handle_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, WebhookError> {
    let span = info_span!("webhook", request_id = %Uuid::new_v4());

    async move {
        debug!("Inbound webhook: headers={:?} body={}", headers, String::from_utf8_lossy(&body));

        let result = match EventKind::from_headers(&headers) {
            Ok(kind) => {
                counter!("webhook_requests_total", "event" => kind.as_str()).increment(1);
                match kind {
                    EventKind::Ping => Ok(PONG.into_response()),
                    EventKind::HealthIssueChange => {
                        relay_health_event(&state, &headers, &body).await
                    }
                }
            }
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            counter!("webhook_rejected_total", "reason" => e.reason()).increment(1);
            match e {
                WebhookError::Delivery(_) => error!("{}", e),
                _ => warn!("{}", e),
            }
        }
        result
    }
    .instrument(span)
    .await
}

async fn relay_health_event(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<Response, WebhookError> {
    if let Some(verifier) = &state.verifier {
        verifier.verify_header(body, headers.get(SIGNATURE_HEADER))?;
    }

    let event = HealthEvent::from_slice(body)?;
    debug!("Mapping input: {:?}", event);

    let batch = state.mapper.map(&event);
    let new_count = event.new_issues.len() as u64;
    let resolved_count = event.resolved_issues.len() as u64;
    counter!("alerts_mapped_total", "kind" => "new").increment(new_count);
    counter!("alerts_mapped_total", "kind" => "resolved").increment(resolved_count);
    info!(
        "Mapped {} new and {} resolved issue(s) for {} (score {}), {} of {} alert(s) resolving",
        new_count,
        resolved_count,
        event.system_name,
        event.current_score,
        batch.resolved_count(),
        batch.alerts.len()
    );
    debug!("Mapping output: {:?}", batch);

    match state.sink.forward(&batch).await {
        Ok(outcome) => {
            let label = if outcome.is_success() { "delivered" } else { "sink_error" };
            counter!("sink_deliveries_total", "outcome" => label).increment(1);
            Ok(StatusCode::OK.into_response())
        }
        Err(e) => {
            counter!("sink_deliveries_total", "outcome" => "failed").increment(1);
            if state.strict_delivery {
                Err(WebhookError::Delivery(e))
            } else {
                error!("Delivery to alert sink failed: {}", e);
                Ok(StatusCode::OK.into_response())
            }
        }
    }
}
