//! Health Webhook Relay Server
//!
//! Receives health-change webhooks from the monitor, maps them to alert
//! batches and forwards them to the alert sink.

use std::sync::Arc;
use std::time::Instant;

use alert_forwarder::{AlertForwarder, AlertSink, ForwarderError};
use alerting::EventMapper;
use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

pub mod config;
pub mod routes;
pub mod signature;

pub use crate::config::{ConfigError, Settings};
pub use routes::webhook::{EventKind, WebhookError, EVENT_HEADER};
pub use signature::{SignatureError, SignatureVerifier, SIGNATURE_HEADER};

/// Request-independent state shared by all handlers. Immutable after startup.
pub struct AppState {
    /// Event to alert mapping
    pub mapper: EventMapper,
    /// Alert delivery
    pub sink: Arc<dyn AlertSink>,
    /// Webhook signature check, when a secret is configured
    pub verifier: Option<SignatureVerifier>,
    /// Answer 502 when the sink cannot be reached
    pub strict_delivery: bool,
    /// Prometheus exposition
    pub metrics: Option<PrometheusHandle>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: Instant,
}

impl AppState {
    /// Create application state around a mapper and a sink
    pub fn new(mapper: EventMapper, sink: Arc<dyn AlertSink>) -> Self {
        Self {
            mapper,
            sink,
            verifier: None,
            strict_delivery: false,
            metrics: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Instant::now(),
        }
    }

    /// Build the production state from settings
    pub fn from_settings(settings: &Settings) -> Result<Self, ForwarderError> {
        let forwarder = AlertForwarder::new(settings.forwarder_config())?;
        info!(
            "Relaying health events to {} (strict delivery: {}, signatures: {})",
            forwarder.endpoint(),
            settings.strict_delivery,
            settings.webhook_secret.is_some()
        );
        let mut state = Self::new(EventMapper::new(&settings.app_key), Arc::new(forwarder))
            .with_strict_delivery(settings.strict_delivery);
        if let Some(secret) = &settings.webhook_secret {
            state = state.with_verifier(SignatureVerifier::new(secret));
        }
        Ok(state)
    }

    pub fn with_verifier(mut self, verifier: SignatureVerifier) -> Self {
        self.verifier = Some(verifier);
        self
    }

    pub fn with_strict_delivery(mut self, strict: bool) -> Self {
        self.strict_delivery = strict;
        self
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub signature_checks: bool,
    pub strict_delivery: bool,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", post(routes::webhook::handle_webhook))
        .route("/healthz", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        signature_checks: state.verifier.is_some(),
        strict_delivery: state.strict_delivery,
    })
}

/// Prometheus exposition handler
async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics exporter not installed".to_string()),
    }
}

/// Initialize logging
///
/// Filtering follows `RUST_LOG` (default `info`). Set `LOG_FORMAT=json` for
/// structured output.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    if let Err(e) = result {
        eprintln!("Tracing subscriber already installed: {e}");
    }
}

/// Run the server
pub async fn run_server(settings: Settings) -> anyhow::Result<()> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install Prometheus recorder")?;

    let state = AppState::from_settings(&settings)
        .context("failed to build alert forwarder")?
        .with_metrics(handle);
    info!(
        "Relaying to {} (signature checks: {}, strict delivery: {})",
        settings.url,
        state.verifier.is_some(),
        state.strict_delivery
    );

    let app = create_router(Arc::new(state));
    let addr = settings.bind_addr();

    info!("Starting webhook relay on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}
