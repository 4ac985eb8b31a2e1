//! Delivery Error Types

use std::time::Duration;
use thiserror::Error;

/// Errors reaching the alert sink
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Batch could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Sink did not answer within the configured timeout
    #[error("Timed out after {0:?} waiting for alert sink")]
    Timeout(Duration),

    /// Connection or other transport failure
    #[error("Transport error: {0}")]
    Transport(#[source] reqwest::Error),
}

/// Errors building a forwarder
#[derive(Debug, Error)]
pub enum ForwarderError {
    #[error("Invalid sink endpoint {url}: {source}")]
    InvalidEndpoint {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Sink endpoint must be http or https, got {0}")]
    UnsupportedScheme(String),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}
