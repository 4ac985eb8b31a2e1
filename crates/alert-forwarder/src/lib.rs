//! Alert Forwarder
//!
//! Delivers mapped alert batches to the alert sink's ingestion endpoint:
//! - One POST per batch, no buffering or retries
//! - Bearer token authentication
//! - Bounded request timeout
//!
//! The sink's status code is handed back untouched; deciding whether a
//! non-2xx answer matters is left to the caller.

mod error;
mod forwarder;

use alerting::AlertBatch;
use async_trait::async_trait;

pub use error::{DeliveryError, ForwarderError};
pub use forwarder::{
    AlertForwarder, DeliveryOutcome, ForwarderConfig, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_SECS,
};

/// Anything that can take delivery of an alert batch
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Deliver one batch, making exactly one attempt
    async fn forward(&self, batch: &AlertBatch) -> Result<DeliveryOutcome, DeliveryError>;
}
