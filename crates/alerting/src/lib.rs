//! Alerting
//!
//! Health event model, score-to-severity classification, and the mapping from
//! health snapshots to sink alert batches.

mod alert;
mod event;
mod mapper;
pub mod severity;

pub use alert::{Alert, AlertBatch, AlertStatus};
pub use event::{EventError, HealthEvent, ImpactedObject, Issue, ObjectName};
pub use mapper::{map_event, EventMapper, INTEGRATION_CLUSTER};
pub use severity::classify;
