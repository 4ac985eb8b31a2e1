//! Source Health Event Model
//!
//! Snapshot records emitted by the health monitor's `health-issue-change`
//! webhook. Only `system_name`, `current_score`, `timestamp` and the issue
//! lists drive the mapping; everything else is carried through untouched.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Errors decoding an inbound health event
#[derive(Debug, Error)]
pub enum EventError {
    /// Body was not a valid health event document
    #[error("Malformed health event: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// One health snapshot of a monitored system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthEvent {
    /// Logical identity of the monitored system
    pub system_name: String,
    /// Aggregate health score at `timestamp`, nominally 0-100
    #[serde(default, deserialize_with = "null_as_default")]
    pub current_score: i64,
    /// Epoch seconds when the score was computed
    #[serde(default, deserialize_with = "null_as_default")]
    pub timestamp: i64,
    /// Issues newly detected at this snapshot
    #[serde(default, deserialize_with = "null_as_default")]
    pub new_issues: Vec<Issue>,
    /// Issues resolved at this snapshot
    #[serde(default, deserialize_with = "null_as_default")]
    pub resolved_issues: Vec<Issue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_display_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_iso8601: Option<String>,
}

impl HealthEvent {
    /// Decode the first JSON value of a raw body. Trailing bytes are ignored.
    pub fn from_slice(body: &[u8]) -> Result<Self, EventError> {
        let mut de = serde_json::Deserializer::from_slice(body);
        Ok(HealthEvent::deserialize(&mut de)?)
    }

    /// Total number of issues carried by this snapshot
    pub fn issue_count(&self) -> usize {
        self.new_issues.len() + self.resolved_issues.len()
    }
}

/// The monitor sends `null` where a field has no value
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One health finding
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Stable identifier, used as the incident correlation key
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    /// Human-readable text
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    /// Detection rule that produced the issue
    #[serde(default, deserialize_with = "null_as_default")]
    pub rule_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub impacted_objects: Vec<ImpactedObject>,
}

/// Object affected by an issue. Never inspected by the mapper.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImpactedObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_native_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_name: Option<ObjectName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_native_type: Option<String>,
}

/// The monitor sends object names either as plain text or as a nested object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ObjectName {
    Text(String),
    Structured(serde_json::Map<String, serde_json::Value>),
    /// Any other JSON shape, passed through opaquely
    Other(serde_json::Value),
}
