//! Alert Sink Wire Model
//!
//! Batches posted to the alert sink's ingestion endpoint. Empty strings and
//! zero timestamps are left out of the JSON instead of being sent as nulls.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Alert status understood by the sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertStatus {
    #[serde(rename = "ok")]
    Ok,
    #[serde(rename = "ok suspect")]
    OkSuspect,
    #[serde(rename = "warning")]
    Warning,
    #[serde(rename = "warning suspect")]
    WarningSuspect,
    #[serde(rename = "critical")]
    Critical,
    #[serde(rename = "critical suspect")]
    CriticalSuspect,
    #[serde(rename = "unknown")]
    Unknown,
    #[serde(rename = "acknowledged")]
    Acknowledged,
}

impl AlertStatus {
    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Ok => "ok",
            AlertStatus::OkSuspect => "ok suspect",
            AlertStatus::Warning => "warning",
            AlertStatus::WarningSuspect => "warning suspect",
            AlertStatus::Critical => "critical",
            AlertStatus::CriticalSuspect => "critical suspect",
            AlertStatus::Unknown => "unknown",
            AlertStatus::Acknowledged => "acknowledged",
        }
    }

    /// Whether sending this status closes an open incident
    pub fn is_resolving(&self) -> bool {
        matches!(self, AlertStatus::Ok)
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

/// One alert line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub status: AlertStatus,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub host: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub check: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cluster: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub incident_identifier: String,
}

/// One outbound delivery unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertBatch {
    /// Tenant application key, constant per deployment
    pub app_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AlertStatus>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub host: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub check: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cluster: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub incident_identifier: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alerts: Vec<Alert>,
}

impl AlertBatch {
    /// Create an empty batch for a host
    pub fn new(
        app_key: impl Into<String>,
        host: impl Into<String>,
        cluster: impl Into<String>,
    ) -> Self {
        Self {
            app_key: app_key.into(),
            status: None,
            host: host.into(),
            timestamp: 0,
            check: String::new(),
            description: String::new(),
            cluster: cluster.into(),
            incident_identifier: String::new(),
            alerts: Vec::new(),
        }
    }

    /// Number of resolving alerts in the batch
    pub fn resolved_count(&self) -> usize {
        self.alerts.iter().filter(|a| a.status.is_resolving()).count()
    }
}
