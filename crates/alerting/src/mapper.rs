//! Event Mapper Implementation

use crate::alert::{Alert, AlertBatch, AlertStatus};
use crate::event::{HealthEvent, Issue};
use crate::severity::classify;

/// Cluster label identifying alerts raised through this integration
pub const INTEGRATION_CLUSTER: &str = "CloudIQ";

/// Maps health events onto alert batches for one sink application
#[derive(Debug, Clone)]
pub struct EventMapper {
    /// Application key stamped on every batch
    app_key: String,
    /// Cluster label stamped on every batch
    cluster: String,
}

impl EventMapper {
    /// Create a mapper for the given application key
    pub fn new(app_key: impl Into<String>) -> Self {
        Self {
            app_key: app_key.into(),
            cluster: INTEGRATION_CLUSTER.to_string(),
        }
    }

    /// Application key stamped on every batch
    pub fn app_key(&self) -> &str {
        &self.app_key
    }

    /// Translate one event into one batch
    ///
    /// New issues carry the status classified from the current score.
    /// Resolved issues are always sent as `ok`, which is what closes the
    /// matching incident on the sink side. New issues come first, and each
    /// group keeps the order the monitor sent it in.
    pub fn map(&self, event: &HealthEvent) -> AlertBatch {
        let mut batch = AlertBatch::new(&self.app_key, &event.system_name, &self.cluster);
        batch.alerts.reserve(event.issue_count());

        let raised = classify(event.current_score);
        batch
            .alerts
            .extend(event.new_issues.iter().map(|issue| to_alert(event, issue, raised)));
        batch.alerts.extend(
            event
                .resolved_issues
                .iter()
                .map(|issue| to_alert(event, issue, AlertStatus::Ok)),
        );

        batch
    }
}

/// Map a single event with an ad-hoc application key
pub fn map_event(event: &HealthEvent, app_key: &str) -> AlertBatch {
    EventMapper::new(app_key).map(event)
}

fn to_alert(event: &HealthEvent, issue: &Issue, status: AlertStatus) -> Alert {
    Alert {
        status,
        host: event.system_name.clone(),
        timestamp: event.timestamp,
        check: issue.rule_id.clone(),
        description: issue.description.clone(),
        cluster: String::new(),
        incident_identifier: issue.id.clone(),
    }
}
