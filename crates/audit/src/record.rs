use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use alertflow_core::{ActionResult, Alert};
use alertflow_rules::RuleEvaluation;

/// One alert's trip through the routing pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Unique record id (UUID v7, so ids sort by time).
    pub id: String,

    /// When the record was created.
    pub timestamp: DateTime<Utc>,

    /// The processed alert's id.
    pub alert_id: String,

    /// The processed alert's fingerprint (indexed by persisted backends).
    pub alert_fingerprint: String,

    /// Per-rule evaluation records, in evaluation order.
    pub evaluations: Vec<RuleEvaluation>,

    /// Per-action outcome records, in execution order.
    pub executions: Vec<ActionResult>,

    /// Total pipeline time in milliseconds.
    pub processing_time_ms: u64,
}

impl AuditRecord {
    /// Start a record for an alert; evaluations and executions are filled
    /// in as the pipeline progresses.
    #[must_use]
    pub fn for_alert(alert: &Alert) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            timestamp: Utc::now(),
            alert_id: alert.id.clone(),
            alert_fingerprint: alert.fingerprint.clone(),
            evaluations: Vec::new(),
            executions: Vec::new(),
            processing_time_ms: 0,
        }
    }

    /// Attach the rule evaluations.
    #[must_use]
    pub fn with_evaluations(mut self, evaluations: Vec<RuleEvaluation>) -> Self {
        self.evaluations = evaluations;
        self
    }

    /// Attach the action executions.
    #[must_use]
    pub fn with_executions(mut self, executions: Vec<ActionResult>) -> Self {
        self.executions = executions;
        self
    }

    /// Record the total pipeline time.
    #[must_use]
    pub fn with_processing_time(mut self, elapsed: std::time::Duration) -> Self {
        self.processing_time_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        self
    }
}

#[cfg(test)]
mod tests {
    use alertflow_core::{ActionKind, AlertSource};

    use super::*;

    #[test]
    fn record_captures_alert_identity() {
        let alert = Alert::new("svc", "fp-9", "summary", AlertSource::Generic);
        let record = AuditRecord::for_alert(&alert);
        assert_eq!(record.alert_id, alert.id);
        assert_eq!(record.alert_fingerprint, "fp-9");
        assert!(record.evaluations.is_empty());
    }

    #[test]
    fn record_serde_roundtrip() {
        let alert = Alert::new("svc", "fp", "summary", AlertSource::Generic);
        let record = AuditRecord::for_alert(&alert)
            .with_executions(vec![ActionResult::success(
                ActionKind::NotifyTeam,
                "notified",
            )])
            .with_processing_time(std::time::Duration::from_millis(12));
        let json = serde_json::to_string(&record).unwrap();
        let back: AuditRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, record.id);
        assert_eq!(back.executions.len(), 1);
        assert_eq!(back.processing_time_ms, 12);
    }
}
