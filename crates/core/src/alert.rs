use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::severity::Severity;

/// Lifecycle status of an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertStatus {
    /// The underlying condition is firing.
    Triggered,
    /// A human has acknowledged the alert.
    Acknowledged,
    /// The condition cleared.
    Resolved,
    /// Routing decided to silence the alert.
    Suppressed,
}

impl AlertStatus {
    /// Return the canonical lower-case label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Triggered => "triggered",
            Self::Acknowledged => "acknowledged",
            Self::Resolved => "resolved",
            Self::Suppressed => "suppressed",
        }
    }
}

impl std::fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape of the upstream producer an alert arrived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSource {
    /// Prometheus Alertmanager webhook batches.
    Alertmanager,
    /// Grafana alert notifications.
    Grafana,
    /// The catch-all generic webhook shape.
    Generic,
}

impl AlertSource {
    /// Return the canonical lower-case tag.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Alertmanager => "alertmanager",
            Self::Grafana => "grafana",
            Self::Generic => "generic",
        }
    }
}

impl std::fmt::Display for AlertSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The canonical alert record produced by ingress normalization.
///
/// Identity is the `(service_id, fingerprint)` pair: a second arrival with
/// the same pair updates the live alert in place instead of creating a new
/// one. `raw_payload` preserves the producer request for audit only and is
/// never consulted by routing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    /// Server-assigned stable identifier.
    pub id: String,

    /// Content-addressed identity; 32 hex chars when derived by the ingress,
    /// opaque when producer-supplied.
    pub fingerprint: String,

    /// The integration (tenant) this alert belongs to.
    pub service_id: String,

    /// Short human-readable summary.
    pub summary: String,

    /// Longer human-readable detail text.
    #[serde(default)]
    pub details: String,

    /// Canonical severity.
    pub severity: Severity,

    /// Lifecycle status.
    pub status: AlertStatus,

    /// Which producer shape delivered the alert.
    pub source: AlertSource,

    /// Producer labels (routing input).
    #[serde(default)]
    pub labels: HashMap<String, String>,

    /// Producer annotations (routing input).
    #[serde(default)]
    pub annotations: HashMap<String, String>,

    /// When the underlying condition started.
    pub triggered_at: DateTime<Utc>,

    /// Set iff `status == Resolved`.
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,

    /// Link back to the producer's rule/graph, when supplied.
    #[serde(default)]
    pub generator_url: Option<String>,

    /// The producer request as received, for audit only.
    #[serde(default)]
    pub raw_payload: serde_json::Value,
}

impl Alert {
    /// Create a new alert with a generated id and the given identity fields.
    /// Defaults to [`Severity::Info`], [`AlertStatus::Triggered`], and a
    /// `triggered_at` of now.
    #[must_use]
    pub fn new(
        service_id: impl Into<String>,
        fingerprint: impl Into<String>,
        summary: impl Into<String>,
        source: AlertSource,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            fingerprint: fingerprint.into(),
            service_id: service_id.into(),
            summary: summary.into(),
            details: String::new(),
            severity: Severity::Info,
            status: AlertStatus::Triggered,
            source,
            labels: HashMap::new(),
            annotations: HashMap::new(),
            triggered_at: Utc::now(),
            resolved_at: None,
            generator_url: None,
            raw_payload: serde_json::Value::Null,
        }
    }

    /// Set the severity.
    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Set the status. Clears `resolved_at` when the status is not
    /// [`AlertStatus::Resolved`].
    #[must_use]
    pub fn with_status(mut self, status: AlertStatus) -> Self {
        self.status = status;
        if status != AlertStatus::Resolved {
            self.resolved_at = None;
        }
        self
    }

    /// Set the detail text.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }

    /// Replace the label map.
    #[must_use]
    pub fn with_labels(mut self, labels: HashMap<String, String>) -> Self {
        self.labels = labels;
        self
    }

    /// Replace the annotation map.
    #[must_use]
    pub fn with_annotations(mut self, annotations: HashMap<String, String>) -> Self {
        self.annotations = annotations;
        self
    }

    /// Set the trigger instant.
    #[must_use]
    pub fn with_triggered_at(mut self, at: DateTime<Utc>) -> Self {
        self.triggered_at = at;
        self
    }

    /// Mark the alert resolved at the given instant.
    #[must_use]
    pub fn with_resolved_at(mut self, at: DateTime<Utc>) -> Self {
        self.status = AlertStatus::Resolved;
        self.resolved_at = Some(at);
        self
    }

    /// Set the generator URL.
    #[must_use]
    pub fn with_generator_url(mut self, url: impl Into<String>) -> Self {
        self.generator_url = Some(url.into());
        self
    }

    /// Attach the raw producer payload for audit.
    #[must_use]
    pub fn with_raw_payload(mut self, payload: serde_json::Value) -> Self {
        self.raw_payload = payload;
        self
    }

    /// Look up a label value.
    #[must_use]
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    /// Fold an update for the same `(service_id, fingerprint)` into this
    /// alert: status, timestamps, labels, and annotations are taken from the
    /// newer arrival; the id is preserved.
    pub fn absorb(&mut self, update: Alert) {
        self.summary = update.summary;
        self.details = update.details;
        self.severity = update.severity;
        self.status = update.status;
        self.labels = update.labels;
        self.annotations = update.annotations;
        self.triggered_at = update.triggered_at;
        self.resolved_at = update.resolved_at;
        self.generator_url = update.generator_url;
        self.raw_payload = update.raw_payload;
    }
}
