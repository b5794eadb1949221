//! Alertmanager-shaped webhooks: one request carries a group of alerts.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use alertflow_core::{Alert, AlertSource, AlertStatus, Severity, derive_fingerprint};

use crate::error::IngressError;

/// One alert inside an Alertmanager batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertmanagerAlert {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    #[serde(default)]
    pub annotations: HashMap<String, String>,
    #[serde(default, rename = "startsAt")]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "endsAt")]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "generatorURL")]
    pub generator_url: Option<String>,
    #[serde(default)]
    pub fingerprint: String,
}

/// The Alertmanager v4 webhook envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertmanagerWebhook {
    #[serde(default)]
    pub version: String,
    #[serde(default, rename = "groupKey")]
    pub group_key: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub receiver: String,
    #[serde(default, rename = "groupLabels")]
    pub group_labels: HashMap<String, String>,
    #[serde(default, rename = "commonLabels")]
    pub common_labels: HashMap<String, String>,
    #[serde(default, rename = "commonAnnotations")]
    pub common_annotations: HashMap<String, String>,
    #[serde(default, rename = "externalURL")]
    pub external_url: String,
    #[serde(default)]
    pub alerts: Vec<AlertmanagerAlert>,
}

/// Normalize an Alertmanager batch into canonical alerts.
///
/// An empty batch is a validation error; individual alerts normalize
/// leniently (missing timestamps default to now, unknown statuses to
/// TRIGGERED).
pub fn normalize_alertmanager(
    payload: &AlertmanagerWebhook,
    service_id: &str,
) -> Result<Vec<Alert>, IngressError> {
    if payload.alerts.is_empty() {
        return Err(IngressError::Validation("alerts must not be empty".into()));
    }

    Ok(payload
        .alerts
        .iter()
        .map(|member| normalize_member(member, service_id))
        .collect())
}

fn normalize_member(member: &AlertmanagerAlert, service_id: &str) -> Alert {
    let status = match member.status.as_str() {
        "resolved" => AlertStatus::Resolved,
        "firing" => AlertStatus::Triggered,
        other => {
            debug!(status = other, "unknown Alertmanager status, treating as firing");
            AlertStatus::Triggered
        }
    };

    let severity = member
        .labels
        .get("severity")
        .map_or(Severity::Info, |s| Severity::from_label(s));

    let summary = member
        .annotations
        .get("summary")
        .or_else(|| member.annotations.get("description"))
        .or_else(|| member.labels.get("alertname"))
        .cloned()
        .unwrap_or_else(|| "(no summary)".to_owned());

    let fingerprint = if member.fingerprint.is_empty() {
        fingerprint_from_labels(&member.labels)
    } else {
        member.fingerprint.clone()
    };

    let mut alert = Alert::new(service_id, fingerprint, summary, AlertSource::Alertmanager)
        .with_severity(severity)
        .with_status(status)
        .with_labels(member.labels.clone())
        .with_annotations(member.annotations.clone())
        .with_triggered_at(member.starts_at.unwrap_or_else(Utc::now))
        .with_raw_payload(serde_json::to_value(member).unwrap_or_default());

    if let Some(details) = member.annotations.get("description") {
        alert = alert.with_details(details.clone());
    }
    if let Some(url) = &member.generator_url {
        alert = alert.with_generator_url(url.clone());
    }
    // `endsAt` only becomes the resolution instant for resolved alerts;
    // firing alerts keep it in the raw payload only.
    if status == AlertStatus::Resolved {
        alert = alert.with_resolved_at(member.ends_at.unwrap_or_else(Utc::now));
    }

    alert
}

/// Fingerprint for alerts the producer did not fingerprint: the sorted
/// label set is the identity.
fn fingerprint_from_labels(labels: &HashMap<String, String>) -> String {
    let mut pairs: Vec<String> = labels.iter().map(|(k, v)| format!("{k}={v}")).collect();
    pairs.sort_unstable();
    derive_fingerprint(pairs)
}
