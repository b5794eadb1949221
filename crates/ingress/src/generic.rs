//! The generic webhook shape: a minimal JSON contract for producers
//! without a native integration.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use alertflow_core::{Alert, AlertSource, AlertStatus, Severity, derive_fingerprint};

use crate::error::IngressError;

/// The generic webhook payload. Only `summary` is required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenericWebhook {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    #[serde(default)]
    pub annotations: HashMap<String, String>,
    #[serde(default)]
    pub fingerprint: Option<String>,
    /// Name of the producing system; recorded as an annotation.
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Normalize a generic webhook into a canonical alert.
///
/// An empty summary is a validation error, as is a status outside the
/// accepted set. A caller-supplied fingerprint is taken as-is; otherwise
/// the identity is `service id + summary + sorted labels`.
pub fn normalize_generic(
    payload: &GenericWebhook,
    service_id: &str,
) -> Result<Alert, IngressError> {
    if payload.summary.is_empty() {
        return Err(IngressError::Validation("summary is required".into()));
    }

    let status = match payload.status.as_deref().unwrap_or("") {
        "" | "triggered" | "firing" | "alerting" => AlertStatus::Triggered,
        "resolved" | "ok" => AlertStatus::Resolved,
        "acknowledged" | "acked" => AlertStatus::Acknowledged,
        "suppressed" | "silenced" => AlertStatus::Suppressed,
        other => {
            return Err(IngressError::Validation(format!(
                "unsupported status {other:?}"
            )));
        }
    };

    let severity = payload
        .severity
        .as_deref()
        .map_or(Severity::Info, Severity::from_label);

    let fingerprint = match &payload.fingerprint {
        Some(fp) if !fp.is_empty() => fp.clone(),
        _ => derived_fingerprint(payload, service_id),
    };

    let mut annotations = payload.annotations.clone();
    if let Some(source) = &payload.source {
        annotations.insert("source".to_owned(), source.clone());
    }

    let mut alert = Alert::new(service_id, fingerprint, payload.summary.clone(), AlertSource::Generic)
        .with_severity(severity)
        .with_status(status)
        .with_labels(payload.labels.clone())
        .with_annotations(annotations)
        .with_triggered_at(payload.timestamp.unwrap_or_else(Utc::now))
        .with_raw_payload(serde_json::to_value(payload).unwrap_or_default());

    if let Some(details) = &payload.details {
        alert = alert.with_details(details.clone());
    }
    if status == AlertStatus::Resolved {
        alert = alert.with_resolved_at(payload.timestamp.unwrap_or_else(Utc::now));
    }

    Ok(alert)
}

/// Service id, summary, and the sorted label set make the identity.
fn derived_fingerprint(payload: &GenericWebhook, service_id: &str) -> String {
    let mut parts: Vec<String> = payload
        .labels
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect();
    parts.sort_unstable();
    parts.insert(0, payload.summary.clone());
    parts.insert(0, service_id.to_owned());
    derive_fingerprint(parts)
}
