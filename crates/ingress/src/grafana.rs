//! Grafana-shaped webhooks: one alert event per request.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use alertflow_core::{Alert, AlertSource, AlertStatus, Severity, derive_fingerprint};

use crate::error::IngressError;

/// One evaluated metric in a Grafana notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalMatch {
    #[serde(default)]
    pub metric: String,
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default)]
    pub tags: Option<HashMap<String, String>>,
}

/// The Grafana (legacy dashboard alerting) notification payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrafanaWebhook {
    #[serde(default)]
    pub title: String,
    #[serde(default, rename = "ruleId")]
    pub rule_id: i64,
    #[serde(default, rename = "ruleName")]
    pub rule_name: String,
    #[serde(default, rename = "ruleUrl")]
    pub rule_url: Option<String>,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, rename = "evalMatches")]
    pub eval_matches: Vec<EvalMatch>,
    #[serde(default)]
    pub tags: Option<HashMap<String, String>>,
    #[serde(default, rename = "orgId")]
    pub org_id: i64,
    #[serde(default, rename = "dashboardId")]
    pub dashboard_id: i64,
    #[serde(default, rename = "panelId")]
    pub panel_id: i64,
    #[serde(default, rename = "imageUrl")]
    pub image_url: Option<String>,
}

/// Normalize a Grafana notification into a canonical alert.
///
/// A payload with neither a title nor a rule name is a validation error.
/// The fingerprint is derived from the rule id plus the sorted tag set, so
/// repeated notifications for the same rule state collapse into one
/// incident.
pub fn normalize_grafana(
    payload: &GrafanaWebhook,
    service_id: &str,
) -> Result<Alert, IngressError> {
    if payload.title.is_empty() && payload.rule_name.is_empty() {
        return Err(IngressError::Validation(
            "title or ruleName is required".into(),
        ));
    }

    let status = match payload.state.as_str() {
        "alerting" | "no_data" => AlertStatus::Triggered,
        "ok" => AlertStatus::Resolved,
        "paused" => AlertStatus::Suppressed,
        other => {
            debug!(state = other, "unknown Grafana state, treating as alerting");
            AlertStatus::Triggered
        }
    };

    let tags = payload.tags.clone().unwrap_or_default();
    let severity = tags
        .get("severity")
        .map_or(Severity::Info, |s| Severity::from_label(s));

    let summary = if payload.title.is_empty() {
        payload.rule_name.clone()
    } else {
        payload.title.clone()
    };

    // Evaluated metric values are kept as annotations for the audit trail.
    let mut annotations = HashMap::new();
    if !payload.message.is_empty() {
        annotations.insert("message".to_owned(), payload.message.clone());
    }
    for eval in &payload.eval_matches {
        if !eval.metric.is_empty() {
            annotations.insert(
                format!("eval_{}", eval.metric),
                eval.value.to_string(),
            );
        }
    }

    let mut alert = Alert::new(
        service_id,
        fingerprint_for(payload.rule_id, &tags),
        summary,
        AlertSource::Grafana,
    )
    .with_severity(severity)
    .with_status(status)
    .with_details(payload.message.clone())
    .with_labels(tags)
    .with_annotations(annotations)
    .with_raw_payload(serde_json::to_value(payload).unwrap_or_default());

    if let Some(url) = &payload.rule_url {
        alert = alert.with_generator_url(url.clone());
    }
    if status == AlertStatus::Resolved {
        alert = alert.with_resolved_at(chrono::Utc::now());
    }

    Ok(alert)
}

/// Rule id plus sorted tags, hashed to 32 hex chars.
fn fingerprint_for(rule_id: i64, tags: &HashMap<String, String>) -> String {
    let mut parts: Vec<String> = tags.iter().map(|(k, v)| format!("{k}={v}")).collect();
    parts.sort_unstable();
    parts.insert(0, rule_id.to_string());
    derive_fingerprint(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(state: &str) -> GrafanaWebhook {
        GrafanaWebhook {
            title: "[Alerting] CPU High".to_owned(),
            rule_id: 42,
            rule_name: "CPU High".to_owned(),
            rule_url: Some("http://grafana/d/abc".to_owned()),
            state: state.to_owned(),
            message: "CPU above 90% for 5m".to_owned(),
            eval_matches: vec![EvalMatch {
                metric: "cpu".to_owned(),
                value: serde_json::json!(93.5),
                tags: None,
            }],
            tags: Some(HashMap::from([
                ("severity".to_owned(), "critical".to_owned()),
                ("host".to_owned(), "db-01".to_owned()),
            ])),
            org_id: 1,
            dashboard_id: 7,
            panel_id: 3,
            image_url: None,
        }
    }

    #[test]
    fn missing_title_and_rule_name_is_invalid() {
        let mut p = payload("alerting");
        p.title = String::new();
        p.rule_name = String::new();
        assert!(matches!(
            normalize_grafana(&p, "svc"),
            Err(IngressError::Validation(_))
        ));
    }

    #[test]
    fn alerting_state_normalizes() {
        let alert = normalize_grafana(&payload("alerting"), "svc-1").unwrap();
        assert_eq!(alert.status, AlertStatus::Triggered);
        assert_eq!(alert.source, AlertSource::Grafana);
        assert_eq!(alert.severity, Severity::Critical);
        assert_eq!(alert.summary, "[Alerting] CPU High");
        assert_eq!(alert.labels["host"], "db-01");
        assert_eq!(alert.annotations["message"], "CPU above 90% for 5m");
        assert_eq!(alert.annotations["eval_cpu"], "93.5");
        assert_eq!(alert.generator_url.as_deref(), Some("http://grafana/d/abc"));
        assert_eq!(alert.fingerprint.len(), 32);
    }

    #[test]
    fn state_mapping() {
        assert_eq!(
            normalize_grafana(&payload("no_data"), "svc").unwrap().status,
            AlertStatus::Triggered
        );
        let resolved = normalize_grafana(&payload("ok"), "svc").unwrap();
        assert_eq!(resolved.status, AlertStatus::Resolved);
        assert!(resolved.resolved_at.is_some());
        assert_eq!(
            normalize_grafana(&payload("paused"), "svc").unwrap().status,
            AlertStatus::Suppressed
        );
        assert_eq!(
            normalize_grafana(&payload("???"), "svc").unwrap().status,
            AlertStatus::Triggered
        );
    }

    #[test]
    fn fingerprint_is_stable_across_tag_order() {
        let a = normalize_grafana(&payload("alerting"), "svc").unwrap();
        let b = normalize_grafana(&payload("alerting"), "svc").unwrap();
        assert_eq!(a.fingerprint, b.fingerprint);
    }

    #[test]
    fn fingerprint_differs_per_rule() {
        let mut other = payload("alerting");
        other.rule_id = 43;
        let a = normalize_grafana(&payload("alerting"), "svc").unwrap();
        let b = normalize_grafana(&other, "svc").unwrap();
        assert_ne!(a.fingerprint, b.fingerprint);
    }

    #[test]
    fn title_falls_back_to_rule_name() {
        let mut p = payload("alerting");
        p.title = String::new();
        let alert = normalize_grafana(&p, "svc").unwrap();
        assert_eq!(alert.summary, "CPU High");
    }
}
