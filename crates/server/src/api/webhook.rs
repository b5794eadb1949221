//! Webhook endpoints: the request-driven pipeline from producer payload to
//! action fan-out.
//!
//! Per request: HMAC verification over the exact body, idempotency gate,
//! integration-key lookup, payload parse/validate, normalization, then one
//! gateway pass per normalized alert. Failed members of an Alertmanager
//! batch are logged without failing the request as long as at least one
//! member processed.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use alertflow_core::{Alert, AlertSource};
use alertflow_ingress::{
    AlertmanagerWebhook, GateOutcome, GenericWebhook, GrafanaWebhook, IngressError,
    derive_idempotency_key, normalize_alertmanager, normalize_generic, normalize_grafana,
    verify_signature,
};

use crate::error::ApiError;

use super::AppState;

/// Success response for every webhook shape.
#[derive(Debug, Serialize, Deserialize)]
pub struct WebhookResponse {
    pub message: String,
    #[serde(rename = "alertIds")]
    pub alert_ids: Vec<String>,
    pub created: u32,
    pub updated: u32,
}

/// `POST /api/v1/webhook/alertmanager/{integration_key}`
pub async fn alertmanager(
    State(state): State<AppState>,
    Path(integration_key): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, ApiError> {
    handle(state, AlertSource::Alertmanager, integration_key, &headers, &body).await
}

/// `POST /api/v1/webhook/grafana/{integration_key}`
pub async fn grafana(
    State(state): State<AppState>,
    Path(integration_key): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, ApiError> {
    handle(state, AlertSource::Grafana, integration_key, &headers, &body).await
}

/// `POST /api/v1/webhook/generic/{integration_key}`
pub async fn generic(
    State(state): State<AppState>,
    Path(integration_key): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, ApiError> {
    handle(state, AlertSource::Generic, integration_key, &headers, &body).await
}

/// The signature header each producer shape sends.
fn signature_header(source: AlertSource) -> &'static str {
    match source {
        AlertSource::Alertmanager => "x-alertmanager-signature",
        AlertSource::Grafana => "x-grafana-signature",
        AlertSource::Generic => "x-webhook-signature",
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// The shared per-request pipeline.
async fn handle(
    state: AppState,
    source: AlertSource,
    integration_key: String,
    headers: &HeaderMap,
    body: &Bytes,
) -> Result<Json<WebhookResponse>, ApiError> {
    // 1. Signature over the exact request bytes.
    verify_signature(
        state.config.secret_for(source),
        header_str(headers, signature_header(source)),
        body,
    )
    .map_err(IngressError::from)?;

    // 2. Idempotency gate.
    let idempotency_key = derive_idempotency_key(
        &integration_key,
        header_str(headers, "x-idempotency-key"),
        body,
    );
    if state.gate.admit(idempotency_key.as_deref()).await == GateOutcome::Duplicate {
        return Err(IngressError::Duplicate.into());
    }

    // 3. Integration key lookup; disabled services behave like unknown keys.
    let service = state
        .services
        .find_by_integration_key(&integration_key)
        .await
        .map_err(|e| ApiError::Internal(format!("service lookup failed: {e}")))?
        .filter(|s| s.enabled)
        .ok_or(IngressError::UnknownIntegration)?;

    // 4+5. Parse, validate, and normalize per shape.
    let alerts = parse_and_normalize(source, body, &service.id)?;

    // 6. One gateway pass per alert; batch members fail independently.
    let total = alerts.len();
    let mut alert_ids = Vec::with_capacity(total);
    let mut created: u32 = 0;
    let mut updated: u32 = 0;
    let mut failed: u32 = 0;

    for alert in alerts {
        let fingerprint = alert.fingerprint.clone();
        match state
            .gateway
            .process(alert, state.shutdown.child_token())
            .await
        {
            Ok(processed) => {
                if processed.created {
                    created += 1;
                } else {
                    updated += 1;
                }
                alert_ids.push(processed.alert.id);
            }
            Err(err) => {
                failed += 1;
                error!(fingerprint, error = %err, "alert processing failed");
            }
        }
    }

    if alert_ids.is_empty() && failed > 0 {
        // Nothing processed: surface a 500 and let the client retry.
        state.gate.release_on_error(idempotency_key.as_deref()).await;
        return Err(ApiError::Internal("alert processing failed".to_owned()));
    }

    info!(
        source = %source,
        service = %service.id,
        created,
        updated,
        failed,
        "webhook processed"
    );

    Ok(Json(WebhookResponse {
        message: format!("processed {} of {total} alert(s)", alert_ids.len()),
        alert_ids,
        created,
        updated,
    }))
}

fn parse_and_normalize(
    source: AlertSource,
    body: &[u8],
    service_id: &str,
) -> Result<Vec<Alert>, ApiError> {
    let invalid = |e: serde_json::Error| {
        ApiError::from(IngressError::Validation(format!("malformed body: {e}")))
    };
    match source {
        AlertSource::Alertmanager => {
            let payload: AlertmanagerWebhook = serde_json::from_slice(body).map_err(invalid)?;
            Ok(normalize_alertmanager(&payload, service_id)?)
        }
        AlertSource::Grafana => {
            let payload: GrafanaWebhook = serde_json::from_slice(body).map_err(invalid)?;
            Ok(vec![normalize_grafana(&payload, service_id)?])
        }
        AlertSource::Generic => {
            let payload: GenericWebhook = serde_json::from_slice(body).map_err(invalid)?;
            Ok(vec![normalize_generic(&payload, service_id)?])
        }
    }
}
