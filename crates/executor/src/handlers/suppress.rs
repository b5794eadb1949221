use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use alertflow_core::{ActionKind, Alert, AlertStatus, RouteAction};
use alertflow_store::AlertStore;

use crate::context::ActionContext;
use crate::error::HandlerError;
use crate::registry::ActionHandler;

/// Handler for SUPPRESS: marks the stored alert suppressed.
///
/// Entirely local, so it is never retryable; store failures surface as
/// permanent results. Lifting the suppression after `duration_seconds` is
/// the scheduler's concern, outside this pipeline.
pub struct SuppressHandler {
    alerts: Arc<dyn AlertStore>,
}

impl SuppressHandler {
    pub fn new(alerts: Arc<dyn AlertStore>) -> Self {
        Self { alerts }
    }
}

#[async_trait]
impl ActionHandler for SuppressHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::Suppress
    }

    async fn execute(
        &self,
        _ctx: &ActionContext,
        alert: &Alert,
        action: &RouteAction,
    ) -> Result<String, HandlerError> {
        let RouteAction::Suppress {
            reason,
            duration_seconds,
            log_suppression,
        } = action
        else {
            return Err(HandlerError::Rejected("not a SUPPRESS action".into()));
        };

        self.alerts
            .set_status(&alert.id, AlertStatus::Suppressed)
            .await
            .map_err(|e| HandlerError::Rejected(format!("suppression failed: {e}")))?;

        if *log_suppression {
            info!(
                alert.id = %alert.id,
                reason,
                duration_seconds,
                "alert suppressed"
            );
        }

        Ok(if reason.is_empty() {
            "alert suppressed".to_owned()
        } else {
            format!("alert suppressed: {reason}")
        })
    }
}
