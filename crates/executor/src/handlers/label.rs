use std::sync::Arc;

use async_trait::async_trait;

use alertflow_core::{ActionKind, Alert, RouteAction};
use alertflow_store::AlertStore;

use crate::context::ActionContext;
use crate::error::HandlerError;
use crate::registry::ActionHandler;

/// Handler for SET_LABEL: merges labels into the stored alert. Local and
/// never retryable.
pub struct SetLabelHandler {
    alerts: Arc<dyn AlertStore>,
}

impl SetLabelHandler {
    pub fn new(alerts: Arc<dyn AlertStore>) -> Self {
        Self { alerts }
    }
}

#[async_trait]
impl ActionHandler for SetLabelHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::SetLabel
    }

    async fn execute(
        &self,
        _ctx: &ActionContext,
        alert: &Alert,
        action: &RouteAction,
    ) -> Result<String, HandlerError> {
        let RouteAction::SetLabel {
            labels,
            overwrite_existing,
        } = action
        else {
            return Err(HandlerError::Rejected("not a SET_LABEL action".into()));
        };
        if labels.is_empty() {
            return Err(HandlerError::MissingConfig("labels must not be empty".into()));
        }

        self.alerts
            .merge_labels(&alert.id, labels, *overwrite_existing)
            .await
            .map_err(|e| HandlerError::Rejected(format!("label merge failed: {e}")))?;

        Ok(format!("set {} label(s)", labels.len()))
    }
}
