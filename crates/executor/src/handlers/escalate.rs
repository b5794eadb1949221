use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use alertflow_core::{ActionKind, Alert, RouteAction};

use crate::context::ActionContext;
use crate::error::HandlerError;
use crate::registry::ActionHandler;

/// Contract for the escalation policy scheduler.
#[async_trait]
pub trait Escalator: Send + Sync {
    /// Start an escalation policy for an alert.
    async fn escalate(
        &self,
        policy_id: &str,
        start_at_step: u32,
        urgent: bool,
        alert: &Alert,
    ) -> Result<(), HandlerError>;
}

/// Default escalator that records escalations in the log stream.
pub struct LogEscalator;

#[async_trait]
impl Escalator for LogEscalator {
    async fn escalate(
        &self,
        policy_id: &str,
        start_at_step: u32,
        urgent: bool,
        alert: &Alert,
    ) -> Result<(), HandlerError> {
        info!(
            policy_id,
            start_at_step,
            urgent,
            alert.id = %alert.id,
            "escalation started"
        );
        Ok(())
    }
}

/// Handler for ESCALATE.
pub struct EscalateHandler {
    escalator: Arc<dyn Escalator>,
}

impl EscalateHandler {
    pub fn new(escalator: Arc<dyn Escalator>) -> Self {
        Self { escalator }
    }
}

#[async_trait]
impl ActionHandler for EscalateHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::Escalate
    }

    async fn execute(
        &self,
        _ctx: &ActionContext,
        alert: &Alert,
        action: &RouteAction,
    ) -> Result<String, HandlerError> {
        let RouteAction::Escalate {
            escalation_policy_id,
            start_at_step,
            urgent,
        } = action
        else {
            return Err(HandlerError::Rejected("not an ESCALATE action".into()));
        };
        if escalation_policy_id.is_empty() {
            return Err(HandlerError::MissingConfig(
                "escalation_policy_id is required".into(),
            ));
        }

        self.escalator
            .escalate(escalation_policy_id, *start_at_step, *urgent, alert)
            .await?;
        Ok(format!("escalation {escalation_policy_id} started"))
    }
}

#[cfg(test)]
mod tests {
    use alertflow_core::AlertSource;

    use super::*;

    fn alert() -> Alert {
        Alert::new("svc", "fp", "summary", AlertSource::Generic)
    }

    #[tokio::test]
    async fn missing_policy_id_is_a_config_error() {
        let handler = EscalateHandler::new(Arc::new(LogEscalator));
        let action = RouteAction::Escalate {
            escalation_policy_id: String::new(),
            start_at_step: 0,
            urgent: false,
        };
        let err = handler
            .execute(&ActionContext::new(), &alert(), &action)
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::MissingConfig(_)));
    }

    #[tokio::test]
    async fn escalation_runs() {
        let handler = EscalateHandler::new(Arc::new(LogEscalator));
        let action = RouteAction::Escalate {
            escalation_policy_id: "p-1".into(),
            start_at_step: 2,
            urgent: true,
        };
        let message = handler
            .execute(&ActionContext::new(), &alert(), &action)
            .await
            .unwrap();
        assert!(message.contains("p-1"));
    }
}
