use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use alertflow_core::{ActionKind, Alert, RouteAction};

use crate::context::ActionContext;
use crate::error::HandlerError;
use crate::registry::ActionHandler;

/// Everything a ticket provider needs to open a ticket for an alert.
#[derive(Debug)]
pub struct TicketRequest<'a> {
    pub provider_id: &'a str,
    pub project_key: &'a str,
    pub ticket_type: &'a str,
    pub template_id: Option<&'a str>,
    pub fields: &'a HashMap<String, String>,
    pub alert: &'a Alert,
}

/// Contract for ticket providers.
#[async_trait]
pub trait TicketCreator: Send + Sync {
    /// Open a ticket and return its provider-assigned id.
    async fn create_ticket(&self, request: TicketRequest<'_>) -> Result<String, HandlerError>;
}

/// Default provider that fabricates a ticket id and logs the request.
pub struct LogTicketCreator;

#[async_trait]
impl TicketCreator for LogTicketCreator {
    async fn create_ticket(&self, request: TicketRequest<'_>) -> Result<String, HandlerError> {
        let ticket_id = format!(
            "{}-{}",
            request.project_key,
            &Uuid::new_v4().simple().to_string()[..8]
        );
        info!(
            provider_id = request.provider_id,
            project_key = request.project_key,
            ticket_type = request.ticket_type,
            alert.id = %request.alert.id,
            ticket_id,
            "ticket created"
        );
        Ok(ticket_id)
    }
}

/// Handler for CREATE_TICKET. The created ticket id is surfaced in the
/// result message.
pub struct CreateTicketHandler {
    tickets: Arc<dyn TicketCreator>,
}

impl CreateTicketHandler {
    pub fn new(tickets: Arc<dyn TicketCreator>) -> Self {
        Self { tickets }
    }
}

#[async_trait]
impl ActionHandler for CreateTicketHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::CreateTicket
    }

    async fn execute(
        &self,
        _ctx: &ActionContext,
        alert: &Alert,
        action: &RouteAction,
    ) -> Result<String, HandlerError> {
        let RouteAction::CreateTicket {
            provider_id,
            project_key,
            ticket_type,
            template_id,
            fields,
        } = action
        else {
            return Err(HandlerError::Rejected("not a CREATE_TICKET action".into()));
        };
        if provider_id.is_empty() {
            return Err(HandlerError::MissingConfig("provider_id is required".into()));
        }

        let ticket_id = self
            .tickets
            .create_ticket(TicketRequest {
                provider_id,
                project_key,
                ticket_type,
                template_id: template_id.as_deref(),
                fields,
                alert,
            })
            .await?;
        Ok(ticket_id)
    }
}
