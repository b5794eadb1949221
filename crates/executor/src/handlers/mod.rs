//! The built-in action handlers and the collaborator contracts they call.
//!
//! Notification channels, escalation scheduling, ticket providers, and
//! aggregation flushing are external concerns; each handler talks to them
//! through a trait, and tracing-backed defaults keep a bare deployment
//! functional.

pub mod aggregate;
pub mod escalate;
pub mod label;
pub mod notify;
pub mod suppress;
pub mod ticket;

use std::sync::Arc;

use alertflow_store::AlertStore;

use crate::registry::HandlerRegistry;

pub use aggregate::{AggregateHandler, Aggregator, CountingAggregator};
pub use escalate::{EscalateHandler, Escalator, LogEscalator};
pub use label::SetLabelHandler;
pub use notify::{
    LogNotifier, Notifier, NotifyChannelHandler, NotifyOncallHandler, NotifyTeamHandler,
    NotifyUserHandler,
};
pub use suppress::SuppressHandler;
pub use ticket::{CreateTicketHandler, LogTicketCreator, TicketCreator, TicketRequest};

/// Build a registry with every built-in handler wired to the given
/// collaborators. Called once at startup.
#[must_use]
pub fn default_registry(
    alerts: Arc<dyn AlertStore>,
    notifier: Arc<dyn Notifier>,
    escalator: Arc<dyn Escalator>,
    tickets: Arc<dyn TicketCreator>,
    aggregator: Arc<dyn Aggregator>,
) -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    registry.register(Arc::new(NotifyTeamHandler::new(Arc::clone(&notifier))));
    registry.register(Arc::new(NotifyChannelHandler::new(Arc::clone(&notifier))));
    registry.register(Arc::new(NotifyUserHandler::new(Arc::clone(&notifier))));
    registry.register(Arc::new(NotifyOncallHandler::new(notifier)));
    registry.register(Arc::new(SuppressHandler::new(Arc::clone(&alerts))));
    registry.register(Arc::new(AggregateHandler::new(aggregator)));
    registry.register(Arc::new(EscalateHandler::new(escalator)));
    registry.register(Arc::new(CreateTicketHandler::new(tickets)));
    registry.register(Arc::new(SetLabelHandler::new(alerts)));
    registry
}

#[cfg(test)]
mod tests {
    use alertflow_store::MemoryAlertStore;

    use super::*;

    #[test]
    fn default_registry_covers_every_kind() {
        let registry = default_registry(
            Arc::new(MemoryAlertStore::new()),
            Arc::new(LogNotifier),
            Arc::new(LogEscalator),
            Arc::new(LogTicketCreator),
            Arc::new(CountingAggregator::new()),
        );
        assert_eq!(registry.len(), 9);
    }
}
