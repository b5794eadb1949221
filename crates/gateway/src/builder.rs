use std::sync::Arc;

use alertflow_audit::AuditStore;
use alertflow_executor::handlers::{
    Aggregator, CountingAggregator, Escalator, LogEscalator, LogNotifier, LogTicketCreator,
    Notifier, TicketCreator, default_registry,
};
use alertflow_executor::{ActionExecutor, ExecutorConfig};
use alertflow_expr::ExpressionEngine;
use alertflow_rules::RuleEngine;
use alertflow_store::{AlertStore, RuleStore};

use crate::context::{ContextResolver, NoopContextResolver};
use crate::error::GatewayError;
use crate::gateway::Gateway;

/// Builder for [`Gateway`].
///
/// Alert and rule stores are required; everything else has a working
/// default (tracing-backed collaborators, no audit, no enrichment, default
/// executor config and cache capacity).
pub struct GatewayBuilder {
    alerts: Option<Arc<dyn AlertStore>>,
    rules: Option<Arc<dyn RuleStore>>,
    audit: Option<Arc<dyn AuditStore>>,
    resolver: Arc<dyn ContextResolver>,
    notifier: Arc<dyn Notifier>,
    escalator: Arc<dyn Escalator>,
    tickets: Arc<dyn TicketCreator>,
    aggregator: Arc<dyn Aggregator>,
    executor_config: ExecutorConfig,
    expression_cache_capacity: usize,
}

impl GatewayBuilder {
    /// Start a builder with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            alerts: None,
            rules: None,
            audit: None,
            resolver: Arc::new(NoopContextResolver),
            notifier: Arc::new(LogNotifier),
            escalator: Arc::new(LogEscalator),
            tickets: Arc::new(LogTicketCreator),
            aggregator: Arc::new(CountingAggregator::new()),
            executor_config: ExecutorConfig::default(),
            expression_cache_capacity: 0,
        }
    }

    /// Set the alert store (required).
    #[must_use]
    pub fn alerts(mut self, alerts: Arc<dyn AlertStore>) -> Self {
        self.alerts = Some(alerts);
        self
    }

    /// Set the rule store (required).
    #[must_use]
    pub fn rules(mut self, rules: Arc<dyn RuleStore>) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Enable the audit trail.
    #[must_use]
    pub fn audit(mut self, audit: Arc<dyn AuditStore>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Set the site/customer context resolver.
    #[must_use]
    pub fn resolver(mut self, resolver: Arc<dyn ContextResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Set the notification driver.
    #[must_use]
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Set the escalation driver.
    #[must_use]
    pub fn escalator(mut self, escalator: Arc<dyn Escalator>) -> Self {
        self.escalator = escalator;
        self
    }

    /// Set the ticket provider.
    #[must_use]
    pub fn tickets(mut self, tickets: Arc<dyn TicketCreator>) -> Self {
        self.tickets = tickets;
        self
    }

    /// Set the aggregation buffer.
    #[must_use]
    pub fn aggregator(mut self, aggregator: Arc<dyn Aggregator>) -> Self {
        self.aggregator = aggregator;
        self
    }

    /// Set the executor configuration.
    #[must_use]
    pub fn executor_config(mut self, config: ExecutorConfig) -> Self {
        self.executor_config = config;
        self
    }

    /// Set the expression cache capacity (0 selects the default).
    #[must_use]
    pub fn expression_cache_capacity(mut self, capacity: usize) -> Self {
        self.expression_cache_capacity = capacity;
        self
    }

    /// Build the gateway.
    pub fn build(self) -> Result<Gateway, GatewayError> {
        let alerts = self
            .alerts
            .ok_or_else(|| GatewayError::Configuration("alert store is required".into()))?;
        let rules = self
            .rules
            .ok_or_else(|| GatewayError::Configuration("rule store is required".into()))?;

        let expressions = Arc::new(ExpressionEngine::new(self.expression_cache_capacity));
        let engine = RuleEngine::new(expressions);

        let registry = default_registry(
            Arc::clone(&alerts),
            self.notifier,
            self.escalator,
            self.tickets,
            self.aggregator,
        );
        let executor = ActionExecutor::new(registry, self.executor_config);

        Ok(Gateway {
            alerts,
            rules,
            audit: self.audit,
            engine,
            executor,
            resolver: self.resolver,
        })
    }
}

impl Default for GatewayBuilder {
    fn default() -> Self {
        Self::new()
    }
}
