use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use alertflow_audit::{AuditRecord, AuditStore};
use alertflow_core::{ActionResult, Alert};
use alertflow_executor::{ActionContext, ActionExecutor};
use alertflow_rules::{RuleEngine, RuleEvaluation};
use alertflow_store::{AlertStore, RuleStore};

use crate::context::ContextResolver;
use crate::error::GatewayError;

/// Result of pushing one alert through the pipeline.
#[derive(Debug)]
pub struct ProcessedAlert {
    /// The stored alert (post-upsert, so ids are final).
    pub alert: Alert,
    /// Whether the upsert created a new alert (`false` = updated).
    pub created: bool,
    /// Per-rule evaluation records.
    pub evaluations: Vec<RuleEvaluation>,
    /// Per-action execution results.
    pub results: Vec<ActionResult>,
}

/// The central pipeline: dedup upsert, rule evaluation, action execution,
/// audit.
pub struct Gateway {
    pub(crate) alerts: Arc<dyn AlertStore>,
    pub(crate) rules: Arc<dyn RuleStore>,
    pub(crate) audit: Option<Arc<dyn AuditStore>>,
    pub(crate) engine: RuleEngine,
    pub(crate) executor: ActionExecutor,
    pub(crate) resolver: Arc<dyn ContextResolver>,
}

impl Gateway {
    /// The rule engine (and through it the expression engine/cache).
    #[must_use]
    pub fn engine(&self) -> &RuleEngine {
        &self.engine
    }

    /// The action executor.
    #[must_use]
    pub fn executor(&self) -> &ActionExecutor {
        &self.executor
    }

    /// Process one normalized alert end to end.
    ///
    /// Action failures never fail the pipeline; they are captured in the
    /// per-action results and the audit record. Only storage faults on the
    /// upsert/rule-load path error out.
    #[instrument(skip_all, fields(alert.fingerprint = %alert.fingerprint, service = %alert.service_id))]
    pub async fn process(
        &self,
        alert: Alert,
        cancel: CancellationToken,
    ) -> Result<ProcessedAlert, GatewayError> {
        let started = Instant::now();

        let (stored, created) = self.alerts.create_or_update(alert).await?;
        debug!(alert.id = %stored.id, created, "alert upserted");

        let rules = self.rules.rules_for_service(&stored.service_id).await?;
        let resolved = self.resolver.resolve(&stored).await;
        let outcome = self.engine.evaluate(
            &rules,
            &stored,
            resolved.site.as_ref(),
            resolved.customer.as_ref(),
            Utc::now(),
        );

        let ctx = ActionContext::with_cancel(cancel);
        let results = self
            .executor
            .execute_all(&ctx, &stored, &outcome.actions)
            .await;

        if let Some(audit) = &self.audit {
            let record = AuditRecord::for_alert(&stored)
                .with_evaluations(outcome.evaluations.clone())
                .with_executions(results.clone())
                .with_processing_time(started.elapsed());
            // Best-effort: audit loss must not fail alert acknowledgment.
            if let Err(err) = audit.record(record).await {
                warn!(alert.id = %stored.id, error = %err, "failed to write audit record");
            }
        }

        Ok(ProcessedAlert {
            alert: stored,
            created,
            evaluations: outcome.evaluations,
            results,
        })
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("audit_enabled", &self.audit.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use alertflow_audit::MemoryAuditStore;
    use alertflow_core::{
        AlertSource, Condition, MatchOperator, RouteAction, RoutingRule, Severity,
    };
    use alertflow_store::{MemoryAlertStore, MemoryRuleStore};

    use crate::builder::GatewayBuilder;

    use super::*;

    struct Fixture {
        gateway: Gateway,
        alerts: Arc<MemoryAlertStore>,
        rules: Arc<MemoryRuleStore>,
        audit: Arc<MemoryAuditStore>,
    }

    fn fixture() -> Fixture {
        let alerts = Arc::new(MemoryAlertStore::new());
        let rules = Arc::new(MemoryRuleStore::new());
        let audit = Arc::new(MemoryAuditStore::new());
        let gateway = GatewayBuilder::new()
            .alerts(Arc::clone(&alerts) as Arc<dyn AlertStore>)
            .rules(Arc::clone(&rules) as Arc<dyn RuleStore>)
            .audit(Arc::clone(&audit) as Arc<dyn AuditStore>)
            .build()
            .unwrap();
        Fixture {
            gateway,
            alerts,
            rules,
            audit,
        }
    }

    fn critical_alert() -> Alert {
        Alert::new("svc-1", "fp-1", "db down", AlertSource::Generic)
            .with_severity(Severity::Critical)
            .with_labels(HashMap::from([(
                "severity".to_owned(),
                "critical".to_owned(),
            )]))
    }

    #[tokio::test]
    async fn full_pipeline_match_and_dispatch() {
        let fx = fixture();
        fx.rules.insert(
            "svc-1",
            RoutingRule::new("critical-to-ops")
                .with_priority(1)
                .with_condition(Condition::label(
                    "severity",
                    MatchOperator::Equals,
                    "critical",
                ))
                .with_action(RouteAction::notify_team("ops")),
        );

        let processed = fx
            .gateway
            .process(critical_alert(), CancellationToken::new())
            .await
            .unwrap();

        assert!(processed.created);
        assert_eq!(processed.evaluations.len(), 1);
        assert!(processed.evaluations[0].matched);
        assert_eq!(processed.results.len(), 1);
        assert!(processed.results[0].success);

        // The audit record mirrors the outcome.
        let records = fx.audit.list_by_alert(&processed.alert.id).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].evaluations.len(), 1);
        assert_eq!(records[0].executions.len(), 1);
        assert_eq!(records[0].alert_fingerprint, "fp-1");
    }

    #[tokio::test]
    async fn second_arrival_updates_in_place() {
        let fx = fixture();
        let first = fx
            .gateway
            .process(critical_alert(), CancellationToken::new())
            .await
            .unwrap();
        assert!(first.created);

        let second = fx
            .gateway
            .process(critical_alert(), CancellationToken::new())
            .await
            .unwrap();
        assert!(!second.created);
        assert_eq!(second.alert.id, first.alert.id);
        assert_eq!(fx.alerts.len(), 1);
    }

    #[tokio::test]
    async fn no_rules_means_no_actions() {
        let fx = fixture();
        let processed = fx
            .gateway
            .process(critical_alert(), CancellationToken::new())
            .await
            .unwrap();
        assert!(processed.evaluations.is_empty());
        assert!(processed.results.is_empty());
    }

    #[tokio::test]
    async fn action_failure_does_not_fail_the_pipeline() {
        let fx = fixture();
        fx.rules.insert(
            "svc-1",
            RoutingRule::new("broken-action")
                .with_condition(Condition::label(
                    "severity",
                    MatchOperator::Equals,
                    "critical",
                ))
                // Missing team_id: a permanent handler failure.
                .with_action(RouteAction::NotifyTeam {
                    team_id: String::new(),
                    scope: None,
                    template_id: None,
                }),
        );

        let processed = fx
            .gateway
            .process(critical_alert(), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(processed.results.len(), 1);
        assert!(!processed.results[0].success);
        assert!(!processed.results[0].retryable);

        let records = fx.audit.list_by_fingerprint("fp-1").await.unwrap();
        assert!(!records[0].executions[0].success);
    }

    #[tokio::test]
    async fn terminal_rule_short_circuits_later_rules() {
        let fx = fixture();
        fx.rules.insert(
            "svc-1",
            RoutingRule::new("first")
                .with_priority(1)
                .with_terminal(true)
                .with_condition(Condition::label(
                    "severity",
                    MatchOperator::Equals,
                    "critical",
                ))
                .with_action(RouteAction::notify_team("ops")),
        );
        fx.rules.insert(
            "svc-1",
            RoutingRule::new("second")
                .with_priority(2)
                .with_action(RouteAction::notify_team("fallback")),
        );

        let processed = fx
            .gateway
            .process(critical_alert(), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(processed.evaluations.len(), 1);
        assert_eq!(processed.results.len(), 1);
        assert_eq!(processed.results[0].message, "notified team ops");
    }
}
