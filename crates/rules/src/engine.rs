use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use alertflow_core::{Alert, RouteAction, RoutingRule};
use alertflow_expr::{Activation, CustomerContext, ExpressionEngine, SiteContext};

use crate::condition::{ConditionEvaluator, ConditionResult};
use crate::time_window::time_condition_matches;

/// Per-rule evaluation record for the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleEvaluation {
    pub rule_id: String,
    pub rule_name: String,
    pub priority: i32,
    /// Whether the time condition admitted the rule (true when absent).
    pub time_matched: bool,
    /// Results for every condition, in input order.
    pub condition_results: Vec<ConditionResult>,
    /// Whether the rule as a whole matched.
    pub matched: bool,
}

/// The result of evaluating a rule set against one alert: the ordered
/// per-rule records plus the concatenated actions of the matching rules up
/// to and including the first terminal match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationOutcome {
    pub evaluations: Vec<RuleEvaluation>,
    pub actions: Vec<RouteAction>,
}

impl EvaluationOutcome {
    /// Names of the rules that matched, in evaluation order.
    #[must_use]
    pub fn matched_rules(&self) -> Vec<&str> {
        self.evaluations
            .iter()
            .filter(|e| e.matched)
            .map(|e| e.rule_name.as_str())
            .collect()
    }
}

/// Evaluates routing rules against alerts.
///
/// The engine itself is stateless apart from the expression engine it
/// borrows; rules are passed per call because they are loaded per service.
pub struct RuleEngine {
    expressions: std::sync::Arc<ExpressionEngine>,
}

impl RuleEngine {
    /// Create an engine sharing the given expression engine.
    #[must_use]
    pub fn new(expressions: std::sync::Arc<ExpressionEngine>) -> Self {
        Self { expressions }
    }

    /// The shared expression engine.
    #[must_use]
    pub fn expressions(&self) -> &ExpressionEngine {
        &self.expressions
    }

    /// Evaluate `rules` against `alert` at instant `now`.
    ///
    /// Rules are walked in `(priority ASC, created_at ASC)` order; disabled
    /// rules are skipped without a record. Every condition of an evaluated
    /// rule is recorded even when an earlier one already failed — only the
    /// boolean may short-circuit, never the audit record.
    #[instrument(skip_all, fields(alert.id = %alert.id, rules = rules.len()))]
    #[must_use]
    pub fn evaluate(
        &self,
        rules: &[RoutingRule],
        alert: &Alert,
        site: Option<&SiteContext>,
        customer: Option<&CustomerContext>,
        now: DateTime<Utc>,
    ) -> EvaluationOutcome {
        let activation = Activation::for_alert(alert, site, customer, now);
        let conditions = ConditionEvaluator::new(&self.expressions);

        let mut ordered: Vec<&RoutingRule> = rules.iter().filter(|r| r.enabled).collect();
        ordered.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

        let mut evaluations = Vec::new();
        let mut actions = Vec::new();

        for rule in ordered {
            let time_matched = rule
                .time_condition
                .as_ref()
                .is_none_or(|tc| time_condition_matches(tc, now));

            let condition_results: Vec<ConditionResult> = rule
                .conditions
                .iter()
                .map(|c| conditions.evaluate(c, alert, &activation))
                .collect();

            let matched = time_matched && condition_results.iter().all(|r| r.matched);

            debug!(rule = %rule.name, matched, time_matched, "rule evaluated");

            evaluations.push(RuleEvaluation {
                rule_id: rule.id.clone(),
                rule_name: rule.name.clone(),
                priority: rule.priority,
                time_matched,
                condition_results,
                matched,
            });

            if matched {
                actions.extend(rule.actions.iter().cloned());
                if rule.terminal {
                    debug!(rule = %rule.name, "terminal rule matched, stopping evaluation");
                    break;
                }
            }
        }

        EvaluationOutcome {
            evaluations,
            actions,
        }
    }
}
