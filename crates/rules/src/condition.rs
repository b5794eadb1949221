use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use alertflow_core::{Alert, Condition, ConditionKind, MatchOperator, Matcher};
use alertflow_expr::{Activation, ExpressionEngine};

/// Outcome of evaluating one condition, kept for the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionResult {
    pub kind: ConditionKind,
    /// Label/annotation key, or the expression source for EXPRESSION.
    pub field: String,
    /// Display string for what the condition wanted.
    pub expected: String,
    /// The value actually extracted from the alert (or the expression
    /// outcome/diagnostic).
    pub actual: String,
    pub matched: bool,
}

/// Evaluates a single condition against an alert.
///
/// A total function over the `(kind, operator)` product: every combination
/// yields a match/no-match result, never an error. Expression conditions
/// delegate to the expression engine; a failed compilation is a no-match
/// that records the diagnostic.
pub struct ConditionEvaluator<'a> {
    engine: &'a ExpressionEngine,
}

impl<'a> ConditionEvaluator<'a> {
    /// Create an evaluator borrowing the shared expression engine.
    #[must_use]
    pub fn new(engine: &'a ExpressionEngine) -> Self {
        Self { engine }
    }

    /// Evaluate one condition against an alert.
    ///
    /// The `activation` must have been built from the same alert; it is
    /// passed in so one binding serves every condition of a rule set.
    #[must_use]
    pub fn evaluate(
        &self,
        condition: &Condition,
        alert: &Alert,
        activation: &Activation,
    ) -> ConditionResult {
        let kind = condition.kind();

        if let Condition::Expression(expr) = condition {
            return self.evaluate_expression(&expr.expression, activation);
        }

        // Every non-expression kind carries a matcher.
        let Some(matcher) = condition.matcher() else {
            return ConditionResult {
                kind,
                field: String::new(),
                expected: String::new(),
                actual: String::new(),
                matched: false,
            };
        };

        let (actual, present) = extract(kind, matcher, alert);
        let matched = apply_operator(matcher, &actual, present);

        ConditionResult {
            kind,
            field: matcher.field.clone(),
            expected: expected_display(matcher),
            actual,
            matched,
        }
    }

    fn evaluate_expression(&self, source: &str, activation: &Activation) -> ConditionResult {
        let (matched, actual) = match self.engine.evaluate(source, activation) {
            Ok(result) => (result, result.to_string()),
            Err(err) => {
                debug!(expression = source, error = %err, "expression condition failed");
                (false, err.to_string())
            }
        };
        ConditionResult {
            kind: ConditionKind::Expression,
            field: source.to_owned(),
            expected: "true".to_owned(),
            actual,
            matched,
        }
    }
}

/// Extract the value a condition kind reads from an alert.
///
/// Returns the extracted string and, for the keyed kinds, whether the key
/// was actually present (the EXISTS operators distinguish an absent label
/// from an empty one).
fn extract(kind: ConditionKind, matcher: &Matcher, alert: &Alert) -> (String, bool) {
    let from_labels = |keys: &[&str]| -> (String, bool) {
        for key in keys {
            if let Some(v) = alert.label(key) {
                return (v.to_owned(), true);
            }
        }
        (String::new(), false)
    };

    match kind {
        ConditionKind::Label => match alert.labels.get(&matcher.field) {
            Some(v) => (v.clone(), true),
            None => (String::new(), false),
        },
        ConditionKind::Annotation => match alert.annotations.get(&matcher.field) {
            Some(v) => (v.clone(), true),
            None => (String::new(), false),
        },
        ConditionKind::Severity => match alert.label("severity") {
            Some(v) if !v.is_empty() => (v.to_owned(), true),
            _ => ("unknown".to_owned(), true),
        },
        ConditionKind::Source => (alert.source.as_str().to_owned(), true),
        ConditionKind::Service => (alert.service_id.clone(), true),
        ConditionKind::Site => from_labels(&["site", "datacenter"]),
        ConditionKind::Pop => from_labels(&["pop"]),
        ConditionKind::CustomerTier => from_labels(&["customer_tier", "tier"]),
        ConditionKind::EquipmentType => from_labels(&["equipment_type", "device_type"]),
        ConditionKind::Carrier => from_labels(&["carrier", "asn"]),
        ConditionKind::Expression => (String::new(), false),
    }
}

/// Apply a matcher's operator to the extracted value.
fn apply_operator(matcher: &Matcher, actual: &str, present: bool) -> bool {
    match matcher.operator {
        MatchOperator::Equals => actual == matcher.string_value,
        MatchOperator::NotEquals => actual != matcher.string_value,
        MatchOperator::Contains => actual.contains(&matcher.string_value),
        MatchOperator::NotContains => !actual.contains(&matcher.string_value),
        MatchOperator::StartsWith => actual.starts_with(&matcher.string_value),
        MatchOperator::EndsWith => actual.ends_with(&matcher.string_value),
        MatchOperator::Regex => {
            let pattern = effective_pattern(matcher);
            // A pattern that does not compile is a no-match, not an error.
            Regex::new(pattern).is_ok_and(|re| re.is_match(actual))
        }
        MatchOperator::In => matcher.string_list.iter().any(|v| v == actual),
        MatchOperator::NotIn => !matcher.string_list.iter().any(|v| v == actual),
        MatchOperator::Exists => present || !actual.is_empty(),
        MatchOperator::NotExists => !(present || !actual.is_empty()),
        MatchOperator::GreaterThan => ordered(actual, &matcher.string_value).is_gt(),
        MatchOperator::LessThan => ordered(actual, &matcher.string_value).is_lt(),
    }
}

/// Order two values numerically when both parse as signed 64-bit integers,
/// lexicographically otherwise.
fn ordered(actual: &str, expected: &str) -> std::cmp::Ordering {
    match (actual.parse::<i64>(), expected.parse::<i64>()) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        _ => actual.cmp(expected),
    }
}

fn effective_pattern(matcher: &Matcher) -> &str {
    if matcher.regex_pattern.is_empty() {
        &matcher.string_value
    } else {
        &matcher.regex_pattern
    }
}

/// Display string for the condition's expectation, derived from the
/// operator.
fn expected_display(matcher: &Matcher) -> String {
    match matcher.operator {
        MatchOperator::In | MatchOperator::NotIn => matcher.string_list.join(", "),
        MatchOperator::Regex => effective_pattern(matcher).to_owned(),
        MatchOperator::Exists | MatchOperator::NotExists => "exists".to_owned(),
        _ => matcher.string_value.clone(),
    }
}
