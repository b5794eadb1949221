//! Rule validation for the admin path.
//!
//! At evaluation time a bad expression or regex is merely a non-matching
//! condition; here, where a rule author can still fix it, the same problems
//! are hard errors.

use thiserror::Error;

use alertflow_core::{Condition, MatchOperator, RoutingRule};
use alertflow_expr::ExpressionEngine;

/// A problem found in an authored rule.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// An EXPRESSION condition failed to compile.
    #[error("rule {rule}: {detail}")]
    InvalidExpression { rule: String, detail: String },

    /// A REGEX condition's pattern does not compile.
    #[error("rule {rule}: invalid regex pattern {pattern:?}: {detail}")]
    InvalidRegex {
        rule: String,
        pattern: String,
        detail: String,
    },

    /// A time window has malformed bounds or day numbers.
    #[error("rule {rule}: invalid time window: {detail}")]
    InvalidTimeWindow { rule: String, detail: String },
}

/// Validate a rule before it is accepted into a rule set.
pub fn validate_rule(
    engine: &ExpressionEngine,
    rule: &RoutingRule,
) -> Result<(), ValidationError> {
    for condition in &rule.conditions {
        match condition {
            Condition::Expression(expr) => {
                engine.validate(&expr.expression).map_err(|e| {
                    ValidationError::InvalidExpression {
                        rule: rule.name.clone(),
                        detail: e.to_string(),
                    }
                })?;
            }
            other => {
                if let Some(matcher) = other.matcher()
                    && matcher.operator == MatchOperator::Regex
                {
                    let pattern = if matcher.regex_pattern.is_empty() {
                        &matcher.string_value
                    } else {
                        &matcher.regex_pattern
                    };
                    regex::Regex::new(pattern).map_err(|e| ValidationError::InvalidRegex {
                        rule: rule.name.clone(),
                        pattern: pattern.clone(),
                        detail: e.to_string(),
                    })?;
                }
            }
        }
    }

    if let Some(tc) = &rule.time_condition {
        if tc.timezone.parse::<chrono_tz::Tz>().is_err() {
            return Err(ValidationError::InvalidTimeWindow {
                rule: rule.name.clone(),
                detail: format!("unknown timezone {:?}", tc.timezone),
            });
        }
        for window in &tc.windows {
            for bound in [&window.start_time, &window.end_time] {
                if parse_ok(bound).is_none() {
                    return Err(ValidationError::InvalidTimeWindow {
                        rule: rule.name.clone(),
                        detail: format!("malformed HH:MM bound {bound:?}"),
                    });
                }
            }
            if let Some(bad) = window.days_of_week.iter().find(|d| !(1..=7).contains(*d)) {
                return Err(ValidationError::InvalidTimeWindow {
                    rule: rule.name.clone(),
                    detail: format!("day of week {bad} outside 1..=7"),
                });
            }
        }
    }

    Ok(())
}

fn parse_ok(s: &str) -> Option<()> {
    let (h, m) = s.split_once(':')?;
    let h: u32 = h.parse().ok()?;
    let m: u32 = m.parse().ok()?;
    (h <= 23 && m <= 59).then_some(())
}

#[cfg(test)]
mod tests {
    use alertflow_core::{TimeCondition, TimeWindow};

    use super::*;

    fn engine() -> ExpressionEngine {
        ExpressionEngine::new(16)
    }

    #[test]
    fn valid_rule_passes() {
        let rule = RoutingRule::new("good")
            .with_condition(Condition::expression("alert_severity == \"critical\""))
            .with_condition(Condition::label(
                "host",
                MatchOperator::Regex,
                "^db-[0-9]+$",
            ));
        validate_rule(&engine(), &rule).unwrap();
    }

    #[test]
    fn bad_expression_is_rejected() {
        let rule =
            RoutingRule::new("bad-expr").with_condition(Condition::expression("1 + + 2"));
        let err = validate_rule(&engine(), &rule).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidExpression { .. }));
    }

    #[test]
    fn non_boolean_expression_is_rejected() {
        let rule = RoutingRule::new("non-bool")
            .with_condition(Condition::expression("alert_summary"));
        let err = validate_rule(&engine(), &rule).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("boolean"), "{msg}");
    }

    #[test]
    fn bad_regex_is_rejected() {
        let rule = RoutingRule::new("bad-re").with_condition(Condition::label(
            "host",
            MatchOperator::Regex,
            "(unclosed",
        ));
        let err = validate_rule(&engine(), &rule).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidRegex { .. }));
    }

    #[test]
    fn bad_time_windows_are_rejected() {
        let base = RoutingRule::new("tw");
        let with_tc = |tz: &str, w: TimeWindow| {
            base.clone().with_time_condition(TimeCondition {
                timezone: tz.to_owned(),
                windows: vec![w],
            })
        };

        let bad_bound = with_tc(
            "UTC",
            TimeWindow {
                days_of_week: vec![],
                start_time: "9am".into(),
                end_time: "17:00".into(),
                invert: false,
            },
        );
        assert!(validate_rule(&engine(), &bad_bound).is_err());

        let bad_day = with_tc(
            "UTC",
            TimeWindow {
                days_of_week: vec![0],
                start_time: "09:00".into(),
                end_time: "17:00".into(),
                invert: false,
            },
        );
        assert!(validate_rule(&engine(), &bad_day).is_err());

        let bad_tz = with_tc(
            "Mars/Olympus",
            TimeWindow {
                days_of_week: vec![1],
                start_time: "09:00".into(),
                end_time: "17:00".into(),
                invert: false,
            },
        );
        assert!(validate_rule(&engine(), &bad_tz).is_err());
    }
}
