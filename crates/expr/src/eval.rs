//! Tree-walking evaluation of compiled expressions.
//!
//! Evaluation is pure: every operator is defined over the runtime values the
//! type checker admits, and builtins are total. The only runtime failures a
//! well-typed program can produce are arithmetic faults (division by zero),
//! surfaced as [`ExprError::EvaluationFailed`].

use regex::Regex;

use crate::activation::Activation;
use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::builtins;
use crate::error::ExprError;
use crate::value::Value;

/// Recursively evaluate an expression against an activation.
pub fn eval(expr: &Expr, activation: &Activation) -> Result<Value, ExprError> {
    match expr {
        Expr::Null => Ok(Value::Null),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Int(n) => Ok(Value::Int(*n)),
        Expr::Float(f) => Ok(Value::Float(*f)),
        Expr::String(s) => Ok(Value::String(s.clone())),

        Expr::List(items) => {
            let mut result = Vec::with_capacity(items.len());
            for item in items {
                result.push(eval(item, activation)?);
            }
            Ok(Value::List(result))
        }

        Expr::Ident(name) => activation.lookup(name).cloned().ok_or_else(|| {
            // Unreachable for compiled programs: the checker rejects unknown
            // names and the activation binds every declared variable.
            ExprError::EvaluationFailed(format!("unbound variable `{name}`"))
        }),

        Expr::Field(base, field) => {
            let base_val = eval(base, activation)?;
            Ok(index_value(&base_val, &Value::String(field.clone())))
        }

        Expr::Index(base, index) => {
            let base_val = eval(base, activation)?;
            let index_val = eval(index, activation)?;
            Ok(index_value(&base_val, &index_val))
        }

        Expr::Unary(op, inner) => {
            let val = eval(inner, activation)?;
            eval_unary(*op, &val)
        }

        Expr::Binary(op, lhs, rhs) => eval_binary(*op, lhs, rhs, activation),

        Expr::Ternary(cond, then_branch, else_branch) => {
            let cond_val = eval(cond, activation)?;
            if cond_val.is_truthy() {
                eval(then_branch, activation)
            } else {
                eval(else_branch, activation)
            }
        }

        Expr::Call(name, args) => {
            let mut evaluated = Vec::with_capacity(args.len());
            for arg in args {
                evaluated.push(eval(arg, activation)?);
            }
            Ok(builtins::call(name, &evaluated))
        }
    }
}

/// Total index/field access: anything not present resolves to an empty
/// string for string containers, null otherwise.
fn index_value(base: &Value, index: &Value) -> Value {
    #[allow(clippy::cast_sign_loss)]
    match (base, index) {
        (Value::Map(map), Value::String(key)) => map
            .get(key)
            .cloned()
            .unwrap_or_else(|| Value::String(String::new())),
        (Value::List(list), Value::Int(i)) => {
            let idx = if *i < 0 {
                let Some(wrapped) = list.len().checked_sub(i.unsigned_abs() as usize) else {
                    return Value::Null;
                };
                wrapped
            } else {
                *i as usize
            };
            list.get(idx).cloned().unwrap_or(Value::Null)
        }
        _ => Value::Null,
    }
}

fn eval_unary(op: UnaryOp, val: &Value) -> Result<Value, ExprError> {
    match op {
        UnaryOp::Not => Ok(Value::Bool(!val.is_truthy())),
        UnaryOp::Neg => match val {
            Value::Int(n) => Ok(Value::Int(n.wrapping_neg())),
            Value::Float(f) => Ok(Value::Float(-f)),
            other => Err(ExprError::EvaluationFailed(format!(
                "cannot negate {}",
                other.type_name()
            ))),
        },
    }
}

/// Evaluate a binary operation with short-circuit semantics for `&&`/`||`.
#[allow(clippy::too_many_lines)]
fn eval_binary(
    op: BinaryOp,
    lhs: &Expr,
    rhs: &Expr,
    activation: &Activation,
) -> Result<Value, ExprError> {
    match op {
        BinaryOp::And => {
            let left = eval(lhs, activation)?;
            if !left.is_truthy() {
                return Ok(Value::Bool(false));
            }
            let right = eval(rhs, activation)?;
            return Ok(Value::Bool(right.is_truthy()));
        }
        BinaryOp::Or => {
            let left = eval(lhs, activation)?;
            if left.is_truthy() {
                return Ok(Value::Bool(true));
            }
            let right = eval(rhs, activation)?;
            return Ok(Value::Bool(right.is_truthy()));
        }
        _ => {}
    }

    let left = eval(lhs, activation)?;
    let right = eval(rhs, activation)?;

    #[allow(clippy::cast_precision_loss)]
    match op {
        BinaryOp::Add => match (&left, &right) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_add(*b))),
            (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a + b)),
            (Value::Int(a), Value::Float(b)) => Ok(Value::Float(*a as f64 + b)),
            (Value::Float(a), Value::Int(b)) => Ok(Value::Float(a + *b as f64)),
            (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{a}{b}"))),
            _ => Err(type_fault("add", &left, &right)),
        },
        BinaryOp::Sub => numeric_op(&left, &right, i64::wrapping_sub, |a, b| a - b, "subtract"),
        BinaryOp::Mul => numeric_op(&left, &right, i64::wrapping_mul, |a, b| a * b, "multiply"),
        BinaryOp::Div => match (&left, &right) {
            (_, Value::Int(0)) => Err(ExprError::EvaluationFailed("division by zero".into())),
            (_, Value::Float(f)) if *f == 0.0 => {
                Err(ExprError::EvaluationFailed("division by zero".into()))
            }
            _ => numeric_op(&left, &right, i64::wrapping_div, |a, b| a / b, "divide"),
        },
        BinaryOp::Mod => match (&left, &right) {
            (_, Value::Int(0)) => Err(ExprError::EvaluationFailed("modulo by zero".into())),
            _ => numeric_op(&left, &right, i64::wrapping_rem, |a, b| a % b, "modulo"),
        },

        BinaryOp::Eq => Ok(Value::Bool(left.loosely_equals(&right))),
        BinaryOp::Ne => Ok(Value::Bool(!left.loosely_equals(&right))),
        BinaryOp::Lt => compare(&left, &right, std::cmp::Ordering::is_lt),
        BinaryOp::Le => compare(&left, &right, std::cmp::Ordering::is_le),
        BinaryOp::Gt => compare(&left, &right, std::cmp::Ordering::is_gt),
        BinaryOp::Ge => compare(&left, &right, std::cmp::Ordering::is_ge),

        BinaryOp::Contains => Ok(Value::Bool(match (&left, &right) {
            (Value::String(haystack), Value::String(needle)) => {
                haystack.contains(needle.as_str())
            }
            (Value::List(list), needle) => list.iter().any(|v| v.loosely_equals(needle)),
            (Value::Map(map), Value::String(key)) => map.contains_key(key),
            _ => false,
        })),
        BinaryOp::StartsWith => Ok(Value::Bool(match (&left, &right) {
            (Value::String(s), Value::String(prefix)) => s.starts_with(prefix.as_str()),
            _ => false,
        })),
        BinaryOp::EndsWith => Ok(Value::Bool(match (&left, &right) {
            (Value::String(s), Value::String(suffix)) => s.ends_with(suffix.as_str()),
            _ => false,
        })),
        BinaryOp::Matches => Ok(Value::Bool(match (&left, &right) {
            (Value::String(s), Value::String(pattern)) => {
                Regex::new(pattern).is_ok_and(|re| re.is_match(s))
            }
            _ => false,
        })),
        BinaryOp::In => Ok(Value::Bool(match (&left, &right) {
            (needle, Value::List(list)) => list.iter().any(|v| v.loosely_equals(needle)),
            (Value::String(key), Value::Map(map)) => map.contains_key(key),
            (Value::String(sub), Value::String(s)) => s.contains(sub.as_str()),
            _ => false,
        })),

        BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
    }
}

#[allow(clippy::cast_precision_loss)]
fn numeric_op(
    left: &Value,
    right: &Value,
    int_op: fn(i64, i64) -> i64,
    float_op: fn(f64, f64) -> f64,
    op_name: &str,
) -> Result<Value, ExprError> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(int_op(*a, *b))),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(float_op(*a, *b))),
        (Value::Int(a), Value::Float(b)) => Ok(Value::Float(float_op(*a as f64, *b))),
        (Value::Float(a), Value::Int(b)) => Ok(Value::Float(float_op(*a, *b as f64))),
        _ => Err(type_fault(op_name, left, right)),
    }
}

#[allow(clippy::cast_precision_loss)]
fn compare(
    left: &Value,
    right: &Value,
    predicate: fn(std::cmp::Ordering) -> bool,
) -> Result<Value, ExprError> {
    let ordering = match (left, right) {
        (Value::Int(a), Value::Int(b)) => a.cmp(b),
        (Value::Float(a), Value::Float(b)) => {
            a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal)
        }
        (Value::Int(a), Value::Float(b)) => (*a as f64)
            .partial_cmp(b)
            .unwrap_or(std::cmp::Ordering::Equal),
        (Value::Float(a), Value::Int(b)) => a
            .partial_cmp(&(*b as f64))
            .unwrap_or(std::cmp::Ordering::Equal),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        _ => return Err(type_fault("compare", left, right)),
    };
    Ok(Value::Bool(predicate(ordering)))
}

fn type_fault(op: &str, left: &Value, right: &Value) -> ExprError {
    ExprError::EvaluationFailed(format!(
        "cannot {op} {} and {}",
        left.type_name(),
        right.type_name()
    ))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use alertflow_core::{Alert, AlertSource, Severity};
    use chrono::Utc;

    use crate::parser::parse_expr;

    use super::*;

    fn activation() -> Activation {
        let alert = Alert::new("svc-1", "fp-1", "db-01 disk full", AlertSource::Generic)
            .with_severity(Severity::Critical)
            .with_labels(HashMap::from([
                ("severity".to_owned(), "critical".to_owned()),
                ("env".to_owned(), "prod".to_owned()),
            ]));
        Activation::for_alert(&alert, None, None, Utc::now())
    }

    fn eval_src(src: &str) -> Value {
        eval(&parse_expr(src).unwrap(), &activation()).unwrap()
    }

    #[test]
    fn label_index_and_equality() {
        assert_eq!(
            eval_src("alert_labels[\"severity\"] == \"critical\""),
            Value::Bool(true)
        );
        assert_eq!(
            eval_src("alert_labels[\"missing\"] == \"\""),
            Value::Bool(true)
        );
    }

    #[test]
    fn field_access_mirrors_index() {
        assert_eq!(eval_src("alert_labels.env == \"prod\""), Value::Bool(true));
    }

    #[test]
    fn short_circuit_and_or() {
        // Division by zero on the right is never evaluated.
        assert_eq!(eval_src("false && (1 / 0 == 1)"), Value::Bool(false));
        assert_eq!(eval_src("true || (1 / 0 == 1)"), Value::Bool(true));
    }

    #[test]
    fn division_by_zero_raises() {
        let err = eval(&parse_expr("1 / 0 == 1").unwrap(), &activation()).unwrap_err();
        assert!(matches!(err, ExprError::EvaluationFailed(_)));
    }

    #[test]
    fn arithmetic_and_comparison() {
        assert_eq!(eval_src("1 + 2 * 3 == 7"), Value::Bool(true));
        assert_eq!(eval_src("10 % 3 == 1"), Value::Bool(true));
        assert_eq!(eval_src("now - alert_starts_at < 60"), Value::Bool(true));
        assert_eq!(eval_src("\"abc\" < \"abd\""), Value::Bool(true));
    }

    #[test]
    fn membership() {
        assert_eq!(
            eval_src("alert_severity in [\"critical\", \"high\"]"),
            Value::Bool(true)
        );
        assert_eq!(eval_src("\"env\" in alert_labels"), Value::Bool(true));
        assert_eq!(eval_src("\"disk\" in alert_summary"), Value::Bool(true));
    }

    #[test]
    fn method_sugar_evaluates() {
        assert_eq!(eval_src("alert_summary.startsWith(\"db-\")"), Value::Bool(true));
        assert_eq!(eval_src("alert_summary.matches(\"^db-[0-9]+\")"), Value::Bool(true));
        assert_eq!(eval_src("alert_severity.upper() == \"CRITICAL\""), Value::Bool(true));
    }

    #[test]
    fn builtin_calls_evaluate() {
        assert_eq!(
            eval_src("labelEquals(alert_labels, \"env\", \"prod\")"),
            Value::Bool(true)
        );
        assert_eq!(
            eval_src("severityAtLeast(alert_severity, \"high\")"),
            Value::Bool(true)
        );
    }

    #[test]
    fn ternary_selects_branch() {
        assert_eq!(
            eval_src("hasLabel(alert_labels, \"env\") ? true : false"),
            Value::Bool(true)
        );
    }

    #[test]
    fn absent_site_context_is_not_an_error() {
        assert_eq!(eval_src("site_available == false"), Value::Bool(true));
        assert_eq!(eval_src("site_name == \"\""), Value::Bool(true));
        assert_eq!(eval_src("customer_tier == 0"), Value::Bool(true));
    }
}
