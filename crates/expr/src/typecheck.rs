//! Static type checking for compiled expressions.
//!
//! The environment is the closed variable set of [`crate::activation`]; the
//! checker rejects unknown variables and functions, enforces operator typing,
//! and requires the whole expression to produce a boolean. Together with the
//! total builtins this guarantees that a program which compiles cannot abort
//! evaluation.

use serde::{Deserialize, Serialize};

use crate::activation::variable_type;
use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::builtins;
use crate::error::ExprError;

/// The static type of an expression node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExprType {
    Null,
    Bool,
    Int,
    Float,
    String,
    /// Unix-seconds instant; behaves as an integer in arithmetic and
    /// comparisons.
    Timestamp,
    /// A list known to hold strings.
    StringList,
    /// A `string -> string` map.
    StringMap,
    /// A list of mixed element types.
    List,
    /// Unknown static type (e.g. the two arms of a ternary disagree).
    Any,
}

impl ExprType {
    /// Return a display name for diagnostics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
            Self::Timestamp => "timestamp",
            Self::StringList => "list<string>",
            Self::StringMap => "map<string,string>",
            Self::List => "list",
            Self::Any => "any",
        }
    }

    /// Integer-like types (timestamps are unix-second ints at runtime).
    fn is_int_like(self) -> bool {
        matches!(self, Self::Int | Self::Timestamp)
    }

    /// Numeric types.
    fn is_numeric(self) -> bool {
        self.is_int_like() || self == Self::Float || self == Self::Any
    }

    fn is_list_like(self) -> bool {
        matches!(self, Self::StringList | Self::List)
    }

    fn accepts_bool(self) -> bool {
        matches!(self, Self::Bool | Self::Any)
    }
}

impl std::fmt::Display for ExprType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check an expression and require a boolean result.
pub fn check_boolean(expr: &Expr) -> Result<(), ExprError> {
    let ty = infer(expr).map_err(ExprError::InvalidExpression)?;
    if ty.accepts_bool() {
        Ok(())
    } else {
        Err(ExprError::InvalidExpression(format!(
            "expression must evaluate to a boolean, got {ty}"
        )))
    }
}

/// Infer the static type of an expression.
#[allow(clippy::too_many_lines)]
pub fn infer(expr: &Expr) -> Result<ExprType, String> {
    match expr {
        Expr::Null => Ok(ExprType::Null),
        Expr::Bool(_) => Ok(ExprType::Bool),
        Expr::Int(_) => Ok(ExprType::Int),
        Expr::Float(_) => Ok(ExprType::Float),
        Expr::String(_) => Ok(ExprType::String),

        Expr::List(items) => {
            let mut all_strings = true;
            for item in items {
                if infer(item)? != ExprType::String {
                    all_strings = false;
                }
            }
            Ok(if all_strings {
                ExprType::StringList
            } else {
                ExprType::List
            })
        }

        Expr::Ident(name) => {
            variable_type(name).ok_or_else(|| format!("unknown variable `{name}`"))
        }

        Expr::Field(base, field) => {
            let base_ty = infer(base)?;
            match base_ty {
                ExprType::StringMap => Ok(ExprType::String),
                other => Err(format!("cannot access field `{field}` on {other}")),
            }
        }

        Expr::Index(base, index) => {
            let base_ty = infer(base)?;
            let index_ty = infer(index)?;
            match base_ty {
                ExprType::StringMap => {
                    if matches!(index_ty, ExprType::String | ExprType::Any) {
                        Ok(ExprType::String)
                    } else {
                        Err(format!("map index must be a string, got {index_ty}"))
                    }
                }
                ExprType::StringList => {
                    if index_ty.is_int_like() || index_ty == ExprType::Any {
                        Ok(ExprType::String)
                    } else {
                        Err(format!("list index must be an integer, got {index_ty}"))
                    }
                }
                ExprType::List => Ok(ExprType::Any),
                other => Err(format!("cannot index into {other}")),
            }
        }

        Expr::Unary(op, inner) => {
            let inner_ty = infer(inner)?;
            match op {
                UnaryOp::Not => {
                    if inner_ty.accepts_bool() {
                        Ok(ExprType::Bool)
                    } else {
                        Err(format!("cannot negate {inner_ty} with `!`"))
                    }
                }
                UnaryOp::Neg => {
                    if inner_ty.is_numeric() {
                        Ok(if inner_ty == ExprType::Float {
                            ExprType::Float
                        } else {
                            ExprType::Int
                        })
                    } else {
                        Err(format!("cannot negate {inner_ty} with `-`"))
                    }
                }
            }
        }

        Expr::Binary(op, lhs, rhs) => {
            let left = infer(lhs)?;
            let right = infer(rhs)?;
            infer_binary(*op, left, right)
        }

        Expr::Ternary(cond, then_branch, else_branch) => {
            let cond_ty = infer(cond)?;
            if !cond_ty.accepts_bool() {
                return Err(format!("ternary condition must be a boolean, got {cond_ty}"));
            }
            let then_ty = infer(then_branch)?;
            let else_ty = infer(else_branch)?;
            Ok(if then_ty == else_ty { then_ty } else { ExprType::Any })
        }

        Expr::Call(name, args) => {
            let sig = builtins::signature(name)
                .ok_or_else(|| format!("unknown function `{name}`"))?;
            if args.len() < sig.min_args || args.len() > sig.max_args {
                return Err(format!(
                    "{name} expects {} to {} arguments, got {}",
                    sig.min_args,
                    sig.max_args,
                    args.len()
                ));
            }
            // Argument expressions must themselves be well-typed, but their
            // types are not matched against the builtin: builtins are total
            // over every runtime value.
            for arg in args {
                infer(arg)?;
            }
            Ok(sig.ret)
        }
    }
}

fn infer_binary(op: BinaryOp, left: ExprType, right: ExprType) -> Result<ExprType, String> {
    match op {
        BinaryOp::And | BinaryOp::Or => {
            if left.accepts_bool() && right.accepts_bool() {
                Ok(ExprType::Bool)
            } else {
                Err(format!("logical operator requires booleans, got {left} and {right}"))
            }
        }

        BinaryOp::Eq | BinaryOp::Ne => Ok(ExprType::Bool),

        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let numeric = left.is_numeric() && right.is_numeric();
            let strings = matches!(left, ExprType::String | ExprType::Any)
                && matches!(right, ExprType::String | ExprType::Any);
            if numeric || strings {
                Ok(ExprType::Bool)
            } else {
                Err(format!("cannot order {left} and {right}"))
            }
        }

        BinaryOp::Add => {
            if left == ExprType::String && right == ExprType::String {
                Ok(ExprType::String)
            } else {
                arithmetic_result(op, left, right)
            }
        }
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
            arithmetic_result(op, left, right)
        }

        BinaryOp::Contains => {
            let ok = matches!(left, ExprType::String | ExprType::Any) && right == ExprType::String
                || left.is_list_like()
                || left == ExprType::StringMap;
            if ok {
                Ok(ExprType::Bool)
            } else {
                Err(format!("`contains` does not apply to {left} and {right}"))
            }
        }

        BinaryOp::StartsWith | BinaryOp::EndsWith | BinaryOp::Matches => {
            let string_like = |t: ExprType| matches!(t, ExprType::String | ExprType::Any);
            if string_like(left) && string_like(right) {
                Ok(ExprType::Bool)
            } else {
                Err(format!("string predicate requires strings, got {left} and {right}"))
            }
        }

        BinaryOp::In => {
            let ok = right.is_list_like()
                || right == ExprType::Any
                || (right == ExprType::StringMap
                    && matches!(left, ExprType::String | ExprType::Any))
                || (right == ExprType::String
                    && matches!(left, ExprType::String | ExprType::Any));
            if ok {
                Ok(ExprType::Bool)
            } else {
                Err(format!("`in` requires a collection on the right, got {right}"))
            }
        }
    }
}

fn arithmetic_result(op: BinaryOp, left: ExprType, right: ExprType) -> Result<ExprType, String> {
    if !left.is_numeric() || !right.is_numeric() {
        let name = match op {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "subtract",
            BinaryOp::Mul => "multiply",
            BinaryOp::Div => "divide",
            BinaryOp::Mod => "modulo",
            _ => "combine",
        };
        return Err(format!("cannot {name} {left} and {right}"));
    }
    Ok(if left == ExprType::Float || right == ExprType::Float {
        ExprType::Float
    } else {
        ExprType::Int
    })
}
