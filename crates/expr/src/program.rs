use serde::{Deserialize, Serialize};

use crate::activation::Activation;
use crate::ast::Expr;
use crate::error::ExprError;
use crate::eval::eval;
use crate::parser::parse_expr;
use crate::typecheck::check_boolean;
use crate::value::Value;

/// An immutable compiled expression: the source string plus its typed AST.
///
/// Compilation has already proven the result type boolean, so
/// [`CompiledExpression::evaluate`] can only fail on the arithmetic faults
/// the type system does not rule out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompiledExpression {
    source: String,
    ast: Expr,
}

impl CompiledExpression {
    /// The original source string.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The compiled AST.
    #[must_use]
    pub fn ast(&self) -> &Expr {
        &self.ast
    }

    /// Evaluate the program against an activation.
    ///
    /// Returns [`ExprError::EvaluationFailed`] if the program raises and
    /// [`ExprError::TypeError`] if the runtime result is not a boolean.
    pub fn evaluate(&self, activation: &Activation) -> Result<bool, ExprError> {
        match eval(&self.ast, activation)? {
            Value::Bool(b) => Ok(b),
            other => Err(ExprError::TypeError(format!(
                "expression produced {} instead of a boolean",
                other.type_name()
            ))),
        }
    }
}

/// Compile a source string into a [`CompiledExpression`].
///
/// Fails with [`ExprError::InvalidExpression`] if the syntax is ill-formed
/// or the result type is not boolean; the message carries the parser or
/// checker diagnostic.
pub fn compile(source: &str) -> Result<CompiledExpression, ExprError> {
    let ast = parse_expr(source)?;
    check_boolean(&ast)?;
    Ok(CompiledExpression {
        source: source.to_owned(),
        ast,
    })
}
