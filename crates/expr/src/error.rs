use thiserror::Error;

/// Errors produced by the expression engine.
#[derive(Debug, Clone, Error)]
pub enum ExprError {
    /// The source failed to parse or type-check, or its result type is not
    /// boolean. The message carries the parser/checker diagnostic.
    #[error("invalid expression: {0}")]
    InvalidExpression(String),

    /// The program raised during evaluation (e.g. division by zero).
    #[error("evaluation failed: {0}")]
    EvaluationFailed(String),

    /// The runtime result of a program was not a boolean.
    #[error("type error: {0}")]
    TypeError(String),
}
