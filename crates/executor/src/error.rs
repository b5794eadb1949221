use thiserror::Error;

/// Failure raised by an action handler.
///
/// The variant decides retryability: downstream faults are worth retrying,
/// configuration problems never are.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// A required action parameter is missing or empty. Never retried.
    #[error("missing configuration: {0}")]
    MissingConfig(String),

    /// An external dependency failed transiently. Retried with backoff.
    #[error("downstream failure: {0}")]
    Downstream(String),

    /// The handler refused the action for a permanent reason. Never
    /// retried.
    #[error("rejected: {0}")]
    Rejected(String),
}

impl HandlerError {
    /// Whether the executor may retry after this error.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Downstream(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryability_per_variant() {
        assert!(!HandlerError::MissingConfig("team_id".into()).is_retryable());
        assert!(HandlerError::Downstream("http 503".into()).is_retryable());
        assert!(!HandlerError::Rejected("unknown schedule".into()).is_retryable());
    }
}
