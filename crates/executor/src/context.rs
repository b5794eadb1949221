use tokio_util::sync::CancellationToken;

/// Per-dispatch execution context.
///
/// Carries the cancellation token that flows through the whole pipeline;
/// the executor observes it during retry delays and handlers may observe it
/// around long external calls.
#[derive(Debug, Clone)]
pub struct ActionContext {
    cancel: CancellationToken,
}

impl ActionContext {
    /// A context with its own root cancellation token.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cancel: CancellationToken::new(),
        }
    }

    /// A context driven by an existing token (e.g. the request's).
    #[must_use]
    pub fn with_cancel(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    /// The cancellation token.
    #[must_use]
    pub fn cancel(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Whether the dispatch has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Default for ActionContext {
    fn default() -> Self {
        Self::new()
    }
}
