use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use alertflow_core::{ActionKind, Alert, RouteAction};

use crate::context::ActionContext;
use crate::error::HandlerError;

/// The uniform handler contract: one handler per action kind.
///
/// On success the handler returns a human-readable outcome message (e.g.
/// the created ticket id); the executor wraps it into an
/// [`alertflow_core::ActionResult`] together with timing and retry
/// metadata.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// The action kind this handler serves.
    fn kind(&self) -> ActionKind;

    /// Execute the action against the alert.
    async fn execute(
        &self,
        ctx: &ActionContext,
        alert: &Alert,
        action: &RouteAction,
    ) -> Result<String, HandlerError>;
}

/// Lookup table from action kind to handler.
///
/// Registration happens once at startup; afterwards the registry is shared
/// immutably, so reads need no lock.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<ActionKind, Arc<dyn ActionHandler>>,
}

impl HandlerRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under its kind, replacing any previous one.
    pub fn register(&mut self, handler: Arc<dyn ActionHandler>) {
        self.handlers.insert(handler.kind(), handler);
    }

    /// Look up the handler for a kind.
    #[must_use]
    pub fn lookup(&self, kind: ActionKind) -> Option<&Arc<dyn ActionHandler>> {
        self.handlers.get(&kind)
    }

    /// Registered kinds.
    #[must_use]
    pub fn kinds(&self) -> Vec<ActionKind> {
        self.handlers.keys().copied().collect()
    }

    /// Number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` when no handlers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopHandler(ActionKind);

    #[async_trait]
    impl ActionHandler for NoopHandler {
        fn kind(&self) -> ActionKind {
            self.0
        }

        async fn execute(
            &self,
            _ctx: &ActionContext,
            _alert: &Alert,
            _action: &RouteAction,
        ) -> Result<String, HandlerError> {
            Ok("ok".to_owned())
        }
    }

    #[test]
    fn register_and_lookup() {
        let mut registry = HandlerRegistry::new();
        assert!(registry.is_empty());

        registry.register(Arc::new(NoopHandler(ActionKind::Suppress)));
        assert_eq!(registry.len(), 1);
        assert!(registry.lookup(ActionKind::Suppress).is_some());
        assert!(registry.lookup(ActionKind::Escalate).is_none());
    }

    #[test]
    fn later_registration_replaces() {
        let mut registry = HandlerRegistry::new();
        registry.register(Arc::new(NoopHandler(ActionKind::Suppress)));
        registry.register(Arc::new(NoopHandler(ActionKind::Suppress)));
        assert_eq!(registry.len(), 1);
    }
}
