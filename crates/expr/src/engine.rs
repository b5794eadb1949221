use std::sync::Arc;

use crate::activation::Activation;
use crate::cache::{CacheEntry, ExpressionCache};
use crate::error::ExprError;
use crate::program::compile;

/// The expression engine: an explicit evaluator value that owns its cache.
///
/// Construct one per deployment (or per test) and share it via `Arc`; there
/// is no process-global state.
#[derive(Debug)]
pub struct ExpressionEngine {
    cache: ExpressionCache,
}

impl ExpressionEngine {
    /// Create an engine whose cache holds up to `capacity` compiled
    /// programs (0 selects the default capacity).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: ExpressionCache::new(capacity),
        }
    }

    /// Validate an expression without touching the cache.
    ///
    /// This is the admin-path check used when rules are created: a failure
    /// here is a validation error, whereas the same failure at evaluation
    /// time is just a non-matching condition.
    pub fn validate(&self, source: &str) -> Result<(), ExprError> {
        compile(source).map(|_| ())
    }

    /// Evaluate an expression against an activation, compiling through the
    /// cache on first use.
    pub fn evaluate(&self, source: &str, activation: &Activation) -> Result<bool, ExprError> {
        let entry = self.cache.get_or_compile(source)?;
        entry.program().evaluate(activation)
    }

    /// Fetch (or compile) the cache entry for an expression.
    pub fn get_or_compile(&self, source: &str) -> Result<Arc<CacheEntry>, ExprError> {
        self.cache.get_or_compile(source)
    }

    /// The underlying cache, for stats and admin surfaces.
    #[must_use]
    pub fn cache(&self) -> &ExpressionCache {
        &self.cache
    }
}

impl Default for ExpressionEngine {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use alertflow_core::{Alert, AlertSource, Severity};
    use chrono::Utc;

    use super::*;

    fn activation() -> Activation {
        let alert = Alert::new("svc", "fp", "summary", AlertSource::Generic)
            .with_severity(Severity::Critical)
            .with_labels(HashMap::from([(
                "severity".to_owned(),
                "critical".to_owned(),
            )]));
        Activation::for_alert(&alert, None, None, Utc::now())
    }

    #[test]
    fn evaluate_compiles_through_the_cache() {
        let engine = ExpressionEngine::new(10);
        let source = "alert_severity == \"critical\"";
        assert!(engine.evaluate(source, &activation()).unwrap());
        assert!(engine.evaluate(source, &activation()).unwrap());
        assert_eq!(engine.cache().size(), 1);
        assert_eq!(engine.cache().compilations(), 1);
    }

    #[test]
    fn validate_does_not_populate_the_cache() {
        let engine = ExpressionEngine::new(10);
        engine.validate("alert_severity == \"critical\"").unwrap();
        assert_eq!(engine.cache().size(), 0);
        assert!(engine.validate("not a valid ++ expression").is_err());
    }

    #[test]
    fn isolated_engines_have_isolated_caches() {
        let a = ExpressionEngine::new(10);
        let b = ExpressionEngine::new(10);
        a.evaluate("true", &activation()).unwrap();
        assert_eq!(a.cache().size(), 1);
        assert_eq!(b.cache().size(), 0);
    }
}
