use async_trait::async_trait;
use dashmap::DashMap;

use alertflow_core::RoutingRule;

use crate::error::StoreError;
use crate::rule::RuleStore;

/// In-memory [`RuleStore`] keyed by service id.
#[derive(Debug, Default)]
pub struct MemoryRuleStore {
    by_service: DashMap<String, Vec<RoutingRule>>,
}

impl MemoryRuleStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule for a service.
    pub fn insert(&self, service_id: &str, rule: RoutingRule) {
        self.by_service
            .entry(service_id.to_owned())
            .or_default()
            .push(rule);
    }

    /// Replace every rule of a service.
    pub fn set_rules(&self, service_id: &str, rules: Vec<RoutingRule>) {
        self.by_service.insert(service_id.to_owned(), rules);
    }
}

#[async_trait]
impl RuleStore for MemoryRuleStore {
    async fn rules_for_service(&self, service_id: &str) -> Result<Vec<RoutingRule>, StoreError> {
        Ok(self
            .by_service
            .get(service_id)
            .map(|e| e.value().clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_and_list() {
        let store = MemoryRuleStore::new();
        store.insert("svc-1", RoutingRule::new("a"));
        store.insert("svc-1", RoutingRule::new("b"));
        store.insert("svc-2", RoutingRule::new("c"));

        let rules = store.rules_for_service("svc-1").await.unwrap();
        assert_eq!(rules.len(), 2);
        assert!(store.rules_for_service("svc-3").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn set_rules_replaces() {
        let store = MemoryRuleStore::new();
        store.insert("svc-1", RoutingRule::new("old"));
        store.set_rules("svc-1", vec![RoutingRule::new("new")]);

        let rules = store.rules_for_service("svc-1").await.unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].name, "new");
    }
}
