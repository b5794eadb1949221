use async_trait::async_trait;

use alertflow_core::RoutingRule;

use crate::error::StoreError;

/// Persistence contract for routing rules.
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// All rules configured for a service, in no particular order; the
    /// rule engine applies the `(priority, created_at)` ordering itself.
    async fn rules_for_service(&self, service_id: &str) -> Result<Vec<RoutingRule>, StoreError>;
}
