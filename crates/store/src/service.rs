use async_trait::async_trait;

use alertflow_core::Service;

use crate::error::StoreError;

/// Lookup contract for integrations.
#[async_trait]
pub trait ServiceStore: Send + Sync {
    /// Resolve an integration key to its service. Returns `None` for
    /// unknown keys; callers treat disabled services as unknown.
    async fn find_by_integration_key(&self, key: &str) -> Result<Option<Service>, StoreError>;
}
