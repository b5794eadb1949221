use async_trait::async_trait;
use dashmap::DashMap;

use alertflow_core::Service;

use crate::error::StoreError;
use crate::service::ServiceStore;

/// In-memory [`ServiceStore`] keyed by integration key.
#[derive(Debug, Default)]
pub struct MemoryServiceStore {
    by_key: DashMap<String, Service>,
}

impl MemoryServiceStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service under its integration key.
    pub fn insert(&self, service: Service) {
        self.by_key.insert(service.integration_key.clone(), service);
    }
}

#[async_trait]
impl ServiceStore for MemoryServiceStore {
    async fn find_by_integration_key(&self, key: &str) -> Result<Option<Service>, StoreError> {
        Ok(self.by_key.get(key).map(|e| e.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lookup_by_integration_key() {
        let store = MemoryServiceStore::new();
        store.insert(Service::new("payments", "key-abc"));

        let found = store
            .find_by_integration_key("key-abc")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.name, "payments");

        assert!(store.find_by_integration_key("nope").await.unwrap().is_none());
    }
}
