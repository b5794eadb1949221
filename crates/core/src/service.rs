use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An integration: the tenant a webhook URL's `integration_key` resolves to.
///
/// A disabled service rejects webhooks exactly as an unknown key does, so a
/// leaked key can be cut off without deleting history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub name: String,
    /// Opaque credential embedded in the webhook URL path.
    pub integration_key: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

const fn default_enabled() -> bool {
    true
}

impl Service {
    /// Create an enabled service with a generated id.
    #[must_use]
    pub fn new(name: impl Into<String>, integration_key: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            integration_key: integration_key.into(),
            enabled: true,
        }
    }

    /// Disable the service.
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_creation() {
        let svc = Service::new("payments", "key-123");
        assert_eq!(svc.name, "payments");
        assert_eq!(svc.integration_key, "key-123");
        assert!(svc.enabled);
        assert!(!svc.id.is_empty());
    }

    #[test]
    fn disabled_builder() {
        let svc = Service::new("old", "key").disabled();
        assert!(!svc.enabled);
    }
}
