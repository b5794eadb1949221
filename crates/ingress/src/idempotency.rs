//! The idempotency gate: at-most-once webhook processing.

use std::sync::Arc;
use std::time::Duration;

use sha2::{Digest, Sha256};
use tracing::warn;

use alertflow_store::IdempotencyStore;

/// Default time-to-live for idempotency keys: 24 hours.
pub const DEFAULT_IDEMPOTENCY_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Derive the idempotency key for a request.
///
/// A client-supplied `X-Idempotency-Key` header wins, prefixed with the
/// integration key so tenants cannot collide; otherwise the key is the
/// SHA-256 of `integration_key || ":" || body`. A client that sends an
/// explicitly empty header opts out: `None` bypasses the gate (no
/// idempotency guarantee for that request).
#[must_use]
pub fn derive_idempotency_key(
    integration_key: &str,
    header: Option<&str>,
    body: &[u8],
) -> Option<String> {
    match header {
        Some(client_id) if !client_id.is_empty() => {
            Some(format!("{integration_key}:{client_id}"))
        }
        Some(_) => None,
        None => {
            let mut hasher = Sha256::new();
            hasher.update(integration_key.as_bytes());
            hasher.update(b":");
            hasher.update(body);
            Some(hex::encode(hasher.finalize()))
        }
    }
}

/// What the gate decided about a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// First sighting; processing may proceed.
    Admitted,
    /// The key was seen within its TTL; reject with a conflict.
    Duplicate,
    /// No key could be derived; the gate does not apply.
    Bypassed,
}

/// Check-and-set gate over an [`IdempotencyStore`].
pub struct IdempotencyGate {
    store: Arc<dyn IdempotencyStore>,
    ttl: Duration,
    delete_key_on_error: bool,
}

impl IdempotencyGate {
    /// Create a gate with the given TTL.
    #[must_use]
    pub fn new(store: Arc<dyn IdempotencyStore>, ttl: Duration, delete_key_on_error: bool) -> Self {
        Self {
            store,
            ttl,
            delete_key_on_error,
        }
    }

    /// Admit or reject a request by its derived key.
    ///
    /// A storage error is logged and the request admitted: availability is
    /// preferred over strict dedup.
    pub async fn admit(&self, key: Option<&str>) -> GateOutcome {
        let Some(key) = key else {
            return GateOutcome::Bypassed;
        };

        match self.store.check_and_set(key, self.ttl).await {
            Ok(true) => GateOutcome::Admitted,
            Ok(false) => GateOutcome::Duplicate,
            Err(err) => {
                warn!(error = %err, "idempotency store unavailable, admitting request");
                GateOutcome::Admitted
            }
        }
    }

    /// Release a key after a server-side failure so the client can safely
    /// retry. No-op unless `delete_key_on_error` is configured.
    pub async fn release_on_error(&self, key: Option<&str>) {
        if !self.delete_key_on_error {
            return;
        }
        let Some(key) = key else { return };
        if let Err(err) = self.store.delete(key).await {
            warn!(error = %err, "failed to release idempotency key");
        }
    }
}

impl std::fmt::Debug for IdempotencyGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdempotencyGate")
            .field("ttl", &self.ttl)
            .field("delete_key_on_error", &self.delete_key_on_error)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use alertflow_store::{MemoryIdempotencyStore, StoreError};
    use async_trait::async_trait;

    use super::*;

    fn gate(delete_on_error: bool) -> IdempotencyGate {
        IdempotencyGate::new(
            Arc::new(MemoryIdempotencyStore::new()),
            Duration::from_secs(60),
            delete_on_error,
        )
    }

    #[test]
    fn header_key_is_prefixed_with_integration_key() {
        let key = derive_idempotency_key("int-1", Some("req-42"), b"body").unwrap();
        assert_eq!(key, "int-1:req-42");
    }

    #[test]
    fn body_hash_key_is_stable_and_tenant_scoped() {
        let a = derive_idempotency_key("int-1", None, b"body").unwrap();
        let b = derive_idempotency_key("int-1", None, b"body").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);

        let other_tenant = derive_idempotency_key("int-2", None, b"body").unwrap();
        assert_ne!(a, other_tenant);

        let other_body = derive_idempotency_key("int-1", None, b"other").unwrap();
        assert_ne!(a, other_body);
    }

    #[test]
    fn empty_header_bypasses_the_gate() {
        assert!(derive_idempotency_key("int-1", Some(""), b"body").is_none());
    }

    #[tokio::test]
    async fn first_request_admitted_second_duplicate() {
        let gate = gate(false);
        let key = derive_idempotency_key("int-1", None, b"body");
        assert_eq!(gate.admit(key.as_deref()).await, GateOutcome::Admitted);
        assert_eq!(gate.admit(key.as_deref()).await, GateOutcome::Duplicate);
    }

    #[tokio::test]
    async fn missing_key_bypasses() {
        let gate = gate(false);
        assert_eq!(gate.admit(None).await, GateOutcome::Bypassed);
        assert_eq!(gate.admit(None).await, GateOutcome::Bypassed);
    }

    #[tokio::test]
    async fn release_allows_retry_when_enabled() {
        let gate = gate(true);
        let key = derive_idempotency_key("int-1", None, b"body");
        gate.admit(key.as_deref()).await;
        gate.release_on_error(key.as_deref()).await;
        assert_eq!(gate.admit(key.as_deref()).await, GateOutcome::Admitted);
    }

    #[tokio::test]
    async fn release_is_noop_when_disabled() {
        let gate = gate(false);
        let key = derive_idempotency_key("int-1", None, b"body");
        gate.admit(key.as_deref()).await;
        gate.release_on_error(key.as_deref()).await;
        assert_eq!(gate.admit(key.as_deref()).await, GateOutcome::Duplicate);
    }

    #[tokio::test]
    async fn store_errors_admit_the_request() {
        struct BrokenStore;

        #[async_trait]
        impl IdempotencyStore for BrokenStore {
            async fn check_and_set(&self, _: &str, _: Duration) -> Result<bool, StoreError> {
                Err(StoreError::Backend("down".into()))
            }
            async fn delete(&self, _: &str) -> Result<bool, StoreError> {
                Err(StoreError::Backend("down".into()))
            }
            async fn cleanup_expired(&self) -> Result<u64, StoreError> {
                Ok(0)
            }
        }

        let gate = IdempotencyGate::new(Arc::new(BrokenStore), Duration::from_secs(60), true);
        assert_eq!(gate.admit(Some("k")).await, GateOutcome::Admitted);
        // release logs but does not panic.
        gate.release_on_error(Some("k")).await;
    }
}
