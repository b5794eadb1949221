use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreError;

/// Atomic check-and-set store for idempotency keys.
#[async_trait]
pub trait IdempotencyStore: Send + Sync {
    /// Record `key` if it is not already live. Returns `true` if the key
    /// was newly set (this request is the first), `false` on a replay.
    ///
    /// Must be atomic: concurrent calls with the same key produce exactly
    /// one `true`.
    async fn check_and_set(&self, key: &str, ttl: Duration) -> Result<bool, StoreError>;

    /// Unconditionally remove a key (used to allow safe client retries
    /// after a 5xx). Returns `true` if the key existed.
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// Remove expired entries. Returns the number removed.
    async fn cleanup_expired(&self) -> Result<u64, StoreError>;
}
