use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;

use crate::error::StoreError;
use crate::idempotency::IdempotencyStore;

/// In-memory [`IdempotencyStore`].
///
/// Expired entries are treated as absent on access; the periodic cleanup
/// sweep reclaims their memory.
#[derive(Debug, Default)]
pub struct MemoryIdempotencyStore {
    entries: DashMap<String, Instant>,
}

impl MemoryIdempotencyStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries, including not-yet-reclaimed expired ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no entries are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl IdempotencyStore for MemoryIdempotencyStore {
    async fn check_and_set(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        let now = Instant::now();
        // Drop an expired entry first so the key can be claimed again.
        self.entries.remove_if(key, |_, expires_at| *expires_at <= now);

        // The entry API makes the claim atomic under contention.
        let was_inserted = match self.entries.entry(key.to_owned()) {
            dashmap::mapref::entry::Entry::Occupied(_) => false,
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(now + ttl);
                true
            }
        };
        Ok(was_inserted)
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.entries.remove(key).is_some())
    }

    async fn cleanup_expired(&self) -> Result<u64, StoreError> {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, expires_at| *expires_at > now);
        Ok(before.saturating_sub(self.entries.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn first_claim_wins() {
        let store = MemoryIdempotencyStore::new();
        assert!(store.check_and_set("k1", Duration::from_secs(60)).await.unwrap());
        assert!(!store.check_and_set("k1", Duration::from_secs(60)).await.unwrap());
    }

    #[tokio::test]
    async fn delete_allows_reclaim() {
        let store = MemoryIdempotencyStore::new();
        store.check_and_set("k1", Duration::from_secs(60)).await.unwrap();
        assert!(store.delete("k1").await.unwrap());
        assert!(!store.delete("k1").await.unwrap());
        assert!(store.check_and_set("k1", Duration::from_secs(60)).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entries_can_be_reclaimed() {
        let store = MemoryIdempotencyStore::new();
        store.check_and_set("k1", Duration::from_secs(1)).await.unwrap();

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(
            store.check_and_set("k1", Duration::from_secs(1)).await.unwrap(),
            "expired key is claimable again"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cleanup_removes_only_expired() {
        let store = MemoryIdempotencyStore::new();
        store.check_and_set("old", Duration::from_secs(1)).await.unwrap();
        store.check_and_set("new", Duration::from_secs(120)).await.unwrap();

        tokio::time::advance(Duration::from_secs(5)).await;
        let removed = store.cleanup_expired().await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_claims_yield_exactly_one_winner() {
        let store = Arc::new(MemoryIdempotencyStore::new());
        let mut handles = Vec::new();
        for _ in 0..32 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .check_and_set("shared", Duration::from_secs(60))
                    .await
                    .unwrap()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}
