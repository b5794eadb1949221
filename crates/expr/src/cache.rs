//! Bounded LRU cache of compiled expressions.
//!
//! Reads are shared: a hit takes the read lock and bumps per-entry atomic
//! counters. Compilation is single-flight: a miss re-checks under the write
//! lock and compiles while holding it, so concurrent `get_or_compile` calls
//! for the same source compile exactly once and observe the same entry.
//! Compilation failures are never cached.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use chrono::{DateTime, TimeZone, Utc};
use parking_lot::RwLock;

use crate::error::ExprError;
use crate::program::{CompiledExpression, compile};

/// Default capacity used when a cache is created with capacity 0.
pub const DEFAULT_CACHE_CAPACITY: usize = 1000;

/// A cached compilation. Shared read-only by concurrent evaluators; only
/// the access-tracking counters mutate after publication.
#[derive(Debug)]
pub struct CacheEntry {
    expression: String,
    program: CompiledExpression,
    hit_count: AtomicU64,
    created_at: DateTime<Utc>,
    last_access_ms: AtomicI64,
    /// Monotonic access sequence used for strict LRU ordering; wall-clock
    /// milliseconds alone cannot break ties.
    last_tick: AtomicU64,
}

impl CacheEntry {
    fn new(program: CompiledExpression, tick: u64) -> Self {
        let now = Utc::now();
        Self {
            expression: program.source().to_owned(),
            program,
            hit_count: AtomicU64::new(0),
            created_at: now,
            last_access_ms: AtomicI64::new(now.timestamp_millis()),
            last_tick: AtomicU64::new(tick),
        }
    }

    /// The source string this entry was compiled from.
    #[must_use]
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// The compiled program.
    #[must_use]
    pub fn program(&self) -> &CompiledExpression {
        &self.program
    }

    /// Number of cache hits served by this entry (the initial insert does
    /// not count).
    #[must_use]
    pub fn hit_count(&self) -> u64 {
        self.hit_count.load(Ordering::Relaxed)
    }

    /// When the entry was compiled and inserted.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// When the entry was last returned from the cache.
    #[must_use]
    pub fn last_access(&self) -> DateTime<Utc> {
        let ms = self.last_access_ms.load(Ordering::Relaxed);
        Utc.timestamp_millis_opt(ms).single().unwrap_or(self.created_at)
    }

    fn record_hit(&self, tick: u64) {
        self.hit_count.fetch_add(1, Ordering::Relaxed);
        self.touch(tick);
    }

    fn touch(&self, tick: u64) {
        self.last_tick.store(tick, Ordering::Relaxed);
        self.last_access_ms
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }
}

/// Point-in-time statistics snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub size: usize,
    pub capacity: usize,
    pub total_hits: u64,
    pub oldest_access: Option<DateTime<Utc>>,
    pub newest_access: Option<DateTime<Utc>>,
}

/// Bounded LRU cache mapping expression sources to compiled programs.
pub struct ExpressionCache {
    entries: RwLock<HashMap<String, Arc<CacheEntry>>>,
    capacity: usize,
    clock: AtomicU64,
    compilations: AtomicU64,
}

impl ExpressionCache {
    /// Create a cache with the given capacity. A capacity of 0 selects
    /// [`DEFAULT_CACHE_CAPACITY`]; there is no unbounded mode.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = if capacity == 0 {
            DEFAULT_CACHE_CAPACITY
        } else {
            capacity
        };
        Self {
            entries: RwLock::new(HashMap::new()),
            capacity,
            clock: AtomicU64::new(0),
            compilations: AtomicU64::new(0),
        }
    }

    fn next_tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Look up a cached entry, updating its access tracking on a hit.
    #[must_use]
    pub fn get(&self, expression: &str) -> Option<Arc<CacheEntry>> {
        let entries = self.entries.read();
        let entry = entries.get(expression)?;
        entry.record_hit(self.next_tick());
        Some(Arc::clone(entry))
    }

    /// Return the cached entry for `expression`, compiling and inserting it
    /// on a miss.
    ///
    /// Exactly one compilation happens per source even under concurrent
    /// contention; callers that lose the race observe the winner's entry as
    /// a hit. A compilation failure is returned without caching anything.
    pub fn get_or_compile(&self, expression: &str) -> Result<Arc<CacheEntry>, ExprError> {
        if let Some(entry) = self.get(expression) {
            return Ok(entry);
        }

        let mut entries = self.entries.write();
        // Double-check: another caller may have compiled while we waited.
        if let Some(entry) = entries.get(expression) {
            entry.record_hit(self.next_tick());
            return Ok(Arc::clone(entry));
        }

        let program = compile(expression)?;
        self.compilations.fetch_add(1, Ordering::Relaxed);
        Ok(self.insert_locked(&mut entries, program))
    }

    /// Insert a pre-compiled program, replacing any existing entry for the
    /// same source.
    pub fn put(&self, program: CompiledExpression) -> Arc<CacheEntry> {
        let mut entries = self.entries.write();
        self.insert_locked(&mut entries, program)
    }

    /// Remove an entry. Returns `true` if it existed.
    pub fn delete(&self, expression: &str) -> bool {
        self.entries.write().remove(expression).is_some()
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Current number of cached entries.
    #[must_use]
    pub fn size(&self) -> usize {
        self.entries.read().len()
    }

    /// Configured capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of compilations performed by [`ExpressionCache::get_or_compile`].
    #[must_use]
    pub fn compilations(&self) -> u64 {
        self.compilations.load(Ordering::Relaxed)
    }

    /// Snapshot statistics.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.read();
        let total_hits = entries.values().map(|e| e.hit_count()).sum();
        let oldest_access = entries.values().map(|e| e.last_access()).min();
        let newest_access = entries.values().map(|e| e.last_access()).max();
        CacheStats {
            size: entries.len(),
            capacity: self.capacity,
            total_hits,
            oldest_access,
            newest_access,
        }
    }

    /// Cached source strings, most recently used first.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let entries = self.entries.read();
        let mut keyed: Vec<(u64, String)> = entries
            .iter()
            .map(|(k, e)| (e.last_tick.load(Ordering::Relaxed), k.clone()))
            .collect();
        keyed.sort_by(|a, b| b.0.cmp(&a.0));
        keyed.into_iter().map(|(_, k)| k).collect()
    }

    /// Insert under the already-held write lock, evicting the least
    /// recently used entries when the cache is full.
    fn insert_locked(
        &self,
        entries: &mut HashMap<String, Arc<CacheEntry>>,
        program: CompiledExpression,
    ) -> Arc<CacheEntry> {
        let key = program.source().to_owned();
        if !entries.contains_key(&key) {
            while entries.len() >= self.capacity {
                let lru_key = entries
                    .iter()
                    .min_by_key(|(_, e)| e.last_tick.load(Ordering::Relaxed))
                    .map(|(k, _)| k.clone());
                match lru_key {
                    Some(k) => {
                        entries.remove(&k);
                    }
                    None => break,
                }
            }
        }
        let entry = Arc::new(CacheEntry::new(program, self.next_tick()));
        entries.insert(key, Arc::clone(&entry));
        entry
    }
}

impl std::fmt::Debug for ExpressionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpressionCache")
            .field("size", &self.size())
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(i: usize) -> String {
        format!("severityLevel(alert_severity) >= {i}")
    }

    #[test]
    fn zero_capacity_selects_default() {
        let cache = ExpressionCache::new(0);
        assert_eq!(cache.capacity(), DEFAULT_CACHE_CAPACITY);
    }

    #[test]
    fn get_or_compile_caches_and_counts_hits() {
        let cache = ExpressionCache::new(10);
        let first = cache.get_or_compile(&expr(1)).unwrap();
        assert_eq!(first.hit_count(), 0);
        assert_eq!(cache.size(), 1);

        let second = cache.get_or_compile(&expr(1)).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.hit_count(), 1);
        assert_eq!(cache.compilations(), 1);
    }

    #[test]
    fn compile_failures_are_not_cached() {
        let cache = ExpressionCache::new(10);
        assert!(cache.get_or_compile("1 + + 2").is_err());
        assert_eq!(cache.size(), 0);
        // Retrying fails again (and recompiles) rather than serving a bad entry.
        assert!(cache.get_or_compile("1 + + 2").is_err());
    }

    #[test]
    fn lru_eviction_removes_oldest_access() {
        let cache = ExpressionCache::new(3);
        for i in 1..=3 {
            cache.get_or_compile(&expr(i)).unwrap();
        }
        // Touch 1 so 2 becomes the least recently used.
        cache.get(&expr(1)).unwrap();
        cache.get_or_compile(&expr(4)).unwrap();

        assert_eq!(cache.size(), 3);
        assert!(cache.get(&expr(2)).is_none(), "LRU entry should be evicted");
        assert!(cache.get(&expr(1)).is_some());
        assert!(cache.get(&expr(4)).is_some());
    }

    #[test]
    fn keys_are_mru_first() {
        let cache = ExpressionCache::new(10);
        cache.get_or_compile(&expr(1)).unwrap();
        cache.get_or_compile(&expr(2)).unwrap();
        cache.get_or_compile(&expr(3)).unwrap();
        cache.get(&expr(1)).unwrap();

        let keys = cache.keys();
        assert_eq!(keys[0], expr(1));
        assert_eq!(keys[1], expr(3));
        assert_eq!(keys[2], expr(2));
    }

    #[test]
    fn delete_and_clear() {
        let cache = ExpressionCache::new(10);
        cache.get_or_compile(&expr(1)).unwrap();
        assert!(cache.delete(&expr(1)));
        assert!(!cache.delete(&expr(1)));

        cache.get_or_compile(&expr(2)).unwrap();
        cache.clear();
        assert_eq!(cache.size(), 0);
    }

    #[test]
    fn stats_snapshot() {
        let cache = ExpressionCache::new(10);
        cache.get_or_compile(&expr(1)).unwrap();
        cache.get(&expr(1)).unwrap();
        cache.get(&expr(1)).unwrap();
        cache.get_or_compile(&expr(2)).unwrap();

        let stats = cache.stats();
        assert_eq!(stats.size, 2);
        assert_eq!(stats.capacity, 10);
        assert_eq!(stats.total_hits, 2);
        assert!(stats.oldest_access.is_some());
        assert!(stats.newest_access >= stats.oldest_access);
    }

    #[test]
    fn put_replaces_existing_entry() {
        let cache = ExpressionCache::new(10);
        cache.get_or_compile(&expr(1)).unwrap();
        let program = compile(&expr(1)).unwrap();
        let entry = cache.put(program);
        assert_eq!(entry.hit_count(), 0);
        assert_eq!(cache.size(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_get_or_compile_is_single_flight() {
        let cache = Arc::new(ExpressionCache::new(10));
        let source = "alert_labels[\"severity\"] == \"critical\"";

        let mut handles = Vec::new();
        for _ in 0..50 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                cache.get_or_compile(source).unwrap()
            }));
        }

        let mut entries = Vec::new();
        for handle in handles {
            entries.push(handle.await.unwrap());
        }

        // All 50 callers observe the same entry, compiled exactly once.
        for entry in &entries {
            assert!(Arc::ptr_eq(entry, &entries[0]));
        }
        assert_eq!(cache.compilations(), 1);

        let stats = cache.stats();
        assert_eq!(stats.size, 1);
        assert_eq!(stats.total_hits, 49);
    }
}
