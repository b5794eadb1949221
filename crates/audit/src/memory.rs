use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::error::AuditError;
use crate::record::AuditRecord;
use crate::store::AuditStore;

/// In-memory [`AuditStore`] for tests and single-node deployments.
#[derive(Debug, Default)]
pub struct MemoryAuditStore {
    records: DashMap<String, AuditRecord>,
}

impl MemoryAuditStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` when no records are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn collect_sorted(&self, filter: impl Fn(&AuditRecord) -> bool) -> Vec<AuditRecord> {
        let mut matching: Vec<AuditRecord> = self
            .records
            .iter()
            .filter(|entry| filter(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        matching
    }
}

#[async_trait]
impl AuditStore for MemoryAuditStore {
    async fn record(&self, record: AuditRecord) -> Result<(), AuditError> {
        self.records.insert(record.id.clone(), record);
        Ok(())
    }

    async fn list_by_alert(&self, alert_id: &str) -> Result<Vec<AuditRecord>, AuditError> {
        Ok(self.collect_sorted(|r| r.alert_id == alert_id))
    }

    async fn list_by_fingerprint(
        &self,
        fingerprint: &str,
    ) -> Result<Vec<AuditRecord>, AuditError> {
        Ok(self.collect_sorted(|r| r.alert_fingerprint == fingerprint))
    }

    async fn cleanup_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, AuditError> {
        let before = self.records.len();
        self.records.retain(|_, record| record.timestamp >= cutoff);
        Ok(u64::try_from(before.saturating_sub(self.records.len())).unwrap_or(u64::MAX))
    }
}
