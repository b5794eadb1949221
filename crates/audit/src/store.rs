use async_trait::async_trait;

use crate::error::AuditError;
use crate::record::AuditRecord;

/// Storage contract for audit records.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Persist a record.
    async fn record(&self, record: AuditRecord) -> Result<(), AuditError>;

    /// Records for an alert id, newest first.
    async fn list_by_alert(&self, alert_id: &str) -> Result<Vec<AuditRecord>, AuditError>;

    /// Records for an alert fingerprint, newest first.
    async fn list_by_fingerprint(
        &self,
        fingerprint: &str,
    ) -> Result<Vec<AuditRecord>, AuditError>;

    /// Remove records older than the retention window. Returns the number
    /// removed.
    async fn cleanup_older_than(
        &self,
        cutoff: chrono::DateTime<chrono::Utc>,
    ) -> Result<u64, AuditError>;
}
