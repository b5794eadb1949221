use std::collections::HashMap;

use async_trait::async_trait;

use alertflow_core::{Alert, AlertStatus};

use crate::error::StoreError;

/// Persistence contract for alerts.
///
/// Implementations must be `Send + Sync` and uphold the dedup invariant:
/// at most one live alert per `(service_id, fingerprint)` pair.
#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Upsert an alert by its `(service_id, fingerprint)` identity.
    ///
    /// If a live alert with the same pair exists it is updated in place
    /// (keeping its id) and `false` is returned; otherwise the alert is
    /// created and `true` is returned. The stored alert is returned either
    /// way.
    async fn create_or_update(&self, alert: Alert) -> Result<(Alert, bool), StoreError>;

    /// Fetch an alert by id.
    async fn get(&self, id: &str) -> Result<Option<Alert>, StoreError>;

    /// Fetch the live alert for a `(service_id, fingerprint)` pair.
    async fn get_by_fingerprint(
        &self,
        service_id: &str,
        fingerprint: &str,
    ) -> Result<Option<Alert>, StoreError>;

    /// Change an alert's status (used by the SUPPRESS action).
    async fn set_status(&self, id: &str, status: AlertStatus) -> Result<(), StoreError>;

    /// Merge labels into an alert (used by the SET_LABEL action). Existing
    /// keys are kept unless `overwrite` is set.
    async fn merge_labels(
        &self,
        id: &str,
        labels: &HashMap<String, String>,
        overwrite: bool,
    ) -> Result<(), StoreError>;
}
