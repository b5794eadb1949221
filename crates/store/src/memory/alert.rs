use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use alertflow_core::{Alert, AlertStatus};

use crate::alert::AlertStore;
use crate::error::StoreError;

/// In-memory [`AlertStore`] keyed by `(service_id, fingerprint)`.
#[derive(Debug, Default)]
pub struct MemoryAlertStore {
    /// Live alerts keyed by their dedup identity.
    by_identity: DashMap<String, Alert>,
    /// Secondary index from alert id to identity key.
    id_index: DashMap<String, String>,
}

impl MemoryAlertStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live alerts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_identity.len()
    }

    /// Returns `true` if no alerts are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_identity.is_empty()
    }

    fn identity_key(service_id: &str, fingerprint: &str) -> String {
        format!("{service_id}\u{1e}{fingerprint}")
    }

    fn with_alert_mut<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut Alert) -> T,
    ) -> Result<T, StoreError> {
        let key = self
            .id_index
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::NotFound(format!("alert {id}")))?;
        let mut alert = self
            .by_identity
            .get_mut(&key)
            .ok_or_else(|| StoreError::NotFound(format!("alert {id}")))?;
        Ok(f(alert.value_mut()))
    }
}

#[async_trait]
impl AlertStore for MemoryAlertStore {
    async fn create_or_update(&self, alert: Alert) -> Result<(Alert, bool), StoreError> {
        let key = Self::identity_key(&alert.service_id, &alert.fingerprint);

        // The entry API keeps concurrent upserts of the same pair atomic.
        match self.by_identity.entry(key.clone()) {
            dashmap::mapref::entry::Entry::Occupied(mut occupied) => {
                occupied.get_mut().absorb(alert);
                Ok((occupied.get().clone(), false))
            }
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                self.id_index.insert(alert.id.clone(), key);
                let stored = vacant.insert(alert);
                Ok((stored.clone(), true))
            }
        }
    }

    async fn get(&self, id: &str) -> Result<Option<Alert>, StoreError> {
        let Some(key) = self.id_index.get(id).map(|e| e.value().clone()) else {
            return Ok(None);
        };
        Ok(self.by_identity.get(&key).map(|e| e.value().clone()))
    }

    async fn get_by_fingerprint(
        &self,
        service_id: &str,
        fingerprint: &str,
    ) -> Result<Option<Alert>, StoreError> {
        let key = Self::identity_key(service_id, fingerprint);
        Ok(self.by_identity.get(&key).map(|e| e.value().clone()))
    }

    async fn set_status(&self, id: &str, status: AlertStatus) -> Result<(), StoreError> {
        self.with_alert_mut(id, |alert| {
            alert.status = status;
            if status == AlertStatus::Resolved {
                if alert.resolved_at.is_none() {
                    alert.resolved_at = Some(Utc::now());
                }
            } else {
                alert.resolved_at = None;
            }
        })
    }

    async fn merge_labels(
        &self,
        id: &str,
        labels: &HashMap<String, String>,
        overwrite: bool,
    ) -> Result<(), StoreError> {
        self.with_alert_mut(id, |alert| {
            for (key, value) in labels {
                if overwrite || !alert.labels.contains_key(key) {
                    alert.labels.insert(key.clone(), value.clone());
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use alertflow_core::{AlertSource, Severity};

    use super::*;

    fn alert(fingerprint: &str) -> Alert {
        Alert::new("svc-1", fingerprint, "summary", AlertSource::Generic)
    }

    #[tokio::test]
    async fn create_then_update_same_fingerprint() {
        let store = MemoryAlertStore::new();

        let (first, created) = store.create_or_update(alert("fp-1")).await.unwrap();
        assert!(created);

        let update = alert("fp-1").with_severity(Severity::Critical);
        let (second, created) = store.create_or_update(update).await.unwrap();
        assert!(!created);
        assert_eq!(second.id, first.id, "identity is preserved on update");
        assert_eq!(second.severity, Severity::Critical);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn distinct_fingerprints_are_distinct_alerts() {
        let store = MemoryAlertStore::new();
        store.create_or_update(alert("fp-1")).await.unwrap();
        store.create_or_update(alert("fp-2")).await.unwrap();
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn same_fingerprint_different_service_is_distinct() {
        let store = MemoryAlertStore::new();
        store.create_or_update(alert("fp-1")).await.unwrap();
        let other = Alert::new("svc-2", "fp-1", "summary", AlertSource::Generic);
        let (_, created) = store.create_or_update(other).await.unwrap();
        assert!(created);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn lookup_by_id_and_fingerprint() {
        let store = MemoryAlertStore::new();
        let (stored, _) = store.create_or_update(alert("fp-1")).await.unwrap();

        let by_id = store.get(&stored.id).await.unwrap().unwrap();
        assert_eq!(by_id.fingerprint, "fp-1");

        let by_fp = store
            .get_by_fingerprint("svc-1", "fp-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_fp.id, stored.id);

        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_status_tracks_resolved_at() {
        let store = MemoryAlertStore::new();
        let (stored, _) = store.create_or_update(alert("fp-1")).await.unwrap();

        store
            .set_status(&stored.id, AlertStatus::Resolved)
            .await
            .unwrap();
        let resolved = store.get(&stored.id).await.unwrap().unwrap();
        assert!(resolved.resolved_at.is_some());

        store
            .set_status(&stored.id, AlertStatus::Suppressed)
            .await
            .unwrap();
        let suppressed = store.get(&stored.id).await.unwrap().unwrap();
        assert_eq!(suppressed.status, AlertStatus::Suppressed);
        assert!(suppressed.resolved_at.is_none());

        let err = store.set_status("missing", AlertStatus::Resolved).await;
        assert!(matches!(err, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn merge_labels_respects_overwrite_flag() {
        let store = MemoryAlertStore::new();
        let seed = alert("fp-1").with_labels(HashMap::from([(
            "env".to_owned(),
            "prod".to_owned(),
        )]));
        let (stored, _) = store.create_or_update(seed).await.unwrap();

        let patch = HashMap::from([
            ("env".to_owned(), "staging".to_owned()),
            ("team".to_owned(), "ops".to_owned()),
        ]);

        store.merge_labels(&stored.id, &patch, false).await.unwrap();
        let merged = store.get(&stored.id).await.unwrap().unwrap();
        assert_eq!(merged.labels["env"], "prod", "kept without overwrite");
        assert_eq!(merged.labels["team"], "ops");

        store.merge_labels(&stored.id, &patch, true).await.unwrap();
        let merged = store.get(&stored.id).await.unwrap().unwrap();
        assert_eq!(merged.labels["env"], "staging");
    }
}
