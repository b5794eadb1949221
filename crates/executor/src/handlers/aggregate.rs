use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::info;

use alertflow_core::{ActionKind, Alert, RouteAction};

use crate::context::ActionContext;
use crate::error::HandlerError;
use crate::registry::ActionHandler;

/// Contract for the aggregation buffer.
///
/// Buffers alerts under a group key; flushing the group into a summary
/// notification when the window elapses (or `max_alerts` is reached) is
/// the collaborator's concern.
#[async_trait]
pub trait Aggregator: Send + Sync {
    /// Add an alert to a group. Returns the group's pending count.
    async fn aggregate(
        &self,
        group_key: &str,
        alert: &Alert,
        window: Duration,
        max_alerts: u32,
    ) -> Result<usize, HandlerError>;
}

/// Default aggregator: counts group membership in memory and logs it.
#[derive(Debug, Default)]
pub struct CountingAggregator {
    pending: DashMap<String, usize>,
}

impl CountingAggregator {
    /// Create an empty aggregator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pending count for a group key.
    #[must_use]
    pub fn pending(&self, group_key: &str) -> usize {
        self.pending.get(group_key).map_or(0, |e| *e.value())
    }
}

#[async_trait]
impl Aggregator for CountingAggregator {
    async fn aggregate(
        &self,
        group_key: &str,
        alert: &Alert,
        window: Duration,
        max_alerts: u32,
    ) -> Result<usize, HandlerError> {
        let mut entry = self.pending.entry(group_key.to_owned()).or_insert(0);
        *entry += 1;
        let count = *entry;
        drop(entry);

        info!(
            group_key,
            alert.id = %alert.id,
            pending = count,
            window_seconds = window.as_secs(),
            max_alerts,
            "alert aggregated"
        );
        Ok(count)
    }
}

/// Handler for AGGREGATE.
pub struct AggregateHandler {
    aggregator: Arc<dyn Aggregator>,
}

impl AggregateHandler {
    pub fn new(aggregator: Arc<dyn Aggregator>) -> Self {
        Self { aggregator }
    }
}

#[async_trait]
impl ActionHandler for AggregateHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::Aggregate
    }

    async fn execute(
        &self,
        _ctx: &ActionContext,
        alert: &Alert,
        action: &RouteAction,
    ) -> Result<String, HandlerError> {
        let RouteAction::Aggregate {
            group_by,
            window_seconds,
            max_alerts,
        } = action
        else {
            return Err(HandlerError::Rejected("not an AGGREGATE action".into()));
        };
        if group_by.is_empty() {
            return Err(HandlerError::MissingConfig("group_by must not be empty".into()));
        }

        let group_key = group_key(group_by, alert);
        let pending = self
            .aggregator
            .aggregate(
                &group_key,
                alert,
                Duration::from_secs(*window_seconds),
                *max_alerts,
            )
            .await?;

        Ok(format!("aggregated into {group_key} ({pending} pending)"))
    }
}

/// Build the group key from the alert's values for the `group_by` labels.
/// Absent labels contribute an empty value so grouping stays total.
fn group_key(group_by: &[String], alert: &Alert) -> String {
    group_by
        .iter()
        .map(|key| format!("{key}={}", alert.label(key).unwrap_or_default()))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use alertflow_core::AlertSource;

    use super::*;

    fn alert() -> Alert {
        Alert::new("svc", "fp", "summary", AlertSource::Generic).with_labels(HashMap::from([
            ("site".to_owned(), "fra1".to_owned()),
            ("severity".to_owned(), "high".to_owned()),
        ]))
    }

    #[tokio::test]
    async fn empty_group_by_is_a_config_error() {
        let handler = AggregateHandler::new(Arc::new(CountingAggregator::new()));
        let action = RouteAction::Aggregate {
            group_by: vec![],
            window_seconds: 60,
            max_alerts: 10,
        };
        let err = handler
            .execute(&ActionContext::new(), &alert(), &action)
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::MissingConfig(_)));
    }

    #[tokio::test]
    async fn aggregates_by_label_values() {
        let aggregator = Arc::new(CountingAggregator::new());
        let handler = AggregateHandler::new(Arc::clone(&aggregator) as Arc<dyn Aggregator>);
        let action = RouteAction::Aggregate {
            group_by: vec!["site".into(), "severity".into()],
            window_seconds: 300,
            max_alerts: 10,
        };

        let message = handler
            .execute(&ActionContext::new(), &alert(), &action)
            .await
            .unwrap();
        assert!(message.contains("site=fra1,severity=high"), "{message}");

        handler
            .execute(&ActionContext::new(), &alert(), &action)
            .await
            .unwrap();
        assert_eq!(aggregator.pending("site=fra1,severity=high"), 2);
    }

    #[test]
    fn group_key_is_total_over_missing_labels() {
        let key = group_key(&["site".to_owned(), "absent".to_owned()], &alert());
        assert_eq!(key, "site=fra1,absent=");
    }
}
