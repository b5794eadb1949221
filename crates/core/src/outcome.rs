use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::action::ActionKind;

/// Outcome of executing a single action, recorded in the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    pub action_type: ActionKind,
    pub success: bool,
    /// Human-readable outcome (e.g. the created ticket id).
    #[serde(default)]
    pub message: String,
    /// Error description when `success` is false.
    #[serde(default)]
    pub error: Option<String>,
    /// Whether the executor may retry the action.
    pub retryable: bool,
    /// Wall-clock execution time, serialized as milliseconds.
    #[serde(with = "duration_millis")]
    pub duration: Duration,
}

impl ActionResult {
    /// A successful result.
    #[must_use]
    pub fn success(action_type: ActionKind, message: impl Into<String>) -> Self {
        Self {
            action_type,
            success: true,
            message: message.into(),
            error: None,
            retryable: false,
            duration: Duration::ZERO,
        }
    }

    /// A failed result.
    #[must_use]
    pub fn failure(
        action_type: ActionKind,
        error: impl Into<String>,
        retryable: bool,
    ) -> Self {
        Self {
            action_type,
            success: false,
            message: String::new(),
            error: Some(error.into()),
            retryable,
            duration: Duration::ZERO,
        }
    }

    /// Attach the measured execution duration.
    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        u64::try_from(d.as_millis())
            .unwrap_or(u64::MAX)
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let ms = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(ms))
    }
}
