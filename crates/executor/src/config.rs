use std::time::Duration;

/// Configuration for the [`ActionExecutor`](crate::ActionExecutor).
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,
    /// Base delay before the first retry; doubles on each subsequent one.
    pub retry_delay: Duration,
    /// When `true`, a failed action does not abort the remaining actions.
    pub continue_on_error: bool,
    /// Wall-clock ceiling for a single handler attempt.
    pub timeout: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            continue_on_error: true,
            timeout: Duration::from_secs(30),
        }
    }
}

impl ExecutorConfig {
    /// Backoff delay before retry number `retry` (1-based):
    /// `retry_delay × 2^(retry-1)`.
    #[must_use]
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        self.retry_delay
            .saturating_mul(2u32.saturating_pow(retry.saturating_sub(1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = ExecutorConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_delay, Duration::from_secs(1));
        assert!(config.continue_on_error);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn backoff_doubles_per_retry() {
        let config = ExecutorConfig::default();
        assert_eq!(config.backoff_delay(1), Duration::from_secs(1));
        assert_eq!(config.backoff_delay(2), Duration::from_secs(2));
        assert_eq!(config.backoff_delay(3), Duration::from_secs(4));
        assert_eq!(config.backoff_delay(4), Duration::from_secs(8));
    }
}
