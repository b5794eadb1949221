use std::time::Instant;

use tracing::{debug, instrument, warn};

use alertflow_core::{ActionResult, Alert, RouteAction};

use crate::config::ExecutorConfig;
use crate::context::ActionContext;
use crate::registry::HandlerRegistry;

/// Executes the actions emitted by the rule engine for one alert.
///
/// Actions run strictly in order on the calling task; retryable failures
/// are retried with exponential backoff (`retry_delay × 2^(k-1)`), each
/// attempt is bounded by the configured timeout, and cancellation during a
/// backoff delay aborts with a non-retryable result carrying the
/// cancellation cause.
pub struct ActionExecutor {
    registry: HandlerRegistry,
    config: ExecutorConfig,
}

impl ActionExecutor {
    /// Create an executor over a populated registry.
    #[must_use]
    pub fn new(registry: HandlerRegistry, config: ExecutorConfig) -> Self {
        Self { registry, config }
    }

    /// The executor configuration.
    #[must_use]
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// The handler registry.
    #[must_use]
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Execute a list of actions in order, returning one result per
    /// executed action.
    ///
    /// With `continue_on_error` (the default) every action gets its chance
    /// regardless of earlier failures; otherwise the first failure aborts
    /// the remaining actions.
    #[instrument(skip_all, fields(alert.id = %alert.id, actions = actions.len()))]
    pub async fn execute_all(
        &self,
        ctx: &ActionContext,
        alert: &Alert,
        actions: &[RouteAction],
    ) -> Vec<ActionResult> {
        let mut results = Vec::with_capacity(actions.len());

        for action in actions {
            let result = self.execute_one(ctx, alert, action).await;
            let failed = !result.success;
            results.push(result);

            if failed && !self.config.continue_on_error {
                warn!(
                    alert.id = %alert.id,
                    "aborting remaining actions after failure"
                );
                break;
            }
        }

        results
    }

    /// Execute a single action through its handler with timeout and retry.
    async fn execute_one(
        &self,
        ctx: &ActionContext,
        alert: &Alert,
        action: &RouteAction,
    ) -> ActionResult {
        let kind = action.kind();
        let started = Instant::now();

        let Some(handler) = self.registry.lookup(kind) else {
            warn!(action = %kind, "no handler registered");
            return ActionResult::failure(
                kind,
                format!("ACTION_NOT_REGISTERED: no handler for {kind}"),
                false,
            )
            .with_duration(started.elapsed());
        };

        // attempt 1 is the initial try; attempts 2..=max_retries+1 are
        // retries preceded by a backoff delay.
        let mut attempt: u32 = 1;
        loop {
            if ctx.is_cancelled() {
                return ActionResult::failure(kind, "cancelled before attempt", false)
                    .with_duration(started.elapsed());
            }

            debug!(action = %kind, attempt, "executing action");
            let attempt_result =
                tokio::time::timeout(self.config.timeout, handler.execute(ctx, alert, action))
                    .await;

            let (error, retryable) = match attempt_result {
                Ok(Ok(message)) => {
                    debug!(action = %kind, attempt, "action succeeded");
                    return ActionResult::success(kind, message)
                        .with_duration(started.elapsed());
                }
                Ok(Err(err)) => {
                    let retryable = err.is_retryable();
                    (err.to_string(), retryable)
                }
                Err(_elapsed) => (
                    format!("timed out after {:?}", self.config.timeout),
                    true,
                ),
            };

            if !retryable || attempt > self.config.max_retries {
                warn!(action = %kind, attempt, error, retryable, "action failed");
                return ActionResult::failure(kind, error, retryable)
                    .with_duration(started.elapsed());
            }

            let delay = self.config.backoff_delay(attempt);
            debug!(
                action = %kind,
                attempt,
                delay_ms = %delay.as_millis(),
                error,
                "retryable failure, backing off"
            );

            // The backoff honors cancellation: aborting here produces a
            // non-retryable result carrying the cancellation cause.
            tokio::select! {
                () = ctx.cancel().cancelled() => {
                    warn!(action = %kind, attempt, "cancelled during retry delay");
                    return ActionResult::failure(
                        kind,
                        format!("cancelled during retry delay after attempt {attempt}: {error}"),
                        false,
                    )
                    .with_duration(started.elapsed());
                }
                () = tokio::time::sleep(delay) => {}
            }

            attempt += 1;
        }
    }
}
