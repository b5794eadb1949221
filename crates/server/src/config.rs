use std::time::Duration;

use tracing::warn;

use alertflow_core::AlertSource;
use alertflow_executor::ExecutorConfig;

/// Server configuration, read from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PORT` — HTTP listen port.
    pub port: u16,
    /// `WEBHOOK_MAX_PAYLOAD_SIZE` — request body ceiling for webhooks, bytes.
    pub webhook_max_payload_size: u64,
    /// `ADMIN_MAX_PAYLOAD_SIZE` — request body ceiling for admin calls, bytes.
    pub admin_max_payload_size: u64,
    /// `GRPC_MAX_MESSAGE_SIZE` — message ceiling for gRPC transports, bytes.
    pub grpc_max_message_size: usize,
    /// `ALERTMANAGER_SECRET` — HMAC secret; empty disables verification.
    pub alertmanager_secret: String,
    /// `GRAFANA_SECRET` — HMAC secret; empty disables verification.
    pub grafana_secret: String,
    /// `GENERIC_SECRET` — HMAC secret; empty disables verification.
    pub generic_secret: String,
    /// `IDEMPOTENCY_TTL_SECONDS` — idempotency key lifetime.
    pub idempotency_ttl: Duration,
    /// `IDEMPOTENCY_CLEANUP_INTERVAL_SECONDS` — sweep cadence.
    pub idempotency_cleanup_interval: Duration,
    /// `SHUTDOWN_TIMEOUT_SECONDS` — graceful shutdown deadline.
    pub shutdown_timeout: Duration,
    /// `AUDIT_RETENTION_HOURS` — audit records older than this are swept.
    pub audit_retention: Duration,
    /// `AUDIT_CLEANUP_INTERVAL_SECONDS` — audit sweep cadence.
    pub audit_cleanup_interval: Duration,
    /// `EXPRESSION_CACHE_CAPACITY` — compiled expression cache size
    /// (0 selects the engine default).
    pub expression_cache_capacity: usize,
    /// `EXECUTOR_*` — action executor overrides.
    pub executor: ExecutorConfig,
    /// `INTEGRATION_KEYS` — comma-separated keys to register at startup
    /// (stand-in until a persistent service store is wired).
    pub integration_keys: Vec<String>,
}

impl ServerConfig {
    /// Read configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through a lookup function (testable without
    /// touching the process environment).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut executor = ExecutorConfig::default();
        executor.max_retries = parse_or(&lookup, "EXECUTOR_MAX_RETRIES", executor.max_retries);
        executor.retry_delay = Duration::from_millis(parse_or(
            &lookup,
            "EXECUTOR_RETRY_DELAY_MS",
            u64::try_from(executor.retry_delay.as_millis()).unwrap_or(1000),
        ));
        executor.timeout = Duration::from_secs(parse_or(
            &lookup,
            "EXECUTOR_TIMEOUT_SECONDS",
            executor.timeout.as_secs(),
        ));
        executor.continue_on_error = parse_or(
            &lookup,
            "EXECUTOR_CONTINUE_ON_ERROR",
            executor.continue_on_error,
        );

        Self {
            port: parse_or(&lookup, "PORT", 8080),
            webhook_max_payload_size: parse_or(&lookup, "WEBHOOK_MAX_PAYLOAD_SIZE", 1_048_576),
            admin_max_payload_size: parse_or(&lookup, "ADMIN_MAX_PAYLOAD_SIZE", 102_400),
            grpc_max_message_size: parse_or(&lookup, "GRPC_MAX_MESSAGE_SIZE", 4_194_304),
            alertmanager_secret: lookup("ALERTMANAGER_SECRET").unwrap_or_default(),
            grafana_secret: lookup("GRAFANA_SECRET").unwrap_or_default(),
            generic_secret: lookup("GENERIC_SECRET").unwrap_or_default(),
            idempotency_ttl: Duration::from_secs(parse_or(
                &lookup,
                "IDEMPOTENCY_TTL_SECONDS",
                86_400,
            )),
            idempotency_cleanup_interval: Duration::from_secs(parse_or(
                &lookup,
                "IDEMPOTENCY_CLEANUP_INTERVAL_SECONDS",
                60,
            )),
            shutdown_timeout: Duration::from_secs(parse_or(
                &lookup,
                "SHUTDOWN_TIMEOUT_SECONDS",
                30,
            )),
            audit_retention: Duration::from_secs(
                parse_or(&lookup, "AUDIT_RETENTION_HOURS", 168u64) * 3600,
            ),
            audit_cleanup_interval: Duration::from_secs(parse_or(
                &lookup,
                "AUDIT_CLEANUP_INTERVAL_SECONDS",
                3600,
            )),
            expression_cache_capacity: parse_or(&lookup, "EXPRESSION_CACHE_CAPACITY", 0),
            executor,
            integration_keys: lookup("INTEGRATION_KEYS")
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_owned)
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    /// The HMAC secret configured for a producer shape.
    #[must_use]
    pub fn secret_for(&self, source: AlertSource) -> &str {
        match source {
            AlertSource::Alertmanager => &self.alertmanager_secret,
            AlertSource::Grafana => &self.grafana_secret,
            AlertSource::Generic => &self.generic_secret,
        }
    }
}

/// Parse an environment value, warning and keeping the default on failure.
fn parse_or<T: std::str::FromStr + Copy>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "unparseable configuration value, using default");
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> ServerConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        ServerConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let config = config_from(&[]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.webhook_max_payload_size, 1_048_576);
        assert_eq!(config.admin_max_payload_size, 102_400);
        assert_eq!(config.grpc_max_message_size, 4_194_304);
        assert!(config.alertmanager_secret.is_empty());
        assert_eq!(config.idempotency_ttl, Duration::from_secs(86_400));
        assert_eq!(config.idempotency_cleanup_interval, Duration::from_secs(60));
        assert_eq!(config.shutdown_timeout, Duration::from_secs(30));
        assert_eq!(config.audit_retention, Duration::from_secs(168 * 3600));
        assert_eq!(config.audit_cleanup_interval, Duration::from_secs(3600));
        assert_eq!(config.expression_cache_capacity, 0);
        assert!(config.integration_keys.is_empty());
    }

    #[test]
    fn environment_overrides_apply() {
        let config = config_from(&[
            ("PORT", "9090"),
            ("WEBHOOK_MAX_PAYLOAD_SIZE", "2048"),
            ("GENERIC_SECRET", "s3cret"),
            ("IDEMPOTENCY_TTL_SECONDS", "120"),
            ("EXECUTOR_MAX_RETRIES", "5"),
            ("EXECUTOR_RETRY_DELAY_MS", "250"),
            ("EXECUTOR_CONTINUE_ON_ERROR", "false"),
            ("INTEGRATION_KEYS", "alpha, beta,,gamma"),
        ]);
        assert_eq!(config.port, 9090);
        assert_eq!(config.webhook_max_payload_size, 2048);
        assert_eq!(config.generic_secret, "s3cret");
        assert_eq!(config.idempotency_ttl, Duration::from_secs(120));
        assert_eq!(config.executor.max_retries, 5);
        assert_eq!(config.executor.retry_delay, Duration::from_millis(250));
        assert!(!config.executor.continue_on_error);
        assert_eq!(config.integration_keys, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn unparseable_values_keep_defaults() {
        let config = config_from(&[("PORT", "not-a-port"), ("EXECUTOR_MAX_RETRIES", "many")]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.executor.max_retries, 3);
    }

    #[test]
    fn secret_selection_by_source() {
        let config = config_from(&[
            ("ALERTMANAGER_SECRET", "am"),
            ("GRAFANA_SECRET", "gf"),
            ("GENERIC_SECRET", "gn"),
        ]);
        assert_eq!(config.secret_for(AlertSource::Alertmanager), "am");
        assert_eq!(config.secret_for(AlertSource::Grafana), "gf");
        assert_eq!(config.secret_for(AlertSource::Generic), "gn");
    }
}
