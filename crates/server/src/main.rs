use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use alertflow_audit::{AuditStore, MemoryAuditStore};
use alertflow_core::Service;
use alertflow_gateway::GatewayBuilder;
use alertflow_ingress::IdempotencyGate;
use alertflow_server::api::{AppState, router};
use alertflow_server::config::ServerConfig;
use alertflow_store::{
    AlertStore, IdempotencyStore, MemoryAlertStore, MemoryIdempotencyStore, MemoryRuleStore,
    MemoryServiceStore, RuleStore, ServiceStore,
};

/// Alertflow webhook router.
#[derive(Parser, Debug)]
#[command(name = "alertflow-server", about = "Alert routing and dispatch server")]
struct Cli {
    /// Override the `PORT` environment variable.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = ServerConfig::from_env();
    if let Some(port) = cli.port {
        config.port = port;
    }

    // In-memory backends; persistent stores plug in behind the same traits.
    let alerts = Arc::new(MemoryAlertStore::new());
    let rules = Arc::new(MemoryRuleStore::new());
    let services = Arc::new(MemoryServiceStore::new());
    let idempotency = Arc::new(MemoryIdempotencyStore::new());
    let audit = Arc::new(MemoryAuditStore::new());

    for key in &config.integration_keys {
        services.insert(Service::new(key.clone(), key.clone()));
        info!(integration_key = %key, "registered integration");
    }
    if config.integration_keys.is_empty() {
        warn!("INTEGRATION_KEYS is empty; every webhook will be rejected with 401");
    }

    let gateway = GatewayBuilder::new()
        .alerts(Arc::clone(&alerts) as Arc<dyn AlertStore>)
        .rules(Arc::clone(&rules) as Arc<dyn RuleStore>)
        .audit(Arc::clone(&audit) as Arc<dyn AuditStore>)
        .executor_config(config.executor.clone())
        .expression_cache_capacity(config.expression_cache_capacity)
        .build()?;

    let gate = Arc::new(IdempotencyGate::new(
        Arc::clone(&idempotency) as Arc<dyn IdempotencyStore>,
        config.idempotency_ttl,
        true,
    ));

    // Periodic reclamation of expired idempotency keys.
    let cleanup_store = Arc::clone(&idempotency);
    let cleanup_interval = config.idempotency_cleanup_interval;
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(cleanup_interval);
        // The first tick completes immediately; skip it.
        timer.tick().await;
        loop {
            timer.tick().await;
            match cleanup_store.cleanup_expired().await {
                Ok(0) => {}
                Ok(n) => info!(removed = n, "idempotency cleanup removed expired keys"),
                Err(e) => warn!(error = %e, "idempotency cleanup failed"),
            }
        }
    });

    // Periodic audit retention sweep.
    let audit_cleanup = Arc::clone(&audit);
    let audit_retention = config.audit_retention;
    let audit_interval = config.audit_cleanup_interval;
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(audit_interval);
        timer.tick().await;
        loop {
            timer.tick().await;
            let cutoff = chrono::Utc::now()
                - chrono::Duration::from_std(audit_retention)
                    .unwrap_or_else(|_| chrono::Duration::days(7));
            match audit_cleanup.cleanup_older_than(cutoff).await {
                Ok(0) => {}
                Ok(n) => info!(removed = n, "audit cleanup removed old records"),
                Err(e) => warn!(error = %e, "audit cleanup failed"),
            }
        }
    });

    let shutdown = CancellationToken::new();
    let state = AppState {
        gateway: Arc::new(gateway),
        services: services as Arc<dyn ServiceStore>,
        gate,
        config: Arc::new(config.clone()),
        shutdown: shutdown.clone(),
    };
    let app = router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "alertflow-server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop in-flight dispatches and give them a bounded window to settle.
    shutdown.cancel();
    tokio::time::timeout(config.shutdown_timeout, async {
        // In-flight webhook handlers observe the cancelled token through
        // their child tokens; a short yield lets their results land.
        tokio::time::sleep(Duration::from_millis(50)).await;
    })
    .await
    .ok();

    info!("alertflow-server shut down");
    Ok(())
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM, then return to trigger graceful
/// shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}
