pub mod health;
pub mod webhook;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tokio_util::sync::CancellationToken;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use alertflow_gateway::Gateway;
use alertflow_ingress::IdempotencyGate;
use alertflow_store::ServiceStore;

use crate::config::ServerConfig;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The routing pipeline.
    pub gateway: Arc<Gateway>,
    /// Integration key lookup.
    pub services: Arc<dyn ServiceStore>,
    /// The idempotency gate.
    pub gate: Arc<IdempotencyGate>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Cancelled on shutdown; webhook dispatches derive their cancellation
    /// from it.
    pub shutdown: CancellationToken,
}

/// Build the Axum router with all routes and middleware.
pub fn router(state: AppState) -> Router {
    let body_limit = usize::try_from(state.config.webhook_max_payload_size)
        .unwrap_or(usize::MAX);

    Router::new()
        .route("/health", get(health::health))
        .route(
            "/api/v1/webhook/alertmanager/{integration_key}",
            post(webhook::alertmanager),
        )
        .route(
            "/api/v1/webhook/grafana/{integration_key}",
            post(webhook::grafana),
        )
        .route(
            "/api/v1/webhook/generic/{integration_key}",
            post(webhook::generic),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TimeoutLayer::new(Duration::from_secs(15)))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
