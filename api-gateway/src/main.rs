// api-gateway/src/main.rs

//! API gateway binary.
//!
//! This binary exposes a small HTTP API on top of the `provenance` crate:
//!
//! - `GET /health`
//! - `GET /metrics` (when metrics are enabled)
//! - `POST /media/fingerprint`, `POST /media/verify`
//! - `POST /txn/payment`, `POST /txn/broadcast`
//! - `POST /keys/derive`
//!
//! All registry access goes through one shared `HttpRegistryClient`.
//! Transactions are only built and forwarded; signing stays in the wallet.

mod config;
mod routes;
mod state;

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tokio::signal;

use config::ApiConfig;
use provenance::{HttpRegistryClient, MetricsRegistry, ProvenanceConfig};
use routes::{health, keys, media, txn};
use state::{AppState, SharedState};

#[tokio::main]
async fn main() {
    // Basic tracing setup.
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "api_gateway=info,provenance=info".to_string()),
        )
        .init();

    if let Err(e) = run().await {
        eprintln!("fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let api_cfg = ApiConfig::from_env().map_err(|e| format!("invalid API config: {e}"))?;
    let cfg = ProvenanceConfig::from_env().map_err(|e| format!("invalid provenance config: {e}"))?;

    let metrics = Arc::new(
        MetricsRegistry::new()
            .map_err(|e| format!("failed to initialise metrics registry: {e}"))?,
    );

    let registry = HttpRegistryClient::new(&cfg.registry)
        .map_err(|e| format!("failed to create registry client: {e}"))?;
    tracing::info!(
        registry = %cfg.registry.base_url,
        threshold = cfg.verification.similarity_threshold,
        check_onchain = cfg.verification.check_onchain,
        "registry client ready"
    );

    let app_state: SharedState = Arc::new(AppState::new(&cfg, registry, metrics));

    let app = router(app_state, &api_cfg, cfg.metrics.enabled);

    tracing::info!("API gateway listening on http://{}", api_cfg.listen_addr);

    let listener = tokio::net::TcpListener::bind(api_cfg.listen_addr)
        .await
        .map_err(|e| format!("failed to bind {}: {e}", api_cfg.listen_addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| format!("API server error: {e}"))?;

    Ok(())
}

fn router(state: SharedState, api_cfg: &ApiConfig, metrics_enabled: bool) -> Router {
    let media_routes = Router::new()
        .route("/media/fingerprint", post(media::fingerprint))
        .route("/media/verify", post(media::verify))
        .layer(DefaultBodyLimit::max(api_cfg.max_upload_bytes));

    let mut app = Router::new()
        .route("/health", get(health::health))
        .route("/txn/payment", post(txn::build_payment))
        .route("/txn/broadcast", post(txn::broadcast))
        .route("/keys/derive", post(keys::derive_keys))
        .merge(media_routes);

    if metrics_enabled {
        app = app.route("/metrics", get(health::metrics));
        tracing::info!("metrics exposed on /metrics");
    }

    app.with_state(state)
}

/// Waits for Ctrl-C and returns, used for graceful shutdown.
async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
