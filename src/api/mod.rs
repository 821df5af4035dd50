pub mod handlers;
pub mod types;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::engine::RiskEngine;

pub struct AppState {
    pub engine: Arc<RiskEngine>,
    pub decompiler_url: String,
    pub analyzer_url: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/v1/chains", get(handlers::chains))
        .route("/api/v1/scan", get(handlers::scan_wallet))
        .route("/api/v1/analyze", get(handlers::analyze_contract))
        .route("/api/v1/analyze/batch", post(handlers::analyze_batch))
        .with_state(Arc::new(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serve until `shutdown` is cancelled.
pub async fn serve(state: AppState, host: &str, port: u16, shutdown: CancellationToken) -> eyre::Result<()> {
    let app = router(state);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| eyre::eyre!("Failed to bind API server to {}: {}", addr, e))?;
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    tracing::info!("API server stopped");
    Ok(())
}
