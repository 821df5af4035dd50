use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use approval_sentinel::api::{self, AppState};
use approval_sentinel::chain::Chain;
use approval_sentinel::config::{Config, LogFormat};
use approval_sentinel::engine::RiskEngine;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path)?;

    // Initialize structured logging (set RUST_LOG=debug for more output)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.logging.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
    }

    tracing::info!("Approval Sentinel starting");
    tracing::info!(
        rpc_endpoints = config.providers.primary.rpc.len(),
        explorer_fallback = config.providers.secondary.enabled,
        chains = Chain::ALL.len(),
        "Configuration loaded from {}",
        config_path
    );

    let engine = Arc::new(RiskEngine::from_config(&config)?);
    tracing::info!(
        decompiler = %config.analysis.decompiler_url,
        analyzer = %config.analysis.analyzer_url,
        "Risk engine initialized"
    );

    let shutdown = CancellationToken::new();

    let server = if config.api.enabled {
        let state = AppState {
            engine: engine.clone(),
            decompiler_url: config.analysis.decompiler_url.clone(),
            analyzer_url: config.analysis.analyzer_url.clone(),
        };
        let host = config.api.host.clone();
        let port = config.api.port;
        let shutdown = shutdown.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = api::serve(state, &host, port, shutdown).await {
                tracing::error!(error = %e, "API server failed");
            }
        }))
    } else {
        tracing::warn!("API disabled in config, nothing to serve");
        None
    };

    tracing::info!("Press Ctrl+C to stop.");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received, stopping...");
    shutdown.cancel();

    if let Some(handle) = server {
        let _ = handle.await;
    }

    tracing::info!("Approval Sentinel stopped gracefully");
    Ok(())
}
