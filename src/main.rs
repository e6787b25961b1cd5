//! API Router - reverse-proxy gateway with per-provider key rotation
//!
//! This is the main entry point for the API Router server.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use api_router::{config, routes, AppState, Config, ProviderRegistry};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    init_tracing(config.json_logs);

    info!("Starting API Router");

    // Provider file is required; a missing file aborts startup
    let providers = config::load_providers(&config.providers_path)?;
    let registry = ProviderRegistry::from_config(providers);
    info!(
        providers = ?registry.list_active_providers(),
        "Provider configuration loaded"
    );

    routes::metrics::init_metrics();
    if let Some(metrics_addr) = config.metrics_addr {
        tokio::spawn(serve_metrics(metrics_addr));
    }

    let state = Arc::new(AppState::new(config.clone(), registry)?);
    info!("Application state initialized");

    let app = routes::create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid listen address")?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API Router shutdown complete");
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "api_router=info,tower_http=info".into());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Serve `/metrics` on its own listener
async fn serve_metrics(addr: SocketAddr) {
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = %addr, error = %e, "Failed to bind metrics listener");
            return;
        }
    };
    info!("Metrics listening on {}", addr);

    if let Err(e) = axum::serve(listener, routes::metrics::metrics_router()).await {
        error!(error = %e, "Metrics listener stopped");
    }
}

/// Handle graceful shutdown signals
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating shutdown");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating shutdown");
        }
    }
}
