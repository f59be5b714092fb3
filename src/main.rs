//! Article summary service: binary entrypoint.
//! Loads configuration once, wires the router, and serves until Ctrl-C.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use tracing::{info, warn};

use article_summary_server::{
    api::{self, AppState},
    config::AppConfig,
    metrics::Metrics,
    telemetry,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Reads .env first, so RUST_LOG set there reaches the subscriber below.
    let config = AppConfig::from_env().context("loading configuration")?;
    telemetry::init_tracing(telemetry::DEFAULT_FILTER);

    for src in &config.sources {
        if !src.path.is_dir() {
            warn!(source = %src.name, path = %src.path.display(), "source directory does not exist yet");
        }
    }
    info!(
        environment = config.environment.as_str(),
        sources = config.sources.len(),
        frontend = %config.frontend_dir.display(),
        metrics = config.metrics_enabled,
        "configuration loaded"
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let metrics_enabled = config.metrics_enabled;
    let state = AppState::new(config);

    let app = if metrics_enabled {
        let metrics = Metrics::init()?;
        api::router_with(state, metrics.router())
    } else {
        api::router(state)
    };

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "starting server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
