mod alerts;
mod catalog;
mod config;
mod history;
mod models;
mod orchestrator;
mod photo;
mod routes;
mod selection;
mod session;
mod tryon;

use anyhow::Context;
use std::{net::SocketAddr, sync::Arc};
use tracing_subscriber::{fmt, EnvFilter};

use crate::{
    alerts::Alerts,
    catalog::Catalog,
    config::Config,
    history::HistoryStore,
    orchestrator::Orchestrator,
    routes::{router, AppState},
    session::SessionState,
    tryon::HttpBackend,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Init tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let config = Config::from_env().context("reading configuration")?;
    tracing::info!("Try-on endpoint: {} (assets from {})", config.endpoint, config.asset_base);

    let catalog = match &config.catalog_path {
        Some(path) => Catalog::from_path(path),
        None => Catalog::builtin(),
    }
    .context("loading clothing catalog")?;

    let alerts = Arc::new(Alerts::default());
    let backend = Arc::new(HttpBackend::new(config.endpoint.clone(), config.asset_base.clone()));
    let state = AppState {
        session: SessionState::shared(),
        catalog: Arc::new(catalog),
        history: Arc::new(HistoryStore::new(config.history_path.clone())),
        alerts: alerts.clone(),
        orchestrator: Arc::new(Orchestrator::new(backend, alerts, config.log_policy)),
    };

    let app = router(state);

    let addr = SocketAddr::from(([0,0,0,0], config.port));
    tracing::info!(%addr, "Starting try-on studio");
    let listener = tokio::net::TcpListener::bind(addr).await.context("binding listener")?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving")?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("👋 Shutting down");
    }
}
