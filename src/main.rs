// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc, time::Duration};
use tracing_subscriber::EnvFilter;

use crate::application::device_service::DeviceService;
use crate::application::growth_service::GrowthService;
use crate::application::snapshot_store::SnapshotStore;
use crate::infrastructure::config::load_dashboard_config;
use crate::infrastructure::thingspeak_repository::ThingSpeakRepository;
use crate::presentation::app_state::AppState;
use crate::presentation::routes::build_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let dashboard = load_dashboard_config()?;
    let settings = dashboard.pipeline_settings()?;
    let catalog = Arc::new(dashboard.catalog());
    tracing::info!(
        "Retention keeps {} at full density, every {}th row before that",
        settings.retention.horizon(),
        settings.retention.stride()
    );

    // Create repository (infrastructure layer)
    let repository = Arc::new(ThingSpeakRepository::new(
        dashboard.feed.base_url.clone(),
        settings.zone,
        Duration::from_secs(dashboard.feed.timeout_secs),
    )?);

    // Create services (application layer)
    let device_service = DeviceService::new(catalog.clone());
    let growth_service = GrowthService::new(repository, catalog.clone(), settings);

    // Create application state
    let state = Arc::new(AppState {
        device_service,
        growth_service,
        snapshots: SnapshotStore::default(),
    });

    let router = build_router(state);

    // Start server
    let addr: SocketAddr = dashboard.server.bind.parse()?;
    tracing::info!(
        "Starting iodr-telemetry on {} with {} devices",
        addr,
        catalog.devices().len()
    );

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
