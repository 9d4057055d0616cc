// Router wiring
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    device_tables, estimate_tubes, export_device, health_check, list_devices, refresh_device,
    tube_growth,
};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/devices", get(list_devices))
        .route("/devices/:device/refresh", post(refresh_device))
        .route("/devices/:device/tables", get(device_tables))
        .route("/devices/:device/estimates", post(estimate_tubes))
        .route("/devices/:device/tubes/:tube/growth", get(tube_growth))
        .route("/devices/:device/export.csv", get(export_device))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
