// HTTP request handlers
use crate::domain::device::DeviceIndex;
use crate::domain::growth::Window;
use crate::domain::snapshot::DeviceSnapshot;
use crate::domain::tube::TubeSettings;
use crate::infrastructure::csv_export::{estimates_to_csv, table_to_csv};
use crate::infrastructure::http_response::{csv_response, ApiError};
use crate::infrastructure::json_mapper::{
    curve_to_json, device_to_json, report_to_json, snapshot_to_json, DeviceBody,
    GrowthCurveBody, SnapshotBody,
};
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct RefreshQuery {
    pub results: Option<usize>,
}

#[derive(Deserialize)]
pub struct TubeRequest {
    pub name: Option<String>,
    pub target: Option<f64>,
    pub offset: Option<f64>,
}

#[derive(Deserialize)]
pub struct EstimateRequest {
    #[serde(default)]
    pub tubes: Vec<TubeRequest>,
    pub window: Option<[f64; 2]>,
}

#[derive(Deserialize)]
pub struct EstimateQuery {
    pub format: Option<String>,
}

#[derive(Deserialize)]
pub struct GrowthQuery {
    pub name: Option<String>,
    pub target: Option<f64>,
    pub offset: Option<f64>,
    pub start: Option<f64>,
    pub end: Option<f64>,
}

fn resolve_device(state: &AppState, index: usize) -> Result<DeviceIndex, ApiError> {
    state
        .device_service
        .resolve(index)
        .map(|device| device.index)
        .ok_or(ApiError::UnknownDevice(index))
}

async fn loaded_snapshot(state: &AppState, index: usize) -> Result<Arc<DeviceSnapshot>, ApiError> {
    let device = resolve_device(state, index)?;
    state
        .snapshots
        .get(device)
        .await
        .ok_or(ApiError::NotLoaded(index))
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// List configured devices
pub async fn list_devices(State(state): State<Arc<AppState>>) -> Json<Vec<DeviceBody>> {
    let devices = state.device_service.list_devices();
    Json(devices.iter().map(device_to_json).collect())
}

/// Fetch fresh feeds for a device and store the resulting snapshot
pub async fn refresh_device(
    Path(index): Path<usize>,
    Query(query): Query<RefreshQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<SnapshotBody>, ApiError> {
    let device = resolve_device(&state, index)?;
    let snapshot = state
        .growth_service
        .refresh(device, query.results)
        .await
        .map_err(ApiError::Upstream)?;

    let snapshot = state.snapshots.put(snapshot).await;
    Ok(Json(snapshot_to_json(&snapshot)))
}

/// Retained OD and temperature tables from the last refresh
pub async fn device_tables(
    Path(index): Path<usize>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<SnapshotBody>, ApiError> {
    let snapshot = loaded_snapshot(&state, index).await?;
    Ok(Json(snapshot_to_json(&snapshot)))
}

/// Per-tube target-time estimates; `?format=csv` downloads them as a table
pub async fn estimate_tubes(
    Path(index): Path<usize>,
    Query(query): Query<EstimateQuery>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<EstimateRequest>,
) -> Result<Response, ApiError> {
    let snapshot = loaded_snapshot(&state, index).await?;

    let tubes: Vec<TubeSettings> = request
        .tubes
        .into_iter()
        .map(|t| TubeSettings {
            name: t.name,
            target: t.target,
            offset: t.offset,
        })
        .collect();
    let window = request.window.map(|[start, end]| Window::new(start, end));

    let reports = state
        .growth_service
        .estimate_tubes(&snapshot, &tubes, window)?;

    if query.format.as_deref() == Some("csv") {
        let filename = format!("IODR_{}_estimates_table.csv", snapshot.device.number());
        return Ok(csv_response(&filename, estimates_to_csv(&reports)));
    }

    let body: Vec<_> = reports.iter().map(report_to_json).collect();
    Ok(Json(body).into_response())
}

/// Log-transformed series, fit and projection to the target for one tube
pub async fn tube_growth(
    Path((index, tube)): Path<(usize, usize)>,
    Query(query): Query<GrowthQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<GrowthCurveBody>, ApiError> {
    let snapshot = loaded_snapshot(&state, index).await?;

    let window = match (query.start, query.end) {
        (None, None) => None,
        (start, end) => {
            let default = state.growth_service.settings().window;
            Some(Window::new(
                start.unwrap_or(default.start),
                end.unwrap_or(default.end),
            ))
        }
    };

    let settings = TubeSettings {
        name: query.name,
        target: query.target,
        offset: query.offset,
    };
    let curve = state
        .growth_service
        .growth_curve(&snapshot, tube, &settings, window)?;
    Ok(Json(curve_to_json(&curve)))
}

/// Full-resolution OD table as CSV
pub async fn export_device(
    Path(index): Path<usize>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let snapshot = loaded_snapshot(&state, index).await?;
    let filename = format!("IODR{}.csv", snapshot.device.number());
    Ok(csv_response(&filename, table_to_csv(&snapshot.od_full)))
}
