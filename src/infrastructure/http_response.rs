// HTTP response utilities - JSON errors and CSV downloads
use crate::domain::columns::MappingError;
use axum::{
    body::Body,
    http::{header, HeaderValue, Response, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unknown device {0}")]
    UnknownDevice(usize),
    #[error("device {0} has no data loaded, refresh it first")]
    NotLoaded(usize),
    #[error(transparent)]
    Mapping(#[from] MappingError),
    #[error("upstream feed failed: {0:#}")]
    Upstream(anyhow::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::UnknownDevice(_) => StatusCode::NOT_FOUND,
            ApiError::NotLoaded(_) => StatusCode::CONFLICT,
            ApiError::Mapping(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response<Body> {
        let status = self.status();
        match &self {
            ApiError::Upstream(_) => tracing::error!("{}", self),
            _ => tracing::warn!("Rejected request: {}", self),
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Build a CSV attachment response
pub fn csv_response(filename: &str, body: String) -> Response<Body> {
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("text/csv; charset=utf-8")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response()
}
