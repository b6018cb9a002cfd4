use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use super::{internal_error, ApiError};
use crate::state::AppState;
use fetcharr_core::config::SanitizedConfig;
use fetcharr_core::scheduler::TaskStatus;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

/// Aggregate system status: library size, download activity and the
/// scheduler's task table.
#[derive(Serialize)]
pub struct StatusResponse {
    pub version: String,
    pub media_count: usize,
    pub active_downloads: usize,
    pub pending_grabs: usize,
    pub tasks: Vec<TaskStatus>,
}

pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusResponse>, ApiError> {
    let media_count = state.library().list_media().map_err(internal_error)?.len();
    let active_downloads = state
        .downloads()
        .active_downloads()
        .map_err(internal_error)?
        .len();
    let pending_grabs = state.delays().list_pending().map_err(internal_error)?.len();

    Ok(Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        media_count,
        active_downloads,
        pending_grabs,
        tasks: state.scheduler().statuses().await,
    }))
}

pub async fn get_metrics() -> String {
    crate::metrics::encode_metrics()
}
