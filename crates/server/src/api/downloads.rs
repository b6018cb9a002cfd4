//! Download queue and history endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use super::{internal_error, not_found, ApiError};
use crate::state::AppState;
use fetcharr_core::delay::PendingGrab;
use fetcharr_core::download::{Download, GrabHistory};
use fetcharr_core::import::ImportHistory;

const DEFAULT_HISTORY_LIMIT: u32 = 50;
const MAX_HISTORY_LIMIT: u32 = 500;

#[derive(Debug, Deserialize)]
pub struct ListDownloadsParams {
    /// Filter by status type, e.g. "downloading" or "failed".
    pub status: Option<String>,
}

pub async fn list_downloads(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListDownloadsParams>,
) -> Result<Json<Vec<Download>>, ApiError> {
    let downloads = state
        .downloads()
        .list_downloads(params.status.as_deref())
        .map_err(internal_error)?;
    Ok(Json(downloads))
}

pub async fn get_download(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Download>, ApiError> {
    match state.downloads().get_download(id).map_err(internal_error)? {
        Some(download) => Ok(Json(download)),
        None => Err(not_found(format!("download not found: {id}"))),
    }
}

/// Downloads whose progress has not moved within the stall timeout.
pub async fn list_stalled(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Download>>, ApiError> {
    let timeout = state.config().acquisition.stall_timeout_secs;
    let stalled = state
        .downloads()
        .list_stalled(chrono::Utc::now(), timeout)
        .map_err(internal_error)?;
    Ok(Json(stalled))
}

/// Deferred grabs still waiting out their delay window.
pub async fn list_pending(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<PendingGrab>>, ApiError> {
    let pending = state.delays().list_pending().map_err(internal_error)?;
    Ok(Json(pending))
}

pub async fn grabs_for_media(
    State(state): State<Arc<AppState>>,
    Path(media_id): Path<i64>,
) -> Result<Json<Vec<GrabHistory>>, ApiError> {
    let grabs = state
        .downloads()
        .grabs_for_media(media_id)
        .map_err(internal_error)?;
    Ok(Json(grabs))
}

#[derive(Debug, Deserialize)]
pub struct ImportHistoryParams {
    pub media_id: Option<i64>,
    pub limit: Option<u32>,
}

pub async fn import_history(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ImportHistoryParams>,
) -> Result<Json<Vec<ImportHistory>>, ApiError> {
    let history = match params.media_id {
        Some(media_id) => state.imports().list_for_media(media_id),
        None => {
            let limit = params
                .limit
                .unwrap_or(DEFAULT_HISTORY_LIMIT)
                .clamp(1, MAX_HISTORY_LIMIT);
            state.imports().list_recent(limit)
        }
    }
    .map_err(internal_error)?;
    Ok(Json(history))
}
