//! Library media endpoints: registration, monitoring, per-item
//! overrides and manual searches.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use super::{api_error, internal_error, not_found, ApiError};
use crate::state::AppState;
use fetcharr_core::acquisition::Decision;
use fetcharr_core::library::{MediaItem, MediaQualityOverride, MediaQualityStatus, MediaSpec};

pub async fn add_media(
    State(state): State<Arc<AppState>>,
    Json(spec): Json<MediaSpec>,
) -> Result<(StatusCode, Json<MediaItem>), ApiError> {
    let item = state.library().add_media(&spec).map_err(internal_error)?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn list_media(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<MediaItem>>, ApiError> {
    let items = state.library().list_media().map_err(internal_error)?;
    Ok(Json(items))
}

pub async fn get_media(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<MediaItem>, ApiError> {
    match state.library().get_media(id) {
        Ok(Some(item)) => Ok(Json(item)),
        Ok(None) => Err(not_found(format!("media not found: {id}"))),
        Err(e) => Err(internal_error(e)),
    }
}

#[derive(Debug, Deserialize)]
pub struct MonitorBody {
    pub monitored: bool,
}

pub async fn set_monitored(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<MonitorBody>,
) -> Result<StatusCode, ApiError> {
    require_media(&state, id)?;
    state
        .library()
        .set_monitored(id, body.monitored)
        .map_err(internal_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Monitored items the next search pass will pick up.
pub async fn list_due_for_search(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<MediaItem>>, ApiError> {
    let backoff = state.config().acquisition.search_backoff_hours;
    let due = state
        .library()
        .due_for_search(chrono::Utc::now(), backoff)
        .map_err(internal_error)?;
    Ok(Json(due))
}

/// Runs a full grab decision for one item right now, outside the
/// scheduled search pass.
pub async fn search_media(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Decision>, ApiError> {
    let item = require_media(&state, id)?;
    let decision = state
        .engine()
        .decide(&item)
        .await
        .map_err(internal_error)?;
    Ok(Json(decision))
}

pub async fn get_media_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Option<MediaQualityStatus>>, ApiError> {
    require_media(&state, id)?;
    let status = state.library().get_status(id).map_err(internal_error)?;
    Ok(Json(status))
}

#[derive(Debug, Deserialize)]
pub struct OverrideBody {
    pub preset_id: Option<i64>,
    pub monitored: Option<bool>,
}

pub async fn set_override(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<OverrideBody>,
) -> Result<Json<MediaQualityOverride>, ApiError> {
    require_media(&state, id)?;
    if let Some(preset_id) = body.preset_id {
        if state
            .presets()
            .get(preset_id)
            .map_err(internal_error)?
            .is_none()
        {
            return Err(api_error(
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("preset not found: {preset_id}"),
            ));
        }
    }
    let ovr = MediaQualityOverride {
        media_id: id,
        preset_id: body.preset_id,
        monitored: body.monitored,
    };
    state.library().set_override(&ovr).map_err(internal_error)?;
    Ok(Json(ovr))
}

pub async fn remove_override(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    require_media(&state, id)?;
    state
        .library()
        .remove_override(id)
        .map_err(internal_error)?;
    Ok(StatusCode::NO_CONTENT)
}

fn require_media(state: &AppState, id: i64) -> Result<MediaItem, ApiError> {
    state
        .library()
        .get_media(id)
        .map_err(internal_error)?
        .ok_or_else(|| not_found(format!("media not found: {id}")))
}
