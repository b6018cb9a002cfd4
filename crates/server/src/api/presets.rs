//! Quality preset endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::{api_error, not_found, ApiError};
use crate::state::AppState;
use fetcharr_core::quality::{
    FilterSpec, PresetError, PresetSpec, QualityPreset, ReleaseFilter,
};

fn preset_error(e: PresetError) -> ApiError {
    let status = match &e {
        PresetError::NotFound(_) => StatusCode::NOT_FOUND,
        PresetError::BuiltInImmutable(_) | PresetError::DuplicateName(_) => StatusCode::CONFLICT,
        PresetError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    api_error(status, e.to_string())
}

pub async fn create_preset(
    State(state): State<Arc<AppState>>,
    Json(spec): Json<PresetSpec>,
) -> Result<(StatusCode, Json<QualityPreset>), ApiError> {
    let preset = state.presets().create(&spec).map_err(preset_error)?;
    Ok((StatusCode::CREATED, Json(preset)))
}

pub async fn list_presets(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<QualityPreset>>, ApiError> {
    let presets = state.presets().list().map_err(preset_error)?;
    Ok(Json(presets))
}

pub async fn get_preset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<QualityPreset>, ApiError> {
    match state.presets().get(id).map_err(preset_error)? {
        Some(preset) => Ok(Json(preset)),
        None => Err(not_found(format!("preset not found: {id}"))),
    }
}

pub async fn update_preset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(spec): Json<PresetSpec>,
) -> Result<Json<QualityPreset>, ApiError> {
    let preset = state.presets().update(id, &spec).map_err(preset_error)?;
    Ok(Json(preset))
}

pub async fn delete_preset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.presets().delete(id).map_err(preset_error)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_default_preset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.presets().set_default(id).map_err(preset_error)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_filters(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<ReleaseFilter>>, ApiError> {
    let filters = state.presets().filters_for(id).map_err(preset_error)?;
    Ok(Json(filters))
}

pub async fn add_filter(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(spec): Json<FilterSpec>,
) -> Result<(StatusCode, Json<ReleaseFilter>), ApiError> {
    let filter = state
        .presets()
        .add_filter(id, &spec)
        .map_err(preset_error)?;
    Ok((StatusCode::CREATED, Json(filter)))
}

pub async fn delete_filter(
    State(state): State<Arc<AppState>>,
    Path((_, filter_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    state
        .presets()
        .delete_filter(filter_id)
        .map_err(preset_error)?;
    Ok(StatusCode::NO_CONTENT)
}
