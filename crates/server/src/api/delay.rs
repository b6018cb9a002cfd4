//! Delay profile endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::{api_error, ApiError};
use crate::state::AppState;
use fetcharr_core::delay::{DelayError, DelayProfile, DelayProfileSpec};

fn delay_error(e: DelayError) -> ApiError {
    let status = match &e {
        DelayError::NotFound(_) => StatusCode::NOT_FOUND,
        DelayError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    api_error(status, e.to_string())
}

pub async fn list_profiles(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<DelayProfile>>, ApiError> {
    let profiles = state.delays().list_profiles().map_err(delay_error)?;
    Ok(Json(profiles))
}

pub async fn create_profile(
    State(state): State<Arc<AppState>>,
    Json(spec): Json<DelayProfileSpec>,
) -> Result<(StatusCode, Json<DelayProfile>), ApiError> {
    let profile = state.delays().create_profile(&spec).map_err(delay_error)?;
    Ok((StatusCode::CREATED, Json(profile)))
}

pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(spec): Json<DelayProfileSpec>,
) -> Result<Json<DelayProfile>, ApiError> {
    let profile = state
        .delays()
        .update_profile(id, &spec)
        .map_err(delay_error)?;
    Ok(Json(profile))
}

pub async fn delete_profile(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.delays().delete_profile(id).map_err(delay_error)?;
    Ok(StatusCode::NO_CONTENT)
}
