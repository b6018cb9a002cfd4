//! Blocklist, release group and exclusion endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::{api_error, ApiError};
use crate::state::AppState;
use fetcharr_core::trust::{
    BlockedGroup, BlocklistEntry, BlocklistSpec, Exclusion, ExclusionScope, TrustError,
    TrustedGroup,
};

fn trust_error(e: TrustError) -> ApiError {
    let status = match &e {
        TrustError::NotFound(_) => StatusCode::NOT_FOUND,
        TrustError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    api_error(status, e.to_string())
}

pub async fn list_blocklist(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<BlocklistEntry>>, ApiError> {
    let entries = state.trust().list_blocklist().map_err(trust_error)?;
    Ok(Json(entries))
}

pub async fn add_blocklist_entry(
    State(state): State<Arc<AppState>>,
    Json(spec): Json<BlocklistSpec>,
) -> Result<(StatusCode, Json<BlocklistEntry>), ApiError> {
    let entry = state
        .trust()
        .add_blocklist_entry(&spec)
        .map_err(trust_error)?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn remove_blocklist_entry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .trust()
        .remove_blocklist_entry(id)
        .map_err(trust_error)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, serde::Deserialize)]
pub struct GroupBody {
    pub name: String,
}

pub async fn list_blocked_groups(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<BlockedGroup>>, ApiError> {
    let groups = state.trust().list_blocked_groups().map_err(trust_error)?;
    Ok(Json(groups))
}

pub async fn block_group(
    State(state): State<Arc<AppState>>,
    Json(body): Json<GroupBody>,
) -> Result<(StatusCode, Json<BlockedGroup>), ApiError> {
    let group = state
        .trust()
        .block_group(&body.name, false)
        .map_err(trust_error)?;
    Ok((StatusCode::CREATED, Json(group)))
}

pub async fn unblock_group(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.trust().unblock_group(&name).map_err(trust_error)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_trusted_groups(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TrustedGroup>>, ApiError> {
    let groups = state.trust().list_trusted_groups().map_err(trust_error)?;
    Ok(Json(groups))
}

pub async fn trust_group(
    State(state): State<Arc<AppState>>,
    Json(body): Json<GroupBody>,
) -> Result<(StatusCode, Json<TrustedGroup>), ApiError> {
    let group = state.trust().trust_group(&body.name).map_err(trust_error)?;
    Ok((StatusCode::CREATED, Json(group)))
}

pub async fn untrust_group(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.trust().untrust_group(&name).map_err(trust_error)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_exclusions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Exclusion>>, ApiError> {
    let exclusions = state.trust().list_exclusions().map_err(trust_error)?;
    Ok(Json(exclusions))
}

pub async fn add_exclusion(
    State(state): State<Arc<AppState>>,
    Json(scope): Json<ExclusionScope>,
) -> Result<(StatusCode, Json<Exclusion>), ApiError> {
    let exclusion = state.trust().add_exclusion(&scope).map_err(trust_error)?;
    Ok((StatusCode::CREATED, Json(exclusion)))
}

pub async fn remove_exclusion(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.trust().remove_exclusion(id).map_err(trust_error)?;
    Ok(StatusCode::NO_CONTENT)
}
