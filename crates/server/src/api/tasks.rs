//! Scheduler task endpoints: status listing and manual triggering.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use super::{api_error, not_found, ApiError};
use crate::state::AppState;
use fetcharr_core::scheduler::{TaskKind, TaskStatus};

pub async fn list_tasks(State(state): State<Arc<AppState>>) -> Json<Vec<TaskStatus>> {
    Json(state.scheduler().statuses().await)
}

#[derive(Serialize)]
pub struct TriggerResponse {
    pub task: &'static str,
    pub summary: String,
}

/// Runs one task to completion and returns its summary. A run that is
/// already in flight is reported as a conflict.
pub async fn trigger_task(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<TriggerResponse>, ApiError> {
    let kind = TaskKind::parse(&name)
        .ok_or_else(|| not_found(format!("unknown task: {name}")))?;

    match state.scheduler().trigger(kind).await {
        Ok(summary) => Ok(Json(TriggerResponse {
            task: kind.name(),
            summary,
        })),
        Err(e) if e.contains("already running") => Err(api_error(StatusCode::CONFLICT, e)),
        Err(e) => Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e)),
    }
}
