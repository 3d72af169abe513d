//! Stats HTTP handlers.

use crate::{error::HttpError, AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use pastebin_core::models::stats::{CreateStatsRequest, Stats};

/// Create a stats row, generating an id when none is given.
///
/// # Errors
/// Returns 409 when the id already has a stats row.
pub async fn create_stats(
    State(state): State<AppState>,
    Json(req): Json<CreateStatsRequest>,
) -> Result<(StatusCode, Json<Stats>), HttpError> {
    let stats = state.services.stats.create_stats(req.id.as_deref())?;
    Ok((StatusCode::CREATED, Json(stats)))
}

pub async fn list_stats(State(state): State<AppState>) -> Result<Json<Vec<Stats>>, HttpError> {
    Ok(Json(state.services.stats.list_stats()?))
}

pub async fn get_stats(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Stats>, HttpError> {
    Ok(Json(state.services.stats.get_stats_by_id(&id)?))
}

pub async fn delete_stats(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, HttpError> {
    state.services.stats.delete_stats(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Add one view to a stats row.
///
/// # Errors
/// Returns 404 when the id has no stats row.
pub async fn increment_views(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Stats>, HttpError> {
    Ok(Json(state.services.stats.increment_views(&id)?))
}
