//! Paste HTTP handlers.

use crate::{error::HttpError, AppError, AppState};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use pastebin_core::constants::DEFAULT_POPULAR_LIMIT;
use pastebin_core::models::paste::{CreatePasteRequest, CreatePasteResponse, Paste, PopularQuery};

/// Create a new paste.
///
/// # Arguments
/// - `state`: Application state.
/// - `req`: Paste creation payload.
///
/// # Returns
/// `201 Created` with the new paste's id, hash, and short link (`null` when
/// the paste's short code already belongs to another target).
///
/// # Errors
/// Returns 400 when the content is missing or too large, or when the expiry
/// is missing or not in the future.
pub async fn create_paste(
    State(state): State<AppState>,
    Json(req): Json<CreatePasteRequest>,
) -> Result<(StatusCode, Json<CreatePasteResponse>), HttpError> {
    if req.content.len() > state.config.max_paste_size {
        return Err(AppError::Validation(format!(
            "Paste size exceeds maximum of {} bytes",
            state.config.max_paste_size
        ))
        .into());
    }
    let expires_at = req
        .expires_at
        .ok_or_else(|| AppError::Validation("expiresAt is required".to_string()))?;

    let (paste, short_url) = state
        .services
        .pastes
        .create_paste_with_link(&req.content, expires_at)?;
    let response = CreatePasteResponse {
        short_url: short_url.map(|link| state.config.short_link(&link.id)),
        id: paste.id,
        hash: paste.hash,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Fetch a paste by id, counting the view.
///
/// # Errors
/// Returns 404 if the paste does not exist.
pub async fn get_paste(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Paste>, HttpError> {
    Ok(Json(state.services.pastes.view_paste_by_id(&id)?))
}

/// Fetch a paste by content hash, counting the view.
///
/// # Errors
/// Returns 404 if no paste carries the hash.
pub async fn get_paste_by_hash(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Result<Json<Paste>, HttpError> {
    Ok(Json(state.services.pastes.get_paste_by_hash(&hash)?))
}

/// Delete a paste.
///
/// # Returns
/// `204 No Content` on success.
///
/// # Errors
/// Returns 404 if the paste does not exist.
pub async fn delete_paste(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, HttpError> {
    state.services.pastes.delete_paste(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_pastes(State(state): State<AppState>) -> Result<Json<Vec<Paste>>, HttpError> {
    Ok(Json(state.services.pastes.list_pastes()?))
}

/// Most viewed pastes, highest first.
///
/// `limit` defaults to 5.
///
/// # Errors
/// Returns 404 when there is nothing to rank.
pub async fn popular_pastes(
    State(state): State<AppState>,
    Query(query): Query<PopularQuery>,
) -> Result<Json<Vec<Paste>>, HttpError> {
    let limit = query.limit.unwrap_or(DEFAULT_POPULAR_LIMIT);
    let top = state.services.pastes.list_top_pastes(limit)?;
    if top.is_empty() {
        return Err(AppError::NotFound.into());
    }
    Ok(Json(top))
}
