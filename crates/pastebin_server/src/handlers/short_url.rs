//! Short URL HTTP handlers.

use crate::{error::HttpError, AppState};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use pastebin_core::models::ShortUrl;

/// Register the short link for an existing paste hash.
///
/// # Returns
/// `201 Created` with the mapping.
///
/// # Errors
/// Returns 404 when no paste carries the hash and 409 when the code is taken.
pub async fn create_short_url(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Result<(StatusCode, Json<ShortUrl>), HttpError> {
    let short_url = state.services.short_urls.create_for_paste(&hash)?;
    Ok((StatusCode::CREATED, Json(short_url)))
}

pub async fn get_short_url(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ShortUrl>, HttpError> {
    Ok(Json(state.services.short_urls.get_short_url_by_id(&id)?))
}

pub async fn delete_short_url(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, HttpError> {
    state.services.short_urls.delete_short_url(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_short_urls(
    State(state): State<AppState>,
) -> Result<Json<Vec<ShortUrl>>, HttpError> {
    Ok(Json(state.services.short_urls.list_short_urls()?))
}

/// Resolve a short code to the paste content as plain text, counting the view.
///
/// # Errors
/// Returns 404 when the code or its paste does not exist.
pub async fn resolve_short_url(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let content = state.services.short_urls.resolve_short_url(&code)?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        content,
    ))
}
