//! User HTTP handlers.

use crate::{error::HttpError, AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use pastebin_core::models::user::{AddPostRequest, CreateUserRequest, User};

/// Create a user.
///
/// # Returns
/// `201 Created` with the stored user.
///
/// # Errors
/// Returns 400 when the username is empty.
pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), HttpError> {
    let user = state.services.users.create_user(&req.username)?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, HttpError> {
    Ok(Json(state.services.users.list_users()?))
}

/// # Errors
/// Returns 400 for a non-numeric id and 404 when the user does not exist.
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<User>, HttpError> {
    Ok(Json(state.services.users.get_user_by_id(&id)?))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, HttpError> {
    state.services.users.delete_user(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Attach a paste hash to a user's posts.
///
/// # Errors
/// Returns 404 when either the user or the paste does not exist.
pub async fn add_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AddPostRequest>,
) -> Result<Json<User>, HttpError> {
    Ok(Json(state.services.users.add_post(&id, &req.hash)?))
}
