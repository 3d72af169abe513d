//! HTTP mapping for core errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pastebin_core::AppError;
use serde_json::json;

/// Wrapper that turns an [`AppError`] into a JSON error response.
#[derive(Debug)]
pub struct HttpError(pub AppError);

impl From<AppError> for HttpError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl HttpError {
    /// Status code this error is reported with.
    pub fn status(&self) -> StatusCode {
        match self.0 {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self.0 {
            AppError::NotFound => "Not found".to_string(),
            AppError::Validation(msg) | AppError::Conflict(msg) => msg.clone(),
            other => {
                tracing::error!("Internal error: {}", other);
                "Internal server error".to_string()
            }
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}
