//! Error types for the operator console.
//!
//! [`ConsoleError`] unifies all failure modes into a single enum that can
//! be converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use hedgehog_core::arbiter::SubmitError;

/// Errors that can occur in the console API layer.
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request was well-formed JSON but semantically invalid.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<SubmitError> for ConsoleError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::UnknownEvent(_) => Self::NotFound(err.to_string()),
            SubmitError::InvalidSelection { .. } => Self::BadRequest(err.to_string()),
        }
    }
}

impl IntoResponse for ConsoleError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
