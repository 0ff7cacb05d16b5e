use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use herald_core::error::CoreError;
use herald_dispatch::{ExtractError, SourceError};
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and [`SourceError`] for failures
/// reported by the platform, and adds HTTP-specific variants. Implements
/// [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `herald_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The recipient source failed.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<ExtractError> for AppError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::Invalid(core) => AppError::Core(core),
            ExtractError::Source(source) => AppError::Source(source),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            },

            // --- Platform errors ---
            AppError::Source(source) => match source {
                SourceError::SessionLost(msg) => {
                    (StatusCode::UNAUTHORIZED, "SESSION_LOST", msg.clone())
                }
                SourceError::NotFound(account) => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("Account {account} not found"),
                ),
                SourceError::Upstream(msg) => {
                    tracing::warn!(error = %msg, "Upstream extraction failure");
                    (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", msg.clone())
                }
            },

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "status": "error",
            "message": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
