//! Operator session extractor for Axum handlers.

use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::request::Parts;

use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the operator's session id.
pub const SESSION_HEADER: &str = "x-session-id";

/// Longest session id accepted.
const MAX_SESSION_ID_LEN: usize = 128;

/// Operator session identified by the `x-session-id` header.
///
/// Use it directly where a session is required, or as
/// `Option<OperatorSession>` where it only adds behaviour:
///
/// ```ignore
/// async fn my_handler(session: OperatorSession) -> AppResult<Json<()>> {
///     tracing::info!(session = %session.id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorSession {
    pub id: String,
}

/// Parse the header. `Ok(None)` when it is absent.
fn session_from_parts(parts: &Parts) -> Result<Option<OperatorSession>, AppError> {
    let Some(value) = parts.headers.get(SESSION_HEADER) else {
        return Ok(None);
    };

    let id = value
        .to_str()
        .map_err(|_| AppError::BadRequest(format!("{SESSION_HEADER} must be valid ASCII")))?
        .trim();

    if id.is_empty() || id.len() > MAX_SESSION_ID_LEN {
        return Err(AppError::BadRequest(format!(
            "{SESSION_HEADER} must be 1 to {MAX_SESSION_ID_LEN} characters"
        )));
    }

    Ok(Some(OperatorSession { id: id.to_string() }))
}

impl FromRequestParts<AppState> for OperatorSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        session_from_parts(parts)?.ok_or_else(|| {
            AppError::BadRequest(format!("Missing {SESSION_HEADER} header"))
        })
    }
}

impl OptionalFromRequestParts<AppState> for OperatorSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        session_from_parts(parts)
    }
}
