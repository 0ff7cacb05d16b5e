//! Handler for `/extract-users`.
//!
//! Reads the followers or following of a target account through the
//! configured [`RecipientSource`](herald_dispatch::RecipientSource). When the
//! caller sends an `x-session-id` header the result also becomes that
//! operator's current extraction.

use axum::extract::State;
use axum::Json;
use herald_core::extraction::{ExtractionKind, DEFAULT_EXTRACTION_COUNT};
use herald_dispatch::extract_recipients;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::AppResult;
use crate::middleware::session::OperatorSession;
use crate::state::AppState;

/// Request body for `POST /extract-users`.
#[derive(Debug, Deserialize)]
pub struct ExtractUsersRequest {
    /// Target account.
    pub username: String,
    /// `followers` (default) or `following`.
    #[serde(rename = "type", default)]
    pub kind: ExtractionKind,
    /// Requested size, clamped to the configured cap.
    pub max_count: Option<usize>,
}

/// POST /api/v1/extract-users
///
/// Returns `{ "status": "success", "<type>": [..], "count": n }`.
pub async fn extract_users(
    session: Option<OperatorSession>,
    State(state): State<AppState>,
    Json(input): Json<ExtractUsersRequest>,
) -> AppResult<Json<Value>> {
    let result = extract_recipients(
        state.source.as_ref(),
        &input.username,
        input.kind,
        input.max_count.unwrap_or(DEFAULT_EXTRACTION_COUNT),
        state.config.dispatch.max_extraction_count,
    )
    .await?;

    let mut body = json!({
        "status": "success",
        "count": result.recipients.len(),
    });
    body[result.kind.as_str()] = json!(result.recipients);

    if let Some(session) = session {
        tracing::debug!(session = %session.id, count = result.recipients.len(), "Extraction recorded for session");
        state.sessions.record_extraction(&session.id, result).await;
    }

    Ok(Json(body))
}
