//! Handlers for the `/selection` resource.
//!
//! Every endpoint requires an operator session. Responses carry the whole
//! selection state so clients can re-render from any of them.

use axum::extract::{Path, State};
use axum::Json;
use herald_core::selection::OperatorSelection;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::session::OperatorSession;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `PUT /selection`.
#[derive(Debug, Deserialize)]
pub struct ReplaceSelection {
    pub usernames: Vec<String>,
}

/// GET /api/v1/selection
pub async fn get_selection(
    session: OperatorSession,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<OperatorSelection>>> {
    let data = state.sessions.snapshot(&session.id).await;
    Ok(Json(DataResponse { data }))
}

/// PUT /api/v1/selection
///
/// Replace the selection with `usernames`, in the given order.
pub async fn replace_selection(
    session: OperatorSession,
    State(state): State<AppState>,
    Json(input): Json<ReplaceSelection>,
) -> AppResult<Json<DataResponse<OperatorSelection>>> {
    let data = state
        .sessions
        .update(&session.id, |sel| {
            sel.replace(input.usernames);
            sel.clone()
        })
        .await;

    tracing::debug!(session = %session.id, selected = data.selected().len(), "Selection replaced");
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/selection/select-all
///
/// Select every recipient of the last extraction.
pub async fn select_all(
    session: OperatorSession,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<OperatorSelection>>> {
    let data = state
        .sessions
        .update(&session.id, |sel| {
            sel.select_all();
            sel.clone()
        })
        .await;
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/selection/clear
pub async fn clear_selection(
    session: OperatorSession,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<OperatorSelection>>> {
    let data = state
        .sessions
        .update(&session.id, |sel| {
            sel.clear();
            sel.clone()
        })
        .await;
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/selection/{username}
///
/// Append one recipient to the selection (no-op if already selected).
pub async fn select_user(
    session: OperatorSession,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<Json<DataResponse<OperatorSelection>>> {
    let data = state
        .sessions
        .update(&session.id, |sel| {
            sel.select(username.trim().trim_start_matches('@'));
            sel.clone()
        })
        .await;
    Ok(Json(DataResponse { data }))
}

/// DELETE /api/v1/selection/{username}
pub async fn deselect_user(
    session: OperatorSession,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<Json<DataResponse<OperatorSelection>>> {
    let data = state
        .sessions
        .update(&session.id, |sel| {
            sel.deselect(username.trim().trim_start_matches('@'));
            sel.clone()
        })
        .await;
    Ok(Json(DataResponse { data }))
}
