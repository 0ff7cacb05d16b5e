//! Route definitions for extraction and dispatch actions.

use axum::routing::post;
use axum::Router;

use crate::handlers::{dispatch, extraction};
use crate::state::AppState;

/// Routes mounted at the `/api/v1` root.
///
/// ```text
/// POST   /extract-users   -> extract_users
/// POST   /send-mass-dm    -> send_mass_dm
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/extract-users", post(extraction::extract_users))
        .route("/send-mass-dm", post(dispatch::send_mass_dm))
}
