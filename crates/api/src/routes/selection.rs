//! Route definitions for the `/selection` resource.
//!
//! All endpoints require the `x-session-id` header.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::selection;
use crate::state::AppState;

/// Routes mounted at `/selection`.
///
/// ```text
/// GET    /                -> get_selection
/// PUT    /                -> replace_selection
/// POST   /select-all      -> select_all
/// POST   /clear           -> clear_selection
/// POST   /{username}      -> select_user
/// DELETE /{username}      -> deselect_user
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(selection::get_selection).put(selection::replace_selection),
        )
        .route("/select-all", post(selection::select_all))
        .route("/clear", post(selection::clear_selection))
        .route(
            "/{username}",
            post(selection::select_user).delete(selection::deselect_user),
        )
}
