//! Route definitions for the `/jobs` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::jobs;
use crate::state::AppState;

/// Routes mounted at `/jobs`.
///
/// ```text
/// GET    /current         -> current_job
/// GET    /{id}            -> get_job
/// POST   /{id}/cancel     -> cancel_job
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/current", get(jobs::current_job))
        .route("/{id}", get(jobs::get_job))
        .route("/{id}/cancel", post(jobs::cancel_job))
}
