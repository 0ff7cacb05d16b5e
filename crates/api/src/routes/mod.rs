pub mod dispatch;
pub mod health;
pub mod jobs;
pub mod selection;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                                 WebSocket (progress events)
///
/// /extract-users                      read followers/following (POST)
/// /send-mass-dm                       start a dispatch job (POST)
///
/// /selection                          get, replace (PUT)
/// /selection/select-all               select every extracted user (POST)
/// /selection/clear                    empty the selection (POST)
/// /selection/{username}               select (POST), deselect (DELETE)
///
/// /jobs/current                       held job snapshot
/// /jobs/{id}                          job snapshot
/// /jobs/{id}/cancel                   cooperative cancel (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // WebSocket
        .route("/ws", get(ws::ws_handler))
        // Extraction and dispatch
        .merge(dispatch::router())
        // Operator selection
        .nest("/selection", selection::router())
        // Job status and control
        .nest("/jobs", jobs::router())
}
