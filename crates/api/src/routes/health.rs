use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether a dispatch job is pending or running.
    pub dispatch_busy: bool,
    /// Connected WebSocket observers.
    pub observers: usize,
    /// Live subscribers on the dispatch event bus.
    pub event_subscribers: usize,
    /// Operator sessions currently held.
    pub sessions: usize,
}

/// GET /health -- returns service status and dispatcher occupancy.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        dispatch_busy: state.controller.is_busy().await,
        observers: state.ws_manager.connection_count().await,
        event_subscribers: state.event_bus.subscriber_count(),
        sessions: state.sessions.session_count().await,
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
