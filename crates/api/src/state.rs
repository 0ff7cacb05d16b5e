use std::sync::Arc;

use herald_dispatch::{JobController, RecipientSource};
use herald_events::EventBus;

use crate::config::ServerConfig;
use crate::sessions::SessionStore;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration, including dispatch defaults.
    pub config: Arc<ServerConfig>,
    /// WebSocket connection manager (observers).
    pub ws_manager: Arc<WsManager>,
    /// Owner of the single active dispatch job.
    pub controller: Arc<JobController>,
    /// Followers/following lookup used by `/extract-users`.
    pub source: Arc<dyn RecipientSource>,
    /// Per-operator extraction and selection state.
    pub sessions: Arc<SessionStore>,
    /// Dispatch event bus (same one the controller publishes on).
    pub event_bus: Arc<EventBus>,
}
