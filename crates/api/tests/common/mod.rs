//! Shared helpers for API integration tests.
//!
//! Builds the real router and middleware stack around in-memory stand-ins
//! for the platform gateway.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use herald_api::config::{DispatchConfig, ServerConfig};
use herald_api::router::build_app_router;
use herald_api::sessions::SessionStore;
use herald_api::state::AppState;
use herald_api::ws::WsManager;
use herald_core::extraction::ExtractionKind;
use herald_core::outcome::SendOutcome;
use herald_dispatch::{JobController, MessageSender, RecipientSource, SourceError};
use herald_events::EventBus;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

/// Accounts known to [`StubSource`] and their followers.
pub const TARGET: &str = "target";
pub const FOLLOWERS: [&str; 4] = ["alice", "bob", "carol", "dave"];

/// Sender that delivers to everyone except `blocked`.
pub struct StubSender;

#[async_trait]
impl MessageSender for StubSender {
    async fn send(&self, recipient: &str, _message: &str) -> SendOutcome {
        if recipient == "blocked" {
            SendOutcome::RecipientUnreachable {
                reason: "user blocked you".into(),
            }
        } else {
            SendOutcome::Delivered
        }
    }
}

/// Source that knows one account; `expired` simulates a lost session.
pub struct StubSource;

#[async_trait]
impl RecipientSource for StubSource {
    async fn fetch(
        &self,
        target: &str,
        _kind: ExtractionKind,
        max_count: usize,
    ) -> Result<Vec<String>, SourceError> {
        match target {
            TARGET => Ok(FOLLOWERS
                .iter()
                .take(max_count)
                .map(|s| s.to_string())
                .collect()),
            "expired" => Err(SourceError::SessionLost("login required".into())),
            "broken" => Err(SourceError::Upstream("gateway returned 500".into())),
            other => Err(SourceError::NotFound(other.to_string())),
        }
    }
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        session_idle_ttl_secs: 3600,
        max_sessions: 100,
        dispatch: DispatchConfig::default(),
    }
}

/// Build the application state around the stub gateway.
pub fn test_state() -> AppState {
    let config = test_config();
    let event_bus = Arc::new(EventBus::default());
    let controller = Arc::new(JobController::new(
        Arc::new(StubSender),
        Arc::clone(&event_bus),
    ));

    AppState {
        config: Arc::new(config),
        ws_manager: Arc::new(WsManager::new()),
        controller,
        source: Arc::new(StubSource),
        sessions: Arc::new(SessionStore::default()),
        event_bus,
    }
}

/// Build the full application router with all middleware layers.
///
/// Returns the state too so tests can subscribe to the event bus or
/// inspect the controller directly.
pub fn build_test_app() -> (Router, AppState) {
    let state = test_state();
    let app = build_app_router(state.clone(), &test_config());
    (app, state)
}

/// Build a JSON request, optionally tagged with an operator session.
pub fn json_request(method: &str, uri: &str, body: Value, session: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(session) = session {
        builder = builder.header("x-session-id", session);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Build a body-less request, optionally tagged with an operator session.
pub fn empty_request(method: &str, uri: &str, session: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(session) = session {
        builder = builder.header("x-session-id", session);
    }
    builder.body(Body::empty()).unwrap()
}

/// Send a request through the router and parse the JSON response body.
///
/// Non-JSON bodies (e.g. extractor rejections) come back as `Value::Null`.
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}
