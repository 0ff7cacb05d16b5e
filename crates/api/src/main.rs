use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use herald_api::config::ServerConfig;
use herald_api::progress::ProgressForwarder;
use herald_api::router::build_app_router;
use herald_api::sessions::SessionStore;
use herald_api::state::AppState;
use herald_api::ws;
use herald_dispatch::{JobController, MessageSender, RecipientSource};
use herald_events::EventBus;
use herald_gateway::{GatewayClient, GatewayConfig};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "herald_api=debug,herald_dispatch=debug,herald_gateway=debug,tower_http=debug"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    let gateway_config = GatewayConfig::from_env();
    tracing::info!(gateway_url = %gateway_config.base_url, "Loaded gateway configuration");

    // --- Platform gateway ---
    let gateway =
        Arc::new(GatewayClient::new(&gateway_config).expect("Failed to build gateway client"));

    // --- WebSocket manager ---
    let ws_manager = Arc::new(ws::WsManager::new());

    // --- Background task cancellation ---
    let background_cancel = CancellationToken::new();

    // --- Operator sessions ---
    let sessions = Arc::new(SessionStore::new(
        Duration::from_secs(config.session_idle_ttl_secs),
        config.max_sessions,
    ));

    // --- Heartbeat (pings observers, evicts idle sessions) ---
    let heartbeat_handle = ws::start_heartbeat(
        Arc::clone(&ws_manager),
        Arc::clone(&sessions),
        background_cancel.child_token(),
    );

    // --- Event bus ---
    let event_bus = Arc::new(EventBus::default());
    tracing::info!("Event bus created");

    // Spawn progress forwarder (routes dispatch events to WebSocket observers).
    let forwarder_handle = tokio::spawn(
        ProgressForwarder::new(Arc::clone(&ws_manager))
            .run(event_bus.subscribe(), background_cancel.child_token()),
    );

    // --- Job controller ---
    let controller = Arc::new(JobController::new(
        Arc::clone(&gateway) as Arc<dyn MessageSender>,
        Arc::clone(&event_bus),
    ));
    tracing::info!("Job controller started");

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        ws_manager: Arc::clone(&ws_manager),
        controller: Arc::clone(&controller),
        source: gateway as Arc<dyn RecipientSource>,
        sessions,
        event_bus: Arc::clone(&event_bus),
    };

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");
    let step_timeout = Duration::from_secs(config.shutdown_timeout_secs);

    // Stop the running job first so its completion reaches observers.
    if tokio::time::timeout(step_timeout, controller.shutdown())
        .await
        .is_err()
    {
        tracing::warn!("Job controller did not stop in time");
    }

    // Give the forwarder a moment to flush the final dm_complete.
    tokio::time::sleep(Duration::from_millis(100)).await;
    background_cancel.cancel();
    let _ = tokio::time::timeout(step_timeout, forwarder_handle).await;
    let _ = tokio::time::timeout(step_timeout, heartbeat_handle).await;
    tracing::info!("Background tasks stopped");

    let ws_count = ws_manager.connection_count().await;
    tracing::info!(ws_count, "Closing remaining WebSocket connections");
    ws_manager.shutdown_all().await;

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
