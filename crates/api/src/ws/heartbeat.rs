use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::sessions::SessionStore;
use crate::ws::manager::WsManager;

/// Interval between heartbeat pings (in seconds).
const HEARTBEAT_INTERVAL_SECS: u64 = 30;

/// Spawn a background task that sends periodic Ping frames to all connected
/// WebSocket clients and evicts idle operator sessions until `cancel` fires.
pub fn start_heartbeat(
    ws_manager: Arc<WsManager>,
    sessions: Arc<SessionStore>,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(HEARTBEAT_INTERVAL_SECS));

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("Heartbeat stopped");
                    break;
                }
                _ = interval.tick() => {
                    let count = ws_manager.connection_count().await;
                    tracing::debug!(count, "WebSocket heartbeat ping");
                    ws_manager.ping_all().await;

                    let evicted = sessions.evict_idle().await;
                    if evicted > 0 {
                        tracing::debug!(evicted, "Evicted idle operator sessions");
                    }
                }
            }
        }
    })
}
