use std::collections::HashMap;
use std::future::Future;

use axum::body::Bytes;
use axum::extract::ws::Message;
use herald_core::types::Timestamp;
use tokio::sync::{mpsc, RwLock};

/// Channel sender half for pushing messages to a WebSocket connection.
pub type WsSender = mpsc::UnboundedSender<Message>;

/// Metadata for a single WebSocket connection.
pub struct WsConnection {
    /// Channel sender for outbound messages to this connection.
    pub sender: WsSender,
    /// When this connection was established.
    pub connected_at: Timestamp,
}

/// Manages all active observer connections.
///
/// Thread-safe via interior `RwLock`; designed to be wrapped in `Arc` and
/// shared across the application. Sends never block: each connection has
/// an unbounded queue drained by its own sender task.
pub struct WsManager {
    connections: RwLock<HashMap<String, WsConnection>>,
}

impl WsManager {
    /// Create a new, empty connection manager.
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new connection.
    ///
    /// `greeting` is awaited while the registry is write-locked; the message
    /// it yields, if any, is queued first, so no broadcast can land ahead of
    /// it or fall between it and registration. Returns the receiver half of
    /// the message channel so the caller can forward messages to the
    /// WebSocket sink.
    pub async fn add<Fut>(&self, conn_id: String, greeting: Fut) -> mpsc::UnboundedReceiver<Message>
    where
        Fut: Future<Output = Option<Message>>,
    {
        let mut connections = self.connections.write().await;
        let (tx, rx) = mpsc::unbounded_channel();
        if let Some(message) = greeting.await {
            let _ = tx.send(message);
        }
        let conn = WsConnection {
            sender: tx,
            connected_at: chrono::Utc::now(),
        };
        connections.insert(conn_id, conn);
        rx
    }

    /// Remove a connection by its ID.
    pub async fn remove(&self, conn_id: &str) {
        if let Some(conn) = self.connections.write().await.remove(conn_id) {
            let connected_secs = (chrono::Utc::now() - conn.connected_at).num_seconds();
            tracing::debug!(conn_id, connected_secs, "WebSocket connection removed");
        }
    }

    /// Broadcast a message to all connected clients.
    ///
    /// Connections whose send channels are closed are silently skipped
    /// (they will be cleaned up on their next receive loop iteration).
    /// Returns the number of connections the message was queued for.
    pub async fn broadcast(&self, message: Message) -> usize {
        let conns = self.connections.read().await;
        conns
            .values()
            .filter(|conn| conn.sender.send(message.clone()).is_ok())
            .count()
    }

    /// Serialize `value` once and broadcast it as a Text frame.
    pub async fn broadcast_json(&self, value: &serde_json::Value) -> usize {
        self.broadcast(Message::Text(value.to_string().into())).await
    }

    /// Return the current number of active connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Send a Close frame to every connection, then clear the map.
    ///
    /// Used during graceful shutdown to notify all clients before the
    /// server exits.
    pub async fn shutdown_all(&self) {
        let mut conns = self.connections.write().await;
        let count = conns.len();
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Close(None));
        }
        conns.clear();
        tracing::info!(count, "Closed all WebSocket connections");
    }

    /// Send a Ping frame to every connected client.
    ///
    /// Used by the heartbeat task to keep connections alive and detect
    /// stale ones.
    pub async fn ping_all(&self) {
        let conns = self.connections.read().await;
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Ping(Bytes::new()));
        }
    }
}

impl Default for WsManager {
    fn default() -> Self {
        Self::new()
    }
}
