use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};

use crate::progress::status_message;
use crate::state::AppState;

/// HTTP handler that upgrades the connection to WebSocket.
///
/// After the upgrade the connection is registered with `WsManager`, sent a
/// `dm_status` snapshot of the current job, and then receives every
/// dispatch event broadcast from that point on.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Manage a single WebSocket connection after upgrade.
///
///   1. Registers the connection with `WsManager`, queueing the current job
///      snapshot ahead of any broadcast.
///   2. Splits the socket into a sink (outbound) and stream (inbound).
///   3. Spawns a sender task that forwards messages from the manager channel.
///   4. Drains inbound frames on the current task until the client leaves.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let ws_manager = state.ws_manager;
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, "WebSocket connected");

    // The snapshot is taken during registration so it precedes every live event.
    let controller = state.controller;
    let mut rx = ws_manager
        .add(conn_id.clone(), async move {
            let snapshot = status_message(controller.current().await.as_ref());
            Some(Message::Text(snapshot.to_string().into()))
        })
        .await;

    let (mut sink, mut stream) = socket.split();

    // Sender task: forward channel messages to the WebSocket sink.
    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let closing = matches!(msg, Message::Close(_));
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
            if closing {
                break;
            }
        }
    });

    // Observers only listen; inbound frames are drained and ignored.
    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    // Clean up: remove connection and abort sender task.
    ws_manager.remove(&conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, "WebSocket disconnected");
}
