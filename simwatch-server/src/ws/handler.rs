use axum::{
    extract::{
        State,
        ws::{Message, Utf8Bytes, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::infra::state::AppState;
use crate::ws::{
    messages::{self, ClientMessage, ServerMessage},
    registry::RelaySink,
};

/// Handle WebSocket upgrade request for the jobs channel
pub async fn jobs_ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Drive one job socket: register an outbound channel, relay job requests
/// to the supervisor, unregister on disconnect.
///
/// Disconnecting does not stop a running job; its remaining events are
/// dropped by the registry.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(256);

    let session_id = Uuid::new_v4();
    state.sessions.register(session_id, tx.clone());
    info!(%session_id, "job session connected");

    // Spawn task to serialize outgoing messages onto the socket
    tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            match serde_json::to_string(&message) {
                Ok(json) => {
                    if ws_sender
                        .send(Message::Text(Utf8Bytes::from(json)))
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
                Err(err) => {
                    warn!(%session_id, error = %err, "failed to serialize outbound message");
                }
            }
        }
    });

    // Handle incoming requests
    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                handle_client_text(text.as_str(), session_id, &state, &tx).await;
            }
            Ok(Message::Close(_)) => break,
            Err(err) => {
                debug!(%session_id, error = %err, "websocket error");
                break;
            }
            _ => {}
        }
    }

    // Clean up on disconnect; the writer task ends once all senders drop
    state.sessions.unregister(&session_id);
    info!(%session_id, "job session disconnected");
}

async fn handle_client_text(
    text: &str,
    session_id: Uuid,
    state: &AppState,
    outbound: &mpsc::Sender<ServerMessage>,
) {
    let request = match serde_json::from_str::<ClientMessage>(text) {
        Ok(request) => request,
        Err(err) => {
            debug!(%session_id, error = %err, "malformed client message");
            let _ = outbound
                .send(ServerMessage::Error {
                    message: format!("malformed request: {err}"),
                })
                .await;
            return;
        }
    };

    match request {
        ClientMessage::StartJob { config } => {
            let config = messages::coerce_config(config);
            let sink = Arc::new(RelaySink::new(Arc::clone(&state.sessions)));

            if let Err(err) = state.supervisor.start(session_id, config, sink).await {
                warn!(%session_id, error = %err, "job start rejected");
                let _ = outbound
                    .send(ServerMessage::Error {
                        message: err.to_string(),
                    })
                    .await;
            }
        }
    }
}
