use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::mpsc;

use super::AppState;
use super::ai::handlers::{AI_FAILURE, respond_to};

/// JSON frame exchanged over the socket: `{ "event": ..., "data": ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocketEvent {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl SocketEvent {
    pub fn new(event: &str, data: Value) -> Self {
        Self {
            event: event.to_string(),
            data,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AiRequest {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    language: Option<String>,
    /// Connection that should receive the answer; defaults to the sender.
    #[serde(default)]
    socket_id: Option<String>,
}

/// GET /socket — WebSocket upgrade for chat.
pub(crate) async fn socket_ws(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let socket_id = uuid::Uuid::new_v4().to_string();
    let (tx, mut rx) = mpsc::unbounded_channel::<SocketEvent>();
    state
        .sockets
        .write()
        .await
        .insert(socket_id.clone(), tx.clone());
    tracing::info!(socket_id = %socket_id, "socket connected");

    let (mut ws_sink, mut ws_stream) = socket.split();

    // Outbound queue -> WS sink
    let ws_write_handle = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(t) => t,
                Err(e) => {
                    tracing::error!(error = %e, "failed to serialize socket event");
                    continue;
                }
            };
            if ws_sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    let _ = tx.send(SocketEvent::new(
        "connected",
        json!({ "socketId": socket_id }),
    ));

    while let Some(Ok(msg)) = ws_stream.next().await {
        match msg {
            Message::Text(text) => match serde_json::from_str::<SocketEvent>(text.as_str()) {
                Ok(event) => {
                    let state = state.clone();
                    let sender = socket_id.clone();
                    tokio::spawn(async move { handle_event(&state, &sender, event).await });
                }
                Err(e) => {
                    tracing::debug!(socket_id = %socket_id, error = %e, "ignoring malformed socket frame");
                }
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    state.sockets.write().await.remove(&socket_id);
    ws_write_handle.abort();
    tracing::info!(socket_id = %socket_id, "socket disconnected");
}

/// Run one inbound event to completion and emit any reply.
pub(crate) async fn handle_event(state: &AppState, sender: &str, event: SocketEvent) {
    match event.event.as_str() {
        "generate-ai-response" => {
            let request: AiRequest = match serde_json::from_value(event.data) {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(socket_id = %sender, error = %e, "bad generate-ai-response payload");
                    emit(state, sender, None, ai_error()).await;
                    return;
                }
            };

            let text = request.text.as_deref().filter(|t| !t.trim().is_empty());
            let reply = match text {
                None => ai_error(),
                Some(text) => match respond_to(
                    state.workers_ai.as_ref(),
                    text,
                    request.language.as_deref(),
                )
                .await
                {
                    Ok(response) => SocketEvent::new("ai-response", json!({ "response": response })),
                    Err(e) => {
                        tracing::error!(error = %e, "error in AI response");
                        ai_error()
                    }
                },
            };

            emit(state, sender, request.socket_id.as_deref(), reply).await;
        }
        other => {
            tracing::debug!(socket_id = %sender, event = %other, "ignoring unknown socket event");
        }
    }
}

fn ai_error() -> SocketEvent {
    SocketEvent::new("ai-response", json!({ "error": AI_FAILURE }))
}

/// Deliver to `target` when it names a live connection, else back to `sender`.
async fn emit(state: &AppState, sender: &str, target: Option<&str>, event: SocketEvent) {
    let sockets = state.sockets.read().await;
    let recipient = target
        .filter(|id| sockets.contains_key(*id))
        .unwrap_or(sender);

    match sockets.get(recipient) {
        Some(tx) => {
            if tx.send(event).is_err() {
                tracing::debug!(socket_id = %recipient, "socket closed before reply");
            }
        }
        None => tracing::debug!(socket_id = %recipient, "no live socket for reply"),
    }
}
