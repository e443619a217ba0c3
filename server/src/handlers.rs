use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect};
use futures_util::{SinkExt, StreamExt};
use inkroom_shared::{ClientMessage, SessionId};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::state::AppState;

pub async fn ping_handler() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}

/// Hands out a fresh session id. The session itself comes into being on the
/// first `join-session`.
pub async fn root_handler() -> impl IntoResponse {
    Redirect::to(&format!("/session/{}", Uuid::new_v4()))
}

pub async fn session_handler(
    Path(session_id): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    if SessionId::parse(session_id).is_err() {
        return StatusCode::NOT_FOUND.into_response();
    }
    match tokio::fs::read_to_string(&state.index_file).await {
        Ok(contents) => Html(contents).into_response(),
        Err(error) => {
            warn!(path = %state.index_file.display(), %error, "failed to read index file");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut socket_sender, mut socket_receiver) = socket.split();
    let (connection_id, mut rx) = state.engine.connect();
    info!(conn = %connection_id, "WS connected");

    let send_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let payload = match serde_json::to_string(&message) {
                Ok(payload) => payload,
                Err(error) => {
                    warn!(conn = %connection_id, %error, "failed to encode event");
                    continue;
                }
            };
            if socket_sender.send(Message::Text(payload)).await.is_err() {
                break;
            }
        }
    });

    let mut close_frame = None;

    while let Some(Ok(message)) = socket_receiver.next().await {
        match message {
            Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_message) => {
                    if let Err(error) = state.engine.handle(connection_id, client_message).await {
                        debug!(conn = %connection_id, %error, "dropped event");
                    }
                }
                Err(error) => {
                    debug!(conn = %connection_id, %error, "dropped malformed event");
                }
            },
            Message::Close(frame) => {
                close_frame = frame;
                break;
            }
            _ => {}
        }
    }

    state.engine.disconnect(connection_id).await;
    send_task.abort();
    match &close_frame {
        Some(frame) => info!(
            conn = %connection_id,
            code = frame.code,
            reason = %frame.reason,
            "WS disconnected"
        ),
        None => info!(conn = %connection_id, "WS disconnected"),
    }
}
