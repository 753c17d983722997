//! WebSocket live feed.
//!
//! Each connection holds one log subscription and receives the full window
//! on connect and after every append. Messages sent by the client are ignored;
//! publishing goes through `POST /api/messages`.

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    infrastructure::dto::{MessagesQuery, WindowMessage},
    ui::state::AppState,
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<MessagesQuery>,
) -> impl IntoResponse {
    let limit = state.clamp_limit(query.limit);
    ws.on_upgrade(move |socket| handle_socket(socket, state, limit))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, limit: usize) {
    let (mut sender, mut receiver) = socket.split();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let handle = match state.log.subscribe_ordered(limit, tx).await {
        Ok(handle) => handle,
        Err(e) => {
            tracing::warn!("Failed to subscribe WebSocket client: {}", e);
            let _ = sender.send(Message::Close(None)).await;
            return;
        }
    };
    tracing::info!("WebSocket client subscribed ({}, limit {})", handle, limit);

    // Spawn a task to push every window to this client
    let closing = state.clone();
    let mut send_task = tokio::spawn(async move {
        loop {
            let window = tokio::select! {
                window = rx.recv() => match window {
                    Some(window) => window,
                    None => break,
                },
                _ = closing.feeds_closed() => {
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
            };
            let json = match serde_json::to_string(&WindowMessage::from(&window)) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("Failed to encode window: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    // Spawn a task to watch for the client closing the connection
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => break,
                Ok(Message::Ping(_)) => {
                    tracing::debug!("Received ping");
                    // Ping/pong is handled automatically by the WebSocket protocol
                }
                Ok(other) => tracing::debug!("Ignoring client frame: {:?}", other),
                Err(e) => {
                    tracing::warn!("WebSocket error: {}", e);
                    break;
                }
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    state.log.unsubscribe(handle).await;
    tracing::info!("WebSocket client disconnected ({})", handle);
}
