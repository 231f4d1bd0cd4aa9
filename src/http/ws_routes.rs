//! # Live Update WebSocket
//!
//! One endpoint per order. A connection is subscribed on open and removed
//! on close; the channel is receive-only from the client's perspective, so
//! inbound frames are accepted and discarded to keep the connection alive.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use super::AppState;
use crate::realtime::{ConnectionHandle, UpdateNotice};

macro_rules! log_info {
    ($($arg:tt)*) => {
        eprintln!("[INFO] {}", format!($($arg)*));
    };
}

macro_rules! log_error {
    ($($arg:tt)*) => {
        eprintln!("[ERROR] {}", format!($($arg)*));
    };
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/orders/:order_id/ws", get(order_ws))
}

async fn order_ws(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<String>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(state, order_id, socket))
}

async fn handle_socket(state: Arc<AppState>, order_id: String, socket: WebSocket) {
    let (mut sink, mut stream) = socket.split();

    // Bounded channel: a stalled client fills it and gets pruned by the hub
    // instead of stalling broadcasts to everyone else
    let (tx, mut rx) = mpsc::channel::<UpdateNotice>(16);
    let handle = ConnectionHandle::new(tx);
    let connection_id = handle.id();

    state.hub.subscribe(&order_id, handle);
    log_info!("connection {} subscribed to order {}", connection_id, order_id);

    loop {
        tokio::select! {
            notice = rx.recv() => {
                match notice {
                    Some(notice) => {
                        let payload = match serde_json::to_string(&notice) {
                            Ok(payload) => payload,
                            Err(e) => {
                                log_error!("failed to serialize update notice: {}", e);
                                continue;
                            }
                        };
                        if sink.send(Message::Text(payload)).await.is_err() {
                            break;
                        }
                    }
                    // Sender side gone: the hub pruned this connection
                    None => break,
                }
            }

            frame = stream.next() => {
                match frame {
                    // Inbound client frames are discarded
                    Some(Ok(Message::Text(_))) | Some(Ok(Message::Binary(_))) => {}
                    Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {}
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                }
            }
        }
    }

    // Idempotent: the hub may already have pruned us after a failed send
    state.hub.unsubscribe(&order_id, connection_id);
    log_info!("connection {} closed for order {}", connection_id, order_id);
}
