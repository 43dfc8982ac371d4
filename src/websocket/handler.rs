//! Per-connection WebSocket loop.
//!
//! Each socket splits into a receive loop and a dedicated send task fed by a
//! bounded channel. Outbound delivery is best-effort: a full queue drops the
//! frame, a closed peer kills the sink, and neither ever reaches back into
//! room state from here.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use crate::protocol::{ClientEvent, ConnectionRole, PlayerId, ServerEvent};
use crate::room::{ConnectionId, StateSink};
use crate::server::GameServer;

const SEND_QUEUE_CAPACITY: usize = 64;

/// Sink half of one WebSocket connection as seen by the room's
/// `ConnectionSet`.
struct WsSink {
    sender: mpsc::Sender<ServerEvent>,
    closed: AtomicBool,
    shutdown: Arc<Notify>,
}

impl StateSink for WsSink {
    fn send(&self, event: ServerEvent) -> bool {
        if self.closed.load(Ordering::Relaxed) {
            return false;
        }
        match self.sender.try_send(event) {
            Ok(()) => true,
            // Queue full: drop this frame but keep the connection. The next
            // broadcast carries a complete snapshot anyway.
            Err(TrySendError::Full(_)) => true,
            Err(TrySendError::Closed(_)) => false,
        }
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Relaxed) || self.sender.is_closed()
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Relaxed);
        self.shutdown.notify_waiters();
    }
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path(code): Path<String>,
    State(server): State<Arc<GameServer>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, server, code))
}

async fn handle_socket(socket: WebSocket, server: Arc<GameServer>, code: String) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<ServerEvent>(SEND_QUEUE_CAPACITY);
    let shutdown = Arc::new(Notify::new());

    let send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(err) => {
                    warn!(error = %err, "Failed to serialize outbound event");
                    continue;
                }
            };
            if ws_sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
        let _ = ws_sender.close().await;
    });

    let mut registration: Option<(ConnectionId, ConnectionRole, Option<PlayerId>)> = None;

    loop {
        let incoming = tokio::select! {
            incoming = ws_receiver.next() => incoming,
            () = shutdown.notified() => break,
        };
        let Some(incoming) = incoming else {
            break;
        };
        let message = match incoming {
            Ok(message) => message,
            Err(err) => {
                debug!(room_code = %code, error = %err, "WebSocket receive error");
                break;
            }
        };

        let event = match message {
            Message::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => event,
                Err(_) => {
                    let _ = tx.send(ServerEvent::error("Unrecognized message")).await;
                    continue;
                }
            },
            Message::Binary(_) => {
                let _ = tx.send(ServerEvent::error("Unrecognized message")).await;
                continue;
            }
            Message::Close(_) => break,
            Message::Ping(_) | Message::Pong(_) => continue,
        };

        match event {
            ClientEvent::Register {
                role,
                host_secret,
                player_id,
            } => {
                if registration.is_some() {
                    let _ = tx.send(ServerEvent::error("Already registered")).await;
                    continue;
                }
                let sink = Arc::new(WsSink {
                    sender: tx.clone(),
                    closed: AtomicBool::new(false),
                    shutdown: shutdown.clone(),
                });
                match server
                    .register_connection(
                        &code,
                        role,
                        host_secret.as_deref(),
                        player_id.as_deref(),
                        sink,
                    )
                    .await
                {
                    Ok((connection_id, snapshot)) => {
                        info!(room_code = %code, ?role, "WebSocket registered");
                        registration = Some((connection_id, role, player_id.clone()));
                        let _ = tx.send(ServerEvent::Registered { role, player_id }).await;
                        let _ = tx.send(ServerEvent::State { payload: snapshot }).await;
                    }
                    Err(err) => {
                        let _ = tx.send(ServerEvent::error(err.to_string())).await;
                    }
                }
            }
            ClientEvent::Buzz => match &registration {
                Some((_, ConnectionRole::Player, Some(player_id))) => {
                    if let Err(err) = server.buzz(&code, player_id).await {
                        let _ = tx.send(ServerEvent::error(err.to_string())).await;
                    }
                }
                Some(_) => {
                    let _ = tx.send(ServerEvent::error("Only players can buzz")).await;
                }
                None => {
                    let _ = tx
                        .send(ServerEvent::error("Register before sending messages"))
                        .await;
                }
            },
        }
    }

    if let Some((connection_id, _, _)) = registration {
        server.unregister_connection(&code, connection_id).await;
    }
    // Dropping our sender lets the send task drain and exit once the room
    // has released its sink handle too.
    drop(tx);
    let _ = send_task.await;
}
