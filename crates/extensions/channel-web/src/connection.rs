//! WebSocket connection management.
//!
//! Each connection owns its own tracker, created on the first frame and
//! closed with the socket.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use gesturecall_protocols::{FrameData, HandTracker};

use crate::WebState;
use crate::message::{ClientMessage, ServerMessage};

enum Outbound {
    Message(ServerMessage),
    Close,
}

/// Handle to a live page connection.
pub struct WebSocketConnection {
    pub id: String,
    tx: mpsc::Sender<Outbound>,
    open: Arc<AtomicBool>,
}

impl WebSocketConnection {
    pub fn spawn(id: String, socket: WebSocket, state: Arc<WebState>) -> Self {
        let (tx, rx) = mpsc::channel(32);
        let open = Arc::new(AtomicBool::new(true));

        tokio::spawn(handle_connection(id.clone(), socket, rx, state, open.clone()));

        Self { id, tx, open }
    }

    pub async fn send(&self, message: ServerMessage) -> bool {
        self.is_open() && self.tx.send(Outbound::Message(message)).await.is_ok()
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    pub async fn close(&self) {
        if self.open.swap(false, Ordering::SeqCst) {
            let _ = self.tx.send(Outbound::Close).await;
        }
    }
}

/// Per-connection tracker, built lazily.
struct Session {
    state: Arc<WebState>,
    tracker: Option<Box<dyn HandTracker>>,
}

impl Session {
    async fn tracker(&mut self) -> Result<&dyn HandTracker, String> {
        if self.tracker.is_none() {
            let tracker = self.state.factory.create().await.map_err(|e| e.to_string())?;
            if let Err(e) = tracker.initialize(&self.state.options).await {
                let _ = tracker.close().await;
                return Err(e.to_string());
            }
            info!(tracker = tracker.name(), "Hand tracker ready");
            self.tracker = Some(tracker);
        }
        self.tracker
            .as_deref()
            .ok_or_else(|| "tracker unavailable".to_string())
    }

    async fn handle(&mut self, message: ClientMessage) -> ServerMessage {
        let now = chrono::Utc::now().timestamp_millis();
        match message {
            ClientMessage::Frame {
                image_data,
                width,
                height,
            } => {
                let frame = FrameData::new(image_data, width, height);
                let tracker = match self.tracker().await {
                    Ok(tracker) => tracker,
                    Err(e) => {
                        error!("Failed to start hand tracker: {}", e);
                        return ServerMessage::error(format!("Hand tracker unavailable: {}", e));
                    }
                };
                match tracker.detect(&frame).await {
                    Ok(hands) => ServerMessage::results(&hands, now),
                    Err(e) => {
                        warn!("Frame processing failed: {}", e);
                        ServerMessage::error(e.to_string())
                    }
                }
            }
            ClientMessage::Landmarks { hands } => ServerMessage::results(&hands, now),
            ClientMessage::Ping => ServerMessage::Pong,
        }
    }

    async fn close(&mut self) {
        if let Some(tracker) = self.tracker.take() {
            if let Err(e) = tracker.close().await {
                warn!("Failed to close hand tracker: {}", e);
            }
        }
    }
}

fn decode(text: &str) -> Result<ClientMessage, ServerMessage> {
    serde_json::from_str(text).map_err(|e| ServerMessage::error(format!("Invalid message: {}", e)))
}

async fn handle_connection(
    conn_id: String,
    socket: WebSocket,
    mut outbound_rx: mpsc::Receiver<Outbound>,
    state: Arc<WebState>,
    open: Arc<AtomicBool>,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut session = Session {
        state: state.clone(),
        tracker: None,
    };

    info!("WebSocket connection established: {}", conn_id);

    loop {
        let reply = tokio::select! {
            outbound = outbound_rx.recv() => match outbound {
                Some(Outbound::Message(message)) => message,
                Some(Outbound::Close) | None => {
                    let _ = ws_tx.send(Message::Close(None)).await;
                    break;
                }
            },

            inbound = ws_rx.next() => match inbound {
                Some(Ok(Message::Text(text))) => match decode(&text) {
                    Ok(message) => session.handle(message).await,
                    Err(reply) => reply,
                },
                Some(Ok(Message::Close(_))) | None => {
                    info!("WebSocket connection closed: {}", conn_id);
                    break;
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    error!("WebSocket error from {}: {}", conn_id, e);
                    break;
                }
            },
        };

        if let Err(e) = ws_tx.send(Message::Text(reply.to_json().into())).await {
            warn!("Failed to send message to {}: {}", conn_id, e);
            break;
        }
    }

    open.store(false, Ordering::SeqCst);
    session.close().await;
    state.connections.remove(&conn_id);
    debug!("WebSocket connection removed: {}", conn_id);
}
