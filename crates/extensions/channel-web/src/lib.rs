//! # GestureCall Channel - Web
//!
//! The standalone variant: one web page captures the camera and streams
//! frames over a WebSocket; the server runs the hand tracker and the
//! classifier and sends the labelled hands back for drawing.
//!
//! ## Usage
//!
//! ```ignore
//! use gesturecall_channel_web::{WebConfig, WebServer};
//!
//! let server = WebServer::new(WebConfig::default(), factory, options);
//! let addr = server.start().await?;
//! ```

mod connection;
pub mod message;
mod server;

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use gesturecall_protocols::{HandTrackerFactory, TrackerOptions};

pub use connection::WebSocketConnection;
pub use message::{ClientMessage, HandReport, ServerMessage};
pub use server::create_router;

/// Web server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
    /// How often the page sends a frame.
    pub frame_interval_ms: u64,
    pub width: u32,
    pub height: u32,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            frame_interval_ms: 500,
            width: 1280,
            height: 720,
        }
    }
}

/// State shared across handlers.
pub struct WebState {
    pub config: WebConfig,
    pub factory: Arc<dyn HandTrackerFactory>,
    pub options: TrackerOptions,
    pub connections: DashMap<String, WebSocketConnection>,
    pub started: AtomicBool,
}

impl WebState {
    pub fn new(config: WebConfig, factory: Arc<dyn HandTrackerFactory>, options: TrackerOptions) -> Self {
        Self {
            config,
            factory,
            options,
            connections: DashMap::new(),
            started: AtomicBool::new(false),
        }
    }
}

pub struct WebServer {
    state: Arc<WebState>,
    server_handle: Mutex<Option<JoinHandle<()>>>,
}

impl WebServer {
    pub fn new(config: WebConfig, factory: Arc<dyn HandTrackerFactory>, options: TrackerOptions) -> Self {
        Self {
            state: Arc::new(WebState::new(config, factory, options)),
            server_handle: Mutex::new(None),
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.state.config.host, self.state.config.port)
    }

    pub fn state(&self) -> Arc<WebState> {
        self.state.clone()
    }

    pub fn is_started(&self) -> bool {
        self.state.started.load(Ordering::SeqCst)
    }

    pub fn connection_count(&self) -> usize {
        self.state.connections.len()
    }

    /// Bind and serve in the background. Returns the bound address.
    pub async fn start(&self) -> std::io::Result<SocketAddr> {
        let mut handle = self.server_handle.lock().await;
        if handle.is_some() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "web server already started",
            ));
        }

        let listener = tokio::net::TcpListener::bind(self.address()).await?;
        let local = listener.local_addr()?;
        let router = create_router(self.state.clone());

        info!("Web page available at http://{}", local);
        self.state.started.store(true, Ordering::SeqCst);

        *handle = Some(tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!("Web server error: {}", e);
            }
        }));
        Ok(local)
    }

    pub async fn stop(&self) {
        if !self.state.started.swap(false, Ordering::SeqCst) {
            return;
        }

        // Connection tasks remove themselves from the map on exit; no map
        // guard may be held across the awaits below.
        let ids: Vec<String> = self.state.connections.iter().map(|e| e.key().clone()).collect();
        for id in ids {
            if let Some((_, connection)) = self.state.connections.remove(&id) {
                connection.close().await;
            }
        }

        if let Some(handle) = self.server_handle.lock().await.take() {
            handle.abort();
        }
        debug!("Web server stopped");
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
