//! HTTP server and routing.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use axum::{
    Router,
    extract::{
        State,
        ws::{WebSocket, WebSocketUpgrade},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use rust_embed::RustEmbed;
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::{WebSocketConnection, WebState};

#[derive(RustEmbed)]
#[folder = "src/static/"]
struct StaticAssets;

pub fn create_router(state: Arc<WebState>) -> Router {
    Router::new()
        .route("/", get(serve_index))
        .route("/style.css", get(serve_css))
        .route("/app.js", get(serve_js))
        .route("/ws", get(ws_handler))
        .route("/health", get(health_check))
        .route("/api/info", get(api_info))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn asset(path: &str, content_type: &'static str) -> Response {
    match StaticAssets::get(path) {
        Some(content) => (
            [(header::CONTENT_TYPE, content_type)],
            content.data.into_owned(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, format!("{} not found", path)).into_response(),
    }
}

async fn serve_index() -> Response {
    asset("index.html", "text/html; charset=utf-8")
}

async fn serve_css() -> Response {
    asset("style.css", "text/css")
}

async fn serve_js() -> Response {
    asset("app.js", "application/javascript")
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<WebState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<WebState>) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    debug!("New WebSocket connection: {}", conn_id);

    let conn = WebSocketConnection::spawn(conn_id.clone(), socket, state.clone());
    state.connections.insert(conn_id, conn);
}

async fn health_check(State(state): State<Arc<WebState>>) -> impl IntoResponse {
    let status = if state.started.load(Ordering::SeqCst) {
        "ok"
    } else {
        "starting"
    };

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        serde_json::json!({
            "status": status,
            "connections": state.connections.len(),
        })
        .to_string(),
    )
}

/// Capture settings for the page plus the endpoint map.
async fn api_info(State(state): State<Arc<WebState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        serde_json::json!({
            "name": "GestureCall",
            "version": env!("CARGO_PKG_VERSION"),
            "capture": {
                "width": state.config.width,
                "height": state.config.height,
                "facingMode": "user",
                "frameIntervalMs": state.config.frame_interval_ms,
            },
            "endpoints": {
                "websocket": "/ws",
                "health": "/health",
                "info": "/api/info"
            }
        })
        .to_string(),
    )
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
