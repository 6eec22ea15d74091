use super::*;
use axum::body::{Body, to_bytes};
use axum::http::Request;
use gesturecall_core::NullTrackerFactory;
use gesturecall_protocols::TrackerOptions;
use tower::ServiceExt;

use crate::WebConfig;

fn state() -> Arc<WebState> {
    Arc::new(WebState::new(
        WebConfig::default(),
        Arc::new(NullTrackerFactory),
        TrackerOptions::default(),
    ))
}

async fn get(path: &str) -> (StatusCode, String, String) {
    let response = create_router(state())
        .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string())
        .unwrap_or_default();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, content_type, String::from_utf8_lossy(&body).to_string())
}

#[tokio::test]
async fn test_index_page() {
    let (status, content_type, body) = get("/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.starts_with("text/html"));
    assert!(body.contains("<video id=\"video\""));
    assert!(body.contains("app.js"));
}

#[tokio::test]
async fn test_static_assets() {
    let (status, content_type, body) = get("/app.js").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type, "application/javascript");
    assert!(body.contains("'frame'"));
    assert!(body.contains("imageData"));

    let (status, content_type, _) = get("/style.css").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type, "text/css");
}

#[tokio::test]
async fn test_health_reports_starting_until_started() {
    let (status, _, body) = get("/health").await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "starting");
    assert_eq!(json["connections"], 0);
}

#[tokio::test]
async fn test_api_info_capture_settings() {
    let (_, _, body) = get("/api/info").await;
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["capture"]["width"], 1280);
    assert_eq!(json["capture"]["height"], 720);
    assert_eq!(json["capture"]["frameIntervalMs"], 500);
    assert_eq!(json["endpoints"]["websocket"], "/ws");
}

#[tokio::test]
async fn test_unknown_route() {
    let (status, _, _) = get("/libs/hands.js").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
