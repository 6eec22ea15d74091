use super::*;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use gesturecall_core::testing::{ScriptedTrackerFactory, open_palm};
use gesturecall_protocols::Handedness;
use serde_json::{Value, json};
use tokio_tungstenite::tungstenite::Message;

fn local_config() -> WebConfig {
    WebConfig {
        port: 0,
        ..WebConfig::default()
    }
}

async fn next_json<S>(ws: &mut S) -> Value
where
    S: futures::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        if let Message::Text(text) = msg {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

#[test]
fn test_web_config_default() {
    let config = WebConfig::default();
    assert_eq!(config.host, "127.0.0.1");
    assert_eq!(config.port, 8000);
    assert_eq!(config.frame_interval_ms, 500);
    assert_eq!((config.width, config.height), (1280, 720));
}

#[test]
fn test_web_config_partial_deserialization() {
    let config: WebConfig = serde_json::from_str(r#"{"port":9000}"#).unwrap();
    assert_eq!(config.port, 9000);
    assert_eq!(config.host, "127.0.0.1");
}

#[tokio::test]
async fn test_frames_are_classified_over_websocket() {
    let factory = Arc::new(ScriptedTrackerFactory::new(vec![open_palm(Handedness::Left)]));
    let server = WebServer::new(local_config(), factory.clone(), TrackerOptions::default());
    let addr = server.start().await.unwrap();
    assert!(server.is_started());

    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{}/ws", addr))
        .await
        .unwrap();

    let frame = json!({"type": "frame", "imageData": "data:image/jpeg;base64,AA", "width": 4, "height": 4});
    ws.send(Message::Text(frame.to_string().into())).await.unwrap();
    let reply = next_json(&mut ws).await;
    assert_eq!(reply["type"], "results");
    assert_eq!(reply["status"], "Left hand: Hand raised");
    assert_eq!(reply["hands"][0]["gesture"], "open_palm");

    // Second frame reuses the connection's tracker.
    ws.send(Message::Text(frame.to_string().into())).await.unwrap();
    next_json(&mut ws).await;
    assert_eq!(factory.created(), 1);
    assert_eq!(factory.detections(), 2);
    assert_eq!(server.connection_count(), 1);

    ws.close(None).await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(factory.closed(), 1);
    assert_eq!(server.connection_count(), 0);

    server.stop().await;
    assert!(!server.is_started());
}

#[tokio::test]
async fn test_landmarks_and_bad_messages() {
    let factory = Arc::new(ScriptedTrackerFactory::new(Vec::new()));
    let server = WebServer::new(local_config(), factory.clone(), TrackerOptions::default());
    let addr = server.start().await.unwrap();
    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{}/ws", addr))
        .await
        .unwrap();

    let landmarks = json!({"type": "landmarks", "hands": []});
    ws.send(Message::Text(landmarks.to_string().into())).await.unwrap();
    let reply = next_json(&mut ws).await;
    assert_eq!(reply["status"], "Detecting gestures...");
    // Landmark-only clients never start a tracker.
    assert_eq!(factory.created(), 0);

    ws.send(Message::Text("not json".into())).await.unwrap();
    let reply = next_json(&mut ws).await;
    assert_eq!(reply["type"], "error");

    ws.send(Message::Text(r#"{"type":"ping"}"#.into())).await.unwrap();
    assert_eq!(next_json(&mut ws).await["type"], "pong");

    server.stop().await;
}

#[tokio::test]
async fn test_tracker_failure_is_reported() {
    let factory = Arc::new(ScriptedTrackerFactory::new(Vec::new()).failing_initialize());
    let server = WebServer::new(local_config(), factory, TrackerOptions::default());
    let addr = server.start().await.unwrap();
    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{}/ws", addr))
        .await
        .unwrap();

    let frame = json!({"type": "frame", "imageData": "data:image/jpeg;base64,AA"});
    ws.send(Message::Text(frame.to_string().into())).await.unwrap();
    let reply = next_json(&mut ws).await;
    assert_eq!(reply["type"], "error");
    assert!(reply["message"].as_str().unwrap().contains("model assets missing"));

    server.stop().await;
}

#[tokio::test]
async fn test_start_twice_fails() {
    let server = WebServer::new(
        local_config(),
        Arc::new(ScriptedTrackerFactory::new(Vec::new())),
        TrackerOptions::default(),
    );
    server.start().await.unwrap();
    assert!(server.start().await.is_err());
    server.stop().await;
}

#[tokio::test]
async fn test_stop_closes_live_connections() {
    let factory = Arc::new(ScriptedTrackerFactory::new(Vec::new()));
    let server = WebServer::new(local_config(), factory.clone(), TrackerOptions::default());
    let addr = server.start().await.unwrap();

    let frame = json!({"type": "frame", "imageData": "data:image/jpeg;base64,AA"});
    let mut clients = Vec::new();
    for _ in 0..2 {
        let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{}/ws", addr))
            .await
            .unwrap();
        ws.send(Message::Text(frame.to_string().into())).await.unwrap();
        assert_eq!(next_json(&mut ws).await["type"], "results");
        clients.push(ws);
    }
    assert_eq!(server.connection_count(), 2);

    tokio::time::timeout(Duration::from_secs(5), server.stop())
        .await
        .expect("stop hung with open connections");
    assert_eq!(server.connection_count(), 0);

    for mut ws in clients {
        let closed = tokio::time::timeout(Duration::from_secs(5), ws.next()).await.unwrap();
        assert!(matches!(closed, Some(Ok(Message::Close(_))) | None | Some(Err(_))));
    }
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(factory.closed(), 2);
}
