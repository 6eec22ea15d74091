use super::*;
use std::sync::atomic::AtomicUsize;

use gesturecall_protocols::{Handedness, TrackerOptions};

use crate::relay::LocalInferenceHost;
use crate::relay::bus::mailbox;
use crate::testing::{RecordingEndpoint, ScriptedTrackerFactory, StaticTabs, open_palm};

/// Host that hands out one shared recording endpoint and counts creations.
struct CountingHost {
    endpoint: Arc<RecordingEndpoint>,
    created: AtomicUsize,
    closed: AtomicUsize,
    fail: bool,
}

impl CountingHost {
    fn new() -> Self {
        Self {
            endpoint: Arc::new(RecordingEndpoint::new()),
            created: AtomicUsize::new(0),
            closed: AtomicUsize::new(0),
            fail: false,
        }
    }
}

#[async_trait]
impl InferenceHost for CountingHost {
    async fn create(&self) -> Result<Arc<dyn RelayEndpoint>, RelayError> {
        if self.fail {
            return Err(RelayError::InferenceUnavailable("offscreen disabled".into()));
        }
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(self.endpoint.clone())
    }

    async fn close(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

fn tab(id: &str, url: Option<&str>) -> TabInfo {
    TabInfo::new(id, url.map(str::to_string))
}

fn results() -> DetectionResult {
    DetectionResult::new(vec![open_palm(Handedness::Right)], 1)
}

#[tokio::test]
async fn test_repeated_initialize_creates_one_context() {
    let host = Arc::new(CountingHost::new());
    let coordinator = Coordinator::new(Arc::new(StaticTabs::new(vec![])), host.clone());

    for _ in 0..3 {
        assert!(coordinator.handle(RelayMessage::InitializeHandDetection).await.success);
    }
    assert_eq!(host.created.load(Ordering::SeqCst), 1);
    assert_eq!(coordinator.contexts_created(), 1);
    assert_eq!(host.endpoint.count("initializeHandDetection"), 3);
}

#[tokio::test]
async fn test_concurrent_initialize_creates_one_context() {
    let host = Arc::new(CountingHost::new());
    let coordinator = Arc::new(Coordinator::new(Arc::new(StaticTabs::new(vec![])), host.clone()));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let coordinator = coordinator.clone();
        handles.push(tokio::spawn(async move {
            coordinator.handle(RelayMessage::InitializeHandDetection).await
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().success);
    }
    assert_eq!(host.created.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_frame_without_context_is_not_initialized() {
    let host = Arc::new(CountingHost::new());
    let coordinator = Coordinator::new(Arc::new(StaticTabs::new(vec![])), host.clone());

    let response = coordinator
        .handle(RelayMessage::ProcessFrame {
            image_data: "x".into(),
        })
        .await;
    assert!(!response.success);
    assert_eq!(response.error.as_deref(), Some("Hand detection not initialized"));
    assert_eq!(host.created.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_stop_tears_down_context() {
    let host = Arc::new(CountingHost::new());
    let coordinator = Coordinator::new(Arc::new(StaticTabs::new(vec![])), host.clone());

    coordinator.handle(RelayMessage::InitializeHandDetection).await;
    assert!(coordinator.handle(RelayMessage::StopHandDetection).await.success);
    assert_eq!(host.closed.load(Ordering::SeqCst), 1);
    assert!(!coordinator.has_inference().await);

    // A second stop has nothing to tear down.
    assert!(coordinator.handle(RelayMessage::StopHandDetection).await.success);
    assert_eq!(host.closed.load(Ordering::SeqCst), 1);

    // Initialize after stop brings up a fresh context.
    coordinator.handle(RelayMessage::InitializeHandDetection).await;
    assert_eq!(host.created.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_context_creation_failure() {
    let host = Arc::new(CountingHost {
        fail: true,
        ..CountingHost::new()
    });
    let coordinator = Coordinator::new(Arc::new(StaticTabs::new(vec![])), host);

    let response = coordinator.handle(RelayMessage::InitializeHandDetection).await;
    assert!(!response.success);
    assert!(response.error.unwrap().contains("offscreen disabled"));
    assert!(!coordinator.has_inference().await);
}

#[tokio::test]
async fn test_broadcast_only_reaches_eligible_tabs() {
    let tabs = Arc::new(
        StaticTabs::new(vec![
            tab("1", Some("https://chatgpt.com/c/1")),
            tab("2", Some("chrome://extensions")),
            tab("3", None),
            tab("4", Some("https://example.com/")),
            tab("5", Some("chrome-extension://abc/popup.html")),
            tab("6", Some("https://news.example.org/")),
        ])
        .with_unreachable(&["6"]),
    );
    let coordinator = Coordinator::new(tabs.clone(), Arc::new(CountingHost::new()));

    let (report, response) = coordinator.broadcast(results()).await;
    assert_eq!(report.known, 6);
    assert_eq!(report.attempted, 3);
    assert_eq!(report.delivered, 2);
    assert!(report.delivered <= report.attempted);
    assert_eq!(tabs.attempts().len(), 3);
    assert!(response.success);
    assert_eq!(response.tabs_sent, Some(2));
}

#[tokio::test]
async fn test_broadcast_without_eligible_tabs() {
    let tabs = Arc::new(StaticTabs::new(vec![tab("1", Some("chrome://newtab")), tab("2", None)]));
    let coordinator = Coordinator::new(tabs.clone(), Arc::new(CountingHost::new()));

    let (report, response) = coordinator.broadcast(results()).await;
    assert_eq!(report.attempted, 0);
    assert!(tabs.attempts().is_empty());
    assert!(!response.success);
    assert_eq!(response.error.as_deref(), Some("No valid tabs"));
}

#[tokio::test]
async fn test_results_only_forwarded_while_context_exists() {
    let tabs = Arc::new(StaticTabs::new(vec![tab("1", Some("https://example.com/"))]));
    let coordinator = Coordinator::new(tabs.clone(), Arc::new(CountingHost::new()));
    let message = || RelayMessage::HandDetectionResults { results: results() };

    assert!(!coordinator.handle(message()).await.success);
    assert!(tabs.attempts().is_empty());

    coordinator.handle(RelayMessage::InitializeHandDetection).await;
    let response = coordinator.handle(message()).await;
    assert_eq!(response.tabs_sent, Some(1));

    coordinator.handle(RelayMessage::StopHandDetection).await;
    assert!(!coordinator.handle(message()).await.success);
    assert_eq!(tabs.attempts().len(), 1);
}

#[tokio::test]
async fn test_unknown_action() {
    let coordinator = Coordinator::new(Arc::new(StaticTabs::new(vec![])), Arc::new(CountingHost::new()));
    let response = coordinator.handle(RelayMessage::ToggleCover { visible: None }).await;
    assert!(!response.success);
    assert!(response.error.unwrap().starts_with("Unknown action"));
}

fn local_host(factory: Arc<ScriptedTrackerFactory>) -> Arc<LocalInferenceHost> {
    Arc::new(LocalInferenceHost::new(
        factory,
        TrackerOptions::default(),
        Arc::new(RecordingEndpoint::new()),
    ))
}

#[tokio::test]
async fn test_initialize_during_stop_gets_a_fresh_context() {
    let factory = Arc::new(ScriptedTrackerFactory::new(vec![]));
    let host = local_host(factory.clone());
    let coordinator = Coordinator::new(Arc::new(StaticTabs::new(vec![])), host.clone());
    assert!(coordinator.handle(RelayMessage::InitializeHandDetection).await.success);

    let (stopped, initialized) = tokio::join!(
        coordinator.handle(RelayMessage::StopHandDetection),
        coordinator.handle(RelayMessage::InitializeHandDetection)
    );
    assert!(stopped.success);
    assert!(initialized.success);
    assert!(coordinator.has_inference().await);
    assert!(host.is_running().await);
    assert_eq!(host.created(), 2);

    let frame = coordinator
        .handle(RelayMessage::ProcessFrame {
            image_data: "data:image/jpeg;base64,AAAA".to_string(),
        })
        .await;
    assert!(frame.success, "frame failed: {:?}", frame.error);
    assert!(coordinator.handle(RelayMessage::InitializeHandDetection).await.success);
    assert_eq!(host.created(), 2);

    host.close().await;
}

/// First context handed out is already dead; later ones are live.
struct DeadFirstHost {
    endpoint: Arc<RecordingEndpoint>,
    created: AtomicUsize,
    closed: AtomicUsize,
}

#[async_trait]
impl InferenceHost for DeadFirstHost {
    async fn create(&self) -> Result<Arc<dyn RelayEndpoint>, RelayError> {
        if self.created.fetch_add(1, Ordering::SeqCst) == 0 {
            let (dead, rx) = mailbox("inference", 1);
            drop(rx);
            return Ok(Arc::new(dead));
        }
        Ok(self.endpoint.clone())
    }

    async fn close(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn test_closed_inference_context_is_recreated() {
    let host = Arc::new(DeadFirstHost {
        endpoint: Arc::new(RecordingEndpoint::new()),
        created: AtomicUsize::new(0),
        closed: AtomicUsize::new(0),
    });
    let coordinator = Coordinator::new(Arc::new(StaticTabs::new(vec![])), host.clone());

    let first = coordinator.handle(RelayMessage::InitializeHandDetection).await;
    assert!(!first.success);
    assert!(first.error.unwrap().contains("Transport failure"));

    assert!(coordinator.handle(RelayMessage::InitializeHandDetection).await.success);
    assert_eq!(host.created.load(Ordering::SeqCst), 2);
    assert_eq!(host.closed.load(Ordering::SeqCst), 1);
    assert_eq!(host.endpoint.count("initializeHandDetection"), 1);
}
