//! End-to-end runs over the relay: page context, coordinator, inference
//! context and dispatcher wired the way the binary wires them.

use std::sync::Arc;
use std::time::Duration;

use gesturecall_core::relay::{self, ContextHandle, Mailbox, bus::DEFAULT_MAILBOX_CAPACITY};
use gesturecall_core::testing::{
    RecordingEndpoint, RecordingPage, ScriptedTrackerFactory, StaticVideoSource, index_pointing, open_palm,
    thumb_up,
};
use gesturecall_core::{
    Coordinator, DetectionConfig, DetectionLoop, LocalInferenceHost, MemorySettingsStore, PageContext,
    TabRegistry,
};
use gesturecall_protocols::{
    ExtensionSettings, Handedness, InferenceHost, OverlaySpec, RelayEndpoint, RelayMessage, SettingsStore,
    TrackerOptions,
};

struct Pipeline {
    tabs: Arc<TabRegistry>,
    coordinator: Mailbox,
    coordinator_handle: ContextHandle,
    host: Arc<LocalInferenceHost>,
    factory: Arc<ScriptedTrackerFactory>,
    source: Arc<StaticVideoSource>,
    store: Arc<MemorySettingsStore>,
}

impl Pipeline {
    fn new(factory: ScriptedTrackerFactory, settings: ExtensionSettings) -> Self {
        let factory = Arc::new(factory);
        let tabs = Arc::new(TabRegistry::new());
        let (coordinator, rx) = relay::mailbox("coordinator", DEFAULT_MAILBOX_CAPACITY);
        let host = Arc::new(LocalInferenceHost::new(
            factory.clone(),
            TrackerOptions::default(),
            Arc::new(coordinator.clone()),
        ));
        let handler = Arc::new(Coordinator::new(tabs.clone(), host.clone()));
        let coordinator_handle = relay::serve(coordinator.clone(), rx, handler);
        Self {
            tabs,
            coordinator,
            coordinator_handle,
            host,
            factory,
            source: Arc::new(StaticVideoSource::new()),
            store: Arc::new(MemorySettingsStore::with_settings(&settings).unwrap()),
        }
    }

    fn open_tab(&self, id: &str, page: RecordingPage) -> (Arc<RecordingPage>, Arc<PageContext>, ContextHandle) {
        let page = Arc::new(page);
        let detection = DetectionLoop::new(
            DetectionConfig {
                interval: Duration::from_millis(100),
                ..Default::default()
            },
            self.source.clone(),
            page.clone(),
            Arc::new(self.coordinator.clone()),
        );
        let context = Arc::new(PageContext::new(id, page.clone(), page.clone(), self.store.clone(), detection));
        let handle = relay::spawn_context(&format!("page-{}", id), DEFAULT_MAILBOX_CAPACITY, context.clone());
        self.tabs
            .register(id, Some(page.url()), Some(Arc::new(handle.mailbox())));
        (page, context, handle)
    }

    async fn shutdown(self) {
        self.coordinator_handle.shutdown().await;
        self.host.close().await;
    }
}

fn settings() -> ExtensionSettings {
    ExtensionSettings {
        target_url: Some("https://chatgpt.com/".into()),
        click_selector: Some("#send".into()),
        stop_selector: Some("#stop".into()),
        ..Default::default()
    }
}

/// Poll until `check` holds, advancing paused time between attempts.
async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}

#[tokio::test(start_paused = true)]
async fn test_open_palm_on_target_clicks_and_records_camera_state() {
    let pipeline = Pipeline::new(ScriptedTrackerFactory::new(vec![open_palm(Handedness::Right)]), settings());
    let (page, context, handle) = pipeline.open_tab(
        "1",
        RecordingPage::new("https://chatgpt.com/c/abc").with_elements(&["#send", "#stop"]),
    );

    context.auto_start(&page.url()).await;
    assert!(context.is_camera_active());
    assert!(page.overlay_visible());

    assert!(eventually(|| page.clicks().contains(&"#send".to_string())).await);
    assert!(page.statuses().iter().any(|s| s == "Right hand: Hand raised"));
    assert!(page.navigations().is_empty());
    assert!(pipeline.store.load().await.unwrap().camera_active_for("1"));
    assert_eq!(pipeline.factory.created(), 1);

    handle.shutdown().await;
    pipeline.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_open_palm_elsewhere_navigates_to_target() {
    let pipeline = Pipeline::new(ScriptedTrackerFactory::new(vec![open_palm(Handedness::Left)]), settings());
    let (page, context, handle) = pipeline.open_tab("2", RecordingPage::new("https://example.com/docs"));
    let watcher = context.watch_navigation(page.as_ref());

    // Not the target domain: no auto start, so start through the relay.
    context.auto_start(&page.url()).await;
    assert!(!context.is_camera_active());
    let response = handle.mailbox().request(RelayMessage::StartCamera).await.unwrap();
    assert!(response.success);

    assert!(eventually(|| !page.navigations().is_empty()).await);
    assert_eq!(page.navigations()[0], "https://chatgpt.com/");
    assert_eq!(page.url(), "https://chatgpt.com/");
    assert!(page.clicks().is_empty());
    assert!(pipeline.store.load().await.unwrap().camera_active_for("2"));

    watcher.abort();
    handle.shutdown().await;
    pipeline.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_thumb_and_index_click_their_selectors() {
    let factory = ScriptedTrackerFactory::new(vec![thumb_up(Handedness::Right)]);
    let pipeline = Pipeline::new(factory, settings());
    let (page, context, handle) = pipeline.open_tab(
        "3",
        RecordingPage::new("https://chatgpt.com/").with_elements(&["#send", "#stop"]),
    );

    assert!(context.start_camera().await.success);
    assert!(eventually(|| page.clicks().contains(&"#stop".to_string())).await);

    pipeline.factory.set_hands(vec![index_pointing(Handedness::Left)]);
    assert!(eventually(|| page.clicks().contains(&"#send".to_string())).await);
    assert!(page.statuses().iter().any(|s| s == "Left hand: Index finger raised"));

    handle.shutdown().await;
    pipeline.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_stop_camera_closes_tracker_and_releases_stream() {
    let pipeline = Pipeline::new(ScriptedTrackerFactory::new(vec![]), settings());
    let (page, context, handle) = pipeline.open_tab("4", RecordingPage::new("https://chatgpt.com/"));

    assert!(context.start_camera().await.success);
    assert!(eventually(|| pipeline.factory.detections() >= 2).await);
    assert!(page.statuses().iter().any(|s| s == OverlaySpec::DETECTING));

    let response = handle.mailbox().request(RelayMessage::StopCamera).await.unwrap();
    assert!(response.success);
    assert!(!context.is_camera_active());
    assert!(!page.overlay_visible());
    assert_eq!(pipeline.source.released(), 1);
    assert!(eventually(|| pipeline.factory.closed() == 1).await);

    // No further frames once stopped.
    let detections = pipeline.factory.detections();
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(pipeline.factory.detections(), detections);

    handle.shutdown().await;
    pipeline.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_restricted_tabs_never_receive_results() {
    let pipeline = Pipeline::new(ScriptedTrackerFactory::new(vec![thumb_up(Handedness::Right)]), settings());
    let (page, context, handle) = pipeline.open_tab(
        "5",
        RecordingPage::new("https://chatgpt.com/").with_elements(&["#stop"]),
    );
    let settings_page = Arc::new(RecordingEndpoint::new());
    pipeline
        .tabs
        .register("6", Some("chrome://settings".to_string()), Some(settings_page.clone()));

    assert!(context.start_camera().await.success);
    assert!(eventually(|| !page.clicks().is_empty()).await);
    assert_eq!(settings_page.count("handDetectionResults"), 0);

    handle.shutdown().await;
    pipeline.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_two_tabs_share_one_inference_context() {
    let pipeline = Pipeline::new(ScriptedTrackerFactory::new(vec![]), settings());
    let (_, first, first_handle) = pipeline.open_tab("7", RecordingPage::new("https://chatgpt.com/"));
    let (_, second, second_handle) = pipeline.open_tab("8", RecordingPage::new("https://chatgpt.com/c/2"));

    assert!(first.start_camera().await.success);
    assert!(second.start_camera().await.success);
    assert_eq!(pipeline.host.created(), 1);
    assert_eq!(pipeline.factory.created(), 1);

    first_handle.shutdown().await;
    second_handle.shutdown().await;
    pipeline.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_stop_in_one_tab_leaves_other_tab_detecting() {
    let pipeline = Pipeline::new(ScriptedTrackerFactory::new(vec![]), settings());
    let (_, first, first_handle) = pipeline.open_tab("9", RecordingPage::new("https://chatgpt.com/"));
    let (_, second, second_handle) = pipeline.open_tab("10", RecordingPage::new("https://chatgpt.com/c/3"));

    assert!(first.start_camera().await.success);
    assert!(second.start_camera().await.success);
    assert!(eventually(|| pipeline.factory.detections() >= 2).await);

    let response = first_handle.mailbox().request(RelayMessage::StopCamera).await.unwrap();
    assert!(response.success);
    assert!(eventually(|| pipeline.factory.closed() == 1).await);

    // The still active tab brings inference back on its next frame.
    assert!(eventually(|| pipeline.factory.created() == 2).await);
    let detections = pipeline.factory.detections();
    assert!(eventually(|| pipeline.factory.detections() > detections).await);
    assert!(second.is_camera_active());
    assert!(!first.is_camera_active());

    first_handle.shutdown().await;
    second_handle.shutdown().await;
    pipeline.shutdown().await;
}
