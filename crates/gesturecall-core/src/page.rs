//! Page context.
//!
//! One per tab. Owns the detection loop, draws results, and runs the
//! dispatcher for every recognized gesture.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use gesturecall_protocols::{
    DetectionResult, ExtensionSettings, Gesture, Handedness, NavigationObserver, OverlayRenderer,
    OverlaySpec, PageSurface, RelayError, RelayMessage, RelayResponse, SettingsStore, TabId,
};

use crate::classifier;
use crate::detection::DetectionLoop;
use crate::dispatcher::{ActionDispatcher, DispatchOutcome, UrlPolicy, is_url_allowed};
use crate::relay::MessageHandler;

/// Status text for one recognized gesture.
pub fn status_text(handedness: Handedness, gesture: Gesture) -> String {
    format!("{}: {}", handedness.display_name(), gesture.label())
}

pub struct PageContext {
    tab_id: TabId,
    page: Arc<dyn PageSurface>,
    overlay: Arc<dyn OverlayRenderer>,
    store: Arc<dyn SettingsStore>,
    detection: DetectionLoop,
    dispatcher: ActionDispatcher,
    cover_visible: AtomicBool,
}

impl PageContext {
    pub fn new(
        tab_id: impl Into<TabId>,
        page: Arc<dyn PageSurface>,
        overlay: Arc<dyn OverlayRenderer>,
        store: Arc<dyn SettingsStore>,
        detection: DetectionLoop,
    ) -> Self {
        let tab_id = tab_id.into();
        let dispatcher = ActionDispatcher::new(page.clone(), store.clone()).with_tab(tab_id.clone());
        Self {
            tab_id,
            page,
            overlay,
            store,
            detection,
            dispatcher,
            cover_visible: AtomicBool::new(true),
        }
    }

    pub fn with_policy(mut self, policy: UrlPolicy) -> Self {
        self.dispatcher = self.dispatcher.with_policy(policy);
        self
    }

    pub fn tab_id(&self) -> &TabId {
        &self.tab_id
    }

    pub fn is_camera_active(&self) -> bool {
        self.detection.is_active()
    }

    pub fn cover_visible(&self) -> bool {
        self.cover_visible.load(Ordering::SeqCst)
    }

    async fn load_settings(&self) -> ExtensionSettings {
        match self.store.load().await {
            Ok(settings) => settings,
            Err(e) => {
                warn!(tab = %self.tab_id, "Failed to load settings: {}", e);
                ExtensionSettings::default()
            }
        }
    }

    pub async fn start_camera(&self) -> RelayResponse {
        let settings = self.load_settings().await;
        self.cover_visible.store(settings.cover_visible(), Ordering::SeqCst);

        match self.detection.start_camera(settings.cover_visible()).await {
            Ok(_) => RelayResponse::ok(),
            Err(e) => {
                error!(tab = %self.tab_id, "Failed to start camera: {}", e);
                RelayResponse::failure(e)
            }
        }
    }

    pub async fn stop_camera(&self) -> RelayResponse {
        self.detection.stop_camera().await;
        RelayResponse::ok()
    }

    /// Show, hide or toggle the privacy cover. Returns the new state.
    pub async fn toggle_cover(&self, visible: Option<bool>) -> bool {
        let next = visible.unwrap_or(!self.cover_visible());
        self.cover_visible.store(next, Ordering::SeqCst);
        if self.detection.is_active() {
            if let Err(e) = self.overlay.set_cover_visible(next).await {
                warn!("Failed to update cover: {}", e);
            }
        }
        debug!(visible = next, "Cover toggled");
        next
    }

    /// Draw, classify and act on one result set.
    pub async fn handle_results(&self, results: &DetectionResult) -> Vec<DispatchOutcome> {
        if !self.detection.is_active() {
            debug!(tab = %self.tab_id, "Camera inactive, ignoring results");
            return Vec::new();
        }

        if let Err(e) = self.overlay.clear().await {
            warn!("Failed to clear overlay: {}", e);
        }

        if results.is_empty() {
            if let Err(e) = self.overlay.set_status(OverlaySpec::DETECTING, false).await {
                warn!("Failed to update status: {}", e);
            }
            return Vec::new();
        }

        let mut outcomes = Vec::new();
        for hand in &results.hands {
            if let Err(e) = self.overlay.draw_hand(hand).await {
                warn!("Drawing landmarks failed: {}", e);
            }

            let Some(gesture) = classifier::classify(hand) else {
                continue;
            };
            info!(tab = %self.tab_id, hand = ?hand.handedness, gesture = %gesture, "Gesture detected");

            if let Err(e) = self
                .overlay
                .set_status(&status_text(hand.handedness, gesture), true)
                .await
            {
                warn!("Failed to update status: {}", e);
            }

            let settings = self.load_settings().await;
            let current_url = match self.page.current_url().await {
                Ok(url) => url,
                Err(e) => {
                    warn!("Failed to read page URL: {}", e);
                    continue;
                }
            };

            match self
                .dispatcher
                .dispatch(gesture, &current_url, &settings, self.detection.is_active())
                .await
            {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => warn!(gesture = %gesture, "Gesture action failed: {}", e),
            }
        }
        outcomes
    }

    /// Start the camera when `url` is on the target domain.
    ///
    /// Runs on page load and on every navigation event.
    pub async fn auto_start(&self, url: &str) {
        let settings = self.load_settings().await;
        self.cover_visible.store(settings.cover_visible(), Ordering::SeqCst);

        let Some(target) = settings.target_url() else {
            debug!("No target URL configured, skipping auto start");
            return;
        };
        if !is_url_allowed(url, Some(target)) {
            debug!(url, target, "Not on target domain, not auto-starting camera");
            return;
        }

        if !self.detection.is_active() {
            info!(tab = %self.tab_id, url, "Auto-starting camera for target domain");
            if let Err(e) = self.detection.start_camera(settings.cover_visible()).await {
                error!("Auto start failed: {}", e);
                return;
            }
        }

        if !settings.camera_active_for(&self.tab_id) {
            if let Err(e) = self.store.set_camera_active_for_tab(&self.tab_id, true).await {
                warn!("Failed to record camera state: {}", e);
            }
        }
    }

    /// Follow navigation events for the lifetime of the observer.
    pub fn watch_navigation(self: &Arc<Self>, observer: &dyn NavigationObserver) -> JoinHandle<()> {
        let mut events = observer.subscribe();
        let page = self.clone();
        tokio::spawn(async move {
            let mut last: Option<String> = None;
            loop {
                match events.recv().await {
                    Ok(event) => {
                        if last.as_deref() == Some(event.url.as_str()) {
                            continue;
                        }
                        debug!(url = %event.url, "URL change detected");
                        last = Some(event.url.clone());
                        page.auto_start(&event.url).await;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "Navigation events lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    /// Tear down on tab close.
    pub async fn close(&self) {
        self.detection.stop_camera().await;
        if let Err(e) = self.store.forget_tab(&self.tab_id).await {
            warn!(tab = %self.tab_id, "Failed to forget tab: {}", e);
        }
    }
}

#[async_trait]
impl MessageHandler for PageContext {
    async fn handle(&self, message: RelayMessage) -> RelayResponse {
        match message {
            RelayMessage::StartCamera => self.start_camera().await,
            RelayMessage::StopCamera => self.stop_camera().await,
            RelayMessage::ToggleCover { visible } => {
                let visible = self.toggle_cover(visible).await;
                RelayResponse::ok_with(serde_json::json!({ "coverVisible": visible }))
            }
            RelayMessage::HandDetectionResults { results } => {
                self.handle_results(&results).await;
                RelayResponse::ok()
            }
            other => RelayResponse::failure(RelayError::UnknownAction(other.action().to_string())),
        }
    }
}

#[cfg(test)]
#[path = "page_tests.rs"]
mod tests;
