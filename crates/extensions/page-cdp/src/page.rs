//! A browser tab as a gesture page.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use gesturecall_protocols::{
    HandObservation, NavigationEvent, NavigationObserver, OverlayRenderer, OverlaySpec, PageError,
    PageSurface,
};

use crate::overlay;
use crate::protocol::CdpResponse;
use crate::session::{CdpSession, PageEvent};

/// Overlay as last requested, replayed after a full page load.
#[derive(Default)]
struct OverlayState {
    spec: Option<OverlaySpec>,
}

struct Inner {
    session: CdpSession,
    navigation: broadcast::Sender<NavigationEvent>,
    overlay: Mutex<OverlayState>,
    main_frame: Mutex<Option<String>>,
    detached: AtomicBool,
}

impl Inner {
    async fn run_script(&self, script: &str) -> Result<Value, PageError> {
        if self.detached.load(Ordering::SeqCst) {
            return Err(PageError::Disconnected);
        }
        Ok(self.session.evaluate(script).await?)
    }

    /// Draw-type scripts report whether the overlay was there.
    async fn overlay_script(&self, script: &str) -> Result<(), PageError> {
        if self.run_script(script).await? != Value::Bool(true) {
            debug!(target = self.session.target_id(), "Overlay not present");
        }
        Ok(())
    }

    fn publish(&self, url: String) {
        debug!(target = self.session.target_id(), url = %url, "Tab URL changed");
        let _ = self.navigation.send(NavigationEvent::new(url));
    }

    async fn on_event(&self, event: PageEvent) {
        match event {
            PageEvent::FrameNavigated {
                frame_id,
                main_frame: true,
                url,
            } => {
                *self.main_frame.lock() = Some(frame_id);
                self.publish(url);
            }
            PageEvent::FrameNavigated { .. } => {}
            PageEvent::NavigatedWithinDocument { frame_id, url } => {
                let is_main = self
                    .main_frame
                    .lock()
                    .as_deref()
                    .is_none_or(|main| main == frame_id);
                if is_main {
                    self.publish(url);
                }
            }
            PageEvent::DomContentLoaded => {
                let spec = self.overlay.lock().spec.clone();
                if let Some(spec) = spec {
                    debug!(target = self.session.target_id(), "Restoring overlay after page load");
                    if let Err(e) = self.overlay_script(&overlay::create_script(&spec)).await {
                        warn!("Failed to restore overlay: {}", e);
                    }
                }
            }
            PageEvent::Detached => {
                info!(target = self.session.target_id(), "Tab detached");
                self.detached.store(true, Ordering::SeqCst);
            }
        }
    }
}

/// Page surface, overlay and navigation observer for one attached tab.
pub struct CdpPage {
    inner: Arc<Inner>,
    event_task: JoinHandle<()>,
}

impl CdpPage {
    pub(crate) fn new(session: CdpSession, mut events: mpsc::UnboundedReceiver<CdpResponse>) -> Self {
        let (navigation, _) = broadcast::channel(32);
        let inner = Arc::new(Inner {
            session,
            navigation,
            overlay: Mutex::new(OverlayState::default()),
            main_frame: Mutex::new(None),
            detached: AtomicBool::new(false),
        });

        let event_task = {
            let inner = inner.clone();
            tokio::spawn(async move {
                match inner.session.main_frame_id().await {
                    Ok(id) => *inner.main_frame.lock() = Some(id),
                    Err(e) => debug!("Main frame lookup failed: {}", e),
                }
                while let Some(raw) = events.recv().await {
                    if let Some(event) = PageEvent::parse(&raw) {
                        let detached = event == PageEvent::Detached;
                        inner.on_event(event).await;
                        if detached {
                            break;
                        }
                    }
                }
                debug!(target = inner.session.target_id(), "Tab event pump stopped");
            })
        };

        Self { inner, event_task }
    }

    pub fn session(&self) -> &CdpSession {
        &self.inner.session
    }

    pub fn target_id(&self) -> &str {
        self.inner.session.target_id()
    }

    pub fn is_detached(&self) -> bool {
        self.inner.detached.load(Ordering::SeqCst) || self.event_task.is_finished()
    }
}

impl Drop for CdpPage {
    fn drop(&mut self) {
        self.event_task.abort();
    }
}

#[async_trait]
impl PageSurface for CdpPage {
    async fn current_url(&self) -> Result<String, PageError> {
        match self.inner.run_script(overlay::CURRENT_URL_SCRIPT).await? {
            Value::String(url) => Ok(url),
            other => Err(PageError::Script(format!("unexpected location value {}", other))),
        }
    }

    async fn click_first(&self, selector: &str) -> Result<bool, PageError> {
        match self.inner.run_script(&overlay::click_script(selector)).await? {
            Value::String(s) if s == "clicked" => Ok(true),
            Value::String(s) if s == "missing" => Ok(false),
            Value::String(s) if s == "invalid" => Err(PageError::InvalidSelector(selector.to_string())),
            other => Err(PageError::Script(format!("unexpected click result {}", other))),
        }
    }

    async fn navigate(&self, url: &str) -> Result<(), PageError> {
        if self.inner.detached.load(Ordering::SeqCst) {
            return Err(PageError::Disconnected);
        }
        Ok(self.inner.session.navigate(url).await?)
    }
}

#[async_trait]
impl OverlayRenderer for CdpPage {
    async fn create_overlay(&self, spec: &OverlaySpec) -> Result<(), PageError> {
        self.inner.overlay.lock().spec = Some(spec.clone());
        self.inner.overlay_script(&overlay::create_script(spec)).await
    }

    async fn remove_overlay(&self) -> Result<(), PageError> {
        self.inner.overlay.lock().spec = None;
        self.inner.run_script(&overlay::remove_script()).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), PageError> {
        self.inner.overlay_script(&overlay::clear_script()).await
    }

    async fn draw_hand(&self, hand: &HandObservation) -> Result<(), PageError> {
        self.inner.overlay_script(&overlay::draw_hand_script(hand)).await
    }

    async fn set_status(&self, text: &str, highlight: bool) -> Result<(), PageError> {
        self.inner
            .overlay_script(&overlay::status_script(text, highlight))
            .await
    }

    async fn set_cover_visible(&self, visible: bool) -> Result<(), PageError> {
        if let Some(spec) = self.inner.overlay.lock().spec.as_mut() {
            spec.cover_visible = visible;
        }
        self.inner.overlay_script(&overlay::cover_script(visible)).await
    }
}

impl NavigationObserver for CdpPage {
    fn subscribe(&self) -> broadcast::Receiver<NavigationEvent> {
        self.inner.navigation.subscribe()
    }
}
