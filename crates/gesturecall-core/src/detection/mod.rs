//! Detection loop.
//!
//! Owns the camera stream of one page. While active it samples a frame every
//! interval and hands it to the relay without waiting for the answer.
//!
//! ```text
//!  start_camera: overlay -> acquire stream -> initialize -> arm timer
//!  stop_camera:  disarm timer -> stop detection -> release stream -> remove overlay
//! ```
//!
//! The inference context is shared by every page. When another page stopped
//! it, frames come back `NotInitialized` and an active loop initializes it
//! again, at most once per [`REINIT_BACKOFF`].

mod timer;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use gesturecall_protocols::{
    CaptureConstraints, CaptureError, OverlayRenderer, OverlaySpec, RelayEndpoint, RelayError, RelayMessage,
    VideoSource, VideoStream,
};

pub use timer::FrameTimer;

/// Default sampling interval.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);

/// Minimum spacing between re-initialization attempts from frame ticks.
pub const REINIT_BACKOFF: Duration = Duration::from_secs(2);

/// Detection loop settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectionConfig {
    pub interval: Duration,
    pub constraints: CaptureConstraints,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            constraints: CaptureConstraints::new(180, 120),
        }
    }
}

struct ActiveState {
    stream: Arc<Mutex<Box<dyn VideoStream>>>,
    timer: FrameTimer,
}

/// State the frame ticks read after the loop handed them off.
#[derive(Default)]
struct Liveness {
    active: AtomicBool,
    last_reinit: parking_lot::Mutex<Option<Instant>>,
}

impl Liveness {
    /// Claim a re-initialization slot. False while inactive or backing off.
    fn claim_reinit(&self) -> bool {
        if !self.active.load(Ordering::SeqCst) {
            return false;
        }
        let now = Instant::now();
        let mut last = self.last_reinit.lock();
        match *last {
            Some(at) if now.duration_since(at) < REINIT_BACKOFF => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }
}

/// Periodic frame sampler for one page.
pub struct DetectionLoop {
    config: DetectionConfig,
    source: Arc<dyn VideoSource>,
    overlay: Arc<dyn OverlayRenderer>,
    relay: Arc<dyn RelayEndpoint>,
    state: Mutex<Option<ActiveState>>,
    liveness: Arc<Liveness>,
}

impl DetectionLoop {
    pub fn new(
        config: DetectionConfig,
        source: Arc<dyn VideoSource>,
        overlay: Arc<dyn OverlayRenderer>,
        relay: Arc<dyn RelayEndpoint>,
    ) -> Self {
        Self {
            config,
            source,
            overlay,
            relay,
            state: Mutex::new(None),
            liveness: Arc::new(Liveness::default()),
        }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    pub fn is_active(&self) -> bool {
        self.liveness.active.load(Ordering::SeqCst)
    }

    /// Frames fired by the current timer, 0 when inactive.
    pub async fn frames_fired(&self) -> u64 {
        self.state
            .lock()
            .await
            .as_ref()
            .map(|s| s.timer.fire_count())
            .unwrap_or(0)
    }

    /// Transition to active.
    ///
    /// Returns `Ok(false)` when already active. On acquisition failure the
    /// overlay is removed and the loop stays inactive.
    pub async fn start_camera(&self, cover_visible: bool) -> Result<bool, CaptureError> {
        let mut state = self.state.lock().await;
        if state.is_some() {
            debug!("Camera already active");
            return Ok(false);
        }

        let constraints = self.config.constraints;
        let spec = OverlaySpec::new(constraints.width, constraints.height, cover_visible);
        if let Err(e) = self.overlay.create_overlay(&spec).await {
            warn!("Failed to create overlay: {}", e);
        }

        let stream = match self.source.open(constraints).await {
            Ok(stream) => stream,
            Err(e) => {
                error!(source = self.source.name(), "Failed to start camera: {}", e);
                if let Err(e) = self.overlay.remove_overlay().await {
                    warn!("Failed to remove overlay: {}", e);
                }
                return Err(e);
            }
        };
        let (width, height) = stream.resolution();
        debug!(width, height, "Camera stream acquired");

        match self.relay.request(RelayMessage::InitializeHandDetection).await {
            Ok(response) if response.success => info!("Hand detection initialized"),
            Ok(response) => warn!(error = ?response.error, "Failed to initialize hand detection"),
            Err(e) => warn!("Failed to initialize hand detection: {}", e),
        }

        let stream = Arc::new(Mutex::new(stream));
        let timer = {
            let stream = stream.clone();
            let relay = self.relay.clone();
            let liveness = self.liveness.clone();
            FrameTimer::repeating("detection", self.config.interval, move |tick| {
                tokio::spawn(capture_and_send(stream.clone(), relay.clone(), liveness.clone(), tick));
            })
        };

        *state = Some(ActiveState { stream, timer });
        *self.liveness.last_reinit.lock() = None;
        self.liveness.active.store(true, Ordering::SeqCst);
        info!(interval_ms = self.config.interval.as_millis() as u64, "Camera started");
        Ok(true)
    }

    /// Transition to inactive. Returns `false` when already inactive.
    pub async fn stop_camera(&self) -> bool {
        let mut state = self.state.lock().await;
        let Some(active) = state.take() else {
            return false;
        };
        self.liveness.active.store(false, Ordering::SeqCst);
        active.timer.cancel();

        match self.relay.request(RelayMessage::StopHandDetection).await {
            Ok(response) if !response.success => {
                warn!(error = ?response.error, "Failed to stop hand detection")
            }
            Ok(_) => {}
            Err(e) => warn!("Failed to stop hand detection: {}", e),
        }

        active.stream.lock().await.release().await;

        if let Err(e) = self.overlay.remove_overlay().await {
            warn!("Failed to remove overlay: {}", e);
        }
        info!("Camera stopped");
        true
    }
}

/// One tick: grab a frame and post it. Skips when the previous capture is
/// still holding the camera.
async fn capture_and_send(
    stream: Arc<Mutex<Box<dyn VideoStream>>>,
    relay: Arc<dyn RelayEndpoint>,
    liveness: Arc<Liveness>,
    tick: u64,
) {
    let frame = {
        let Ok(mut stream) = stream.try_lock() else {
            debug!(tick, "Previous capture still running, skipping tick");
            return;
        };
        match stream.capture().await {
            Ok(frame) => frame,
            Err(CaptureError::Released) => return,
            Err(e) => {
                warn!(tick, "Frame capture failed: {}", e);
                return;
            }
        }
    };

    debug!(tick, bytes = frame.data_url.len(), "Frame captured");
    let message = RelayMessage::ProcessFrame {
        image_data: frame.data_url,
    };
    match relay.request(message).await {
        Ok(response) if response.failed_with(&RelayError::NotInitialized) => {
            if liveness.claim_reinit() {
                reinitialize(relay.as_ref(), tick).await;
            }
        }
        Ok(response) if !response.success => {
            debug!(tick, error = ?response.error, "Frame not processed")
        }
        Ok(_) => {}
        Err(e) => warn!(tick, "Failed to send frame: {}", e),
    }
}

async fn reinitialize(relay: &dyn RelayEndpoint, tick: u64) {
    info!(tick, "Hand detection went away while active, initializing again");
    match relay.request(RelayMessage::InitializeHandDetection).await {
        Ok(response) if response.success => {}
        Ok(response) => warn!(tick, error = ?response.error, "Failed to initialize hand detection"),
        Err(e) => warn!(tick, "Failed to initialize hand detection: {}", e),
    }
}

#[cfg(test)]
#[path = "detection_tests.rs"]
mod tests;
