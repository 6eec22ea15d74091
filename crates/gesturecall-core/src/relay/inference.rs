//! Inference context.
//!
//! Hosts the hand tracker. Only the coordinator talks to it, and it only
//! talks back to the coordinator (results go to `results_sink`).

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use gesturecall_protocols::{
    DetectionResult, FrameData, HandTracker, HandTrackerFactory, InferenceHost, RelayEndpoint,
    RelayError, RelayMessage, RelayResponse, TrackerOptions,
};

use super::bus::{self, ContextHandle, MessageHandler};
use crate::classifier;

#[derive(Clone)]
struct Session {
    tracker: Arc<dyn HandTracker>,
    token: CancellationToken,
}

/// The isolated context running hand-pose inference.
pub struct InferenceContext {
    factory: Arc<dyn HandTrackerFactory>,
    options: TrackerOptions,
    results_sink: Arc<dyn RelayEndpoint>,
    session: Mutex<Option<Session>>,
    /// Parent of every session token; cancelled on shutdown.
    root: CancellationToken,
}

impl InferenceContext {
    pub fn new(
        factory: Arc<dyn HandTrackerFactory>,
        options: TrackerOptions,
        results_sink: Arc<dyn RelayEndpoint>,
    ) -> Self {
        Self {
            factory,
            options,
            results_sink,
            session: Mutex::new(None),
            root: CancellationToken::new(),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.session.lock().is_some()
    }

    async fn initialize(&self) -> RelayResponse {
        if self.is_initialized() {
            debug!("Hand detection already initialized");
            return RelayResponse::ok_with("Hand detection initialized");
        }

        info!(options = ?self.options, "Initializing hand tracker");
        let tracker: Arc<dyn HandTracker> = match self.factory.create().await {
            Ok(tracker) => Arc::from(tracker),
            Err(e) => {
                error!("Failed to create hand tracker: {}", e);
                return RelayResponse::failure(e);
            }
        };

        if let Err(e) = tracker.initialize(&self.options).await {
            error!(tracker = tracker.name(), "Failed to initialize hand tracker: {}", e);
            return RelayResponse::failure(e);
        }

        let mut session = self.session.lock();
        if session.is_some() {
            // Lost a race with a concurrent initialize; keep the first tracker.
            let tracker = tracker.clone();
            tokio::spawn(async move {
                let _ = tracker.close().await;
            });
        } else {
            *session = Some(Session {
                tracker,
                token: self.root.child_token(),
            });
        }
        info!("Hand tracker initialized");
        RelayResponse::ok_with("Hand detection initialized")
    }

    fn process_frame(&self, image_data: String) -> RelayResponse {
        let Some(session) = self.session.lock().clone() else {
            warn!("Hand detection not initialized for processing frame");
            return RelayResponse::failure(RelayError::NotInitialized);
        };

        debug!(bytes = image_data.len(), "Processing frame");
        let sink = self.results_sink.clone();
        tokio::spawn(run_frame(session, FrameData::new(image_data, 0, 0), sink));
        RelayResponse::ok_with("Frame processing started")
    }

    async fn stop(&self) -> RelayResponse {
        let session = self.session.lock().take();
        if let Some(session) = session {
            session.token.cancel();
            if let Err(e) = session.tracker.close().await {
                warn!("Failed to close hand tracker: {}", e);
            }
            info!("Hand detection stopped");
        }
        RelayResponse::ok()
    }

    /// Stop the session and cancel every frame still in flight.
    pub async fn shutdown(&self) {
        self.stop().await;
        self.root.cancel();
    }
}

async fn run_frame(session: Session, frame: FrameData, sink: Arc<dyn RelayEndpoint>) {
    let hands = tokio::select! {
        _ = session.token.cancelled() => {
            debug!("Frame cancelled by stop");
            return;
        }
        result = session.tracker.detect(&frame) => result,
    };

    let hands = match hands {
        Ok(hands) => hands,
        Err(e) => {
            warn!("Frame processing failed: {}", e);
            return;
        }
    };

    if session.token.is_cancelled() {
        debug!("Dropping results computed after stop");
        return;
    }

    for (i, hand) in hands.iter().enumerate() {
        if let Some(gesture) = classifier::classify(hand) {
            debug!(hand = i + 1, gesture = %gesture, "Gesture detected in inference context");
        }
    }

    let results = DetectionResult::new(hands, chrono::Utc::now().timestamp_millis());
    match sink.request(RelayMessage::HandDetectionResults { results }).await {
        Ok(response) => debug!(tabs_sent = ?response.tabs_sent, "Results sent"),
        Err(e) => warn!("Failed to send detection results: {}", e),
    }
}

#[async_trait]
impl MessageHandler for InferenceContext {
    async fn handle(&self, message: RelayMessage) -> RelayResponse {
        match message {
            RelayMessage::InitializeHandDetection => self.initialize().await,
            RelayMessage::ProcessFrame { image_data } => self.process_frame(image_data),
            RelayMessage::StopHandDetection => self.stop().await,
            other => RelayResponse::failure(RelayError::UnknownAction(other.action().to_string())),
        }
    }
}

struct RunningContext {
    handle: ContextHandle,
    context: Arc<InferenceContext>,
}

/// [`InferenceHost`] spawning the inference context as a local task.
pub struct LocalInferenceHost {
    factory: Arc<dyn HandTrackerFactory>,
    options: TrackerOptions,
    results_sink: Arc<dyn RelayEndpoint>,
    capacity: usize,
    running: tokio::sync::Mutex<Option<RunningContext>>,
    created: AtomicUsize,
}

impl LocalInferenceHost {
    pub fn new(
        factory: Arc<dyn HandTrackerFactory>,
        options: TrackerOptions,
        results_sink: Arc<dyn RelayEndpoint>,
    ) -> Self {
        Self {
            factory,
            options,
            results_sink,
            capacity: bus::DEFAULT_MAILBOX_CAPACITY,
            running: tokio::sync::Mutex::new(None),
            created: AtomicUsize::new(0),
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Contexts created over the host's lifetime.
    pub fn created(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }

    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }
}

#[async_trait]
impl InferenceHost for LocalInferenceHost {
    async fn create(&self) -> Result<Arc<dyn RelayEndpoint>, RelayError> {
        let mut running = self.running.lock().await;
        if let Some(existing) = running.as_ref() {
            return Ok(Arc::new(existing.handle.mailbox()));
        }

        let context = Arc::new(InferenceContext::new(
            self.factory.clone(),
            self.options,
            self.results_sink.clone(),
        ));
        let handle = bus::spawn_context("inference", self.capacity, context.clone());
        let mailbox = handle.mailbox();
        *running = Some(RunningContext { handle, context });
        self.created.fetch_add(1, Ordering::Relaxed);
        Ok(Arc::new(mailbox))
    }

    async fn close(&self) {
        let running = self.running.lock().await.take();
        if let Some(RunningContext { handle, context }) = running {
            context.shutdown().await;
            handle.shutdown().await;
        }
    }
}

#[cfg(test)]
#[path = "inference_tests.rs"]
mod tests;
