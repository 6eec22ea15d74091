//! Coordinator context.
//!
//! The hub between pages and the inference context. It owns the single
//! inference slot and fans results out to every eligible tab.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use futures::future::join_all;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use gesturecall_protocols::{
    DetectionResult, InferenceHost, RelayEndpoint, RelayError, RelayMessage, RelayResponse,
    TabInfo, TabMessenger,
};

use super::bus::MessageHandler;

/// Outcome of one results broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Tabs known to the messenger.
    pub known: usize,
    /// Eligible tabs, each of which got one delivery attempt.
    pub attempted: usize,
    pub delivered: usize,
}

/// Session object replacing process-wide hub state.
pub struct Coordinator {
    tabs: Arc<dyn TabMessenger>,
    host: Arc<dyn InferenceHost>,
    inference: RwLock<Option<Arc<dyn RelayEndpoint>>>,
    contexts_created: AtomicU64,
}

impl Coordinator {
    pub fn new(tabs: Arc<dyn TabMessenger>, host: Arc<dyn InferenceHost>) -> Self {
        Self {
            tabs,
            host,
            inference: RwLock::new(None),
            contexts_created: AtomicU64::new(0),
        }
    }

    /// Whether an inference context currently exists.
    pub async fn has_inference(&self) -> bool {
        self.inference.read().await.is_some()
    }

    /// Number of inference contexts created so far.
    pub fn contexts_created(&self) -> u64 {
        self.contexts_created.load(Ordering::Relaxed)
    }

    /// Get the inference context, creating it on first use.
    ///
    /// A slot whose context has gone away counts as empty.
    async fn ensure_inference(&self) -> Result<Arc<dyn RelayEndpoint>, RelayError> {
        {
            let slot = self.inference.read().await;
            if let Some(endpoint) = slot.as_ref().filter(|e| !e.is_closed()) {
                return Ok(endpoint.clone());
            }
        }

        let mut slot = self.inference.write().await;
        // Double-check after acquiring the write lock.
        if let Some(endpoint) = slot.as_ref() {
            if !endpoint.is_closed() {
                return Ok(endpoint.clone());
            }
            warn!("Inference context went away, recreating");
            slot.take();
            self.host.close().await;
        }

        let endpoint = self.host.create().await?;
        self.contexts_created.fetch_add(1, Ordering::Relaxed);
        info!("Inference context created");
        *slot = Some(endpoint.clone());
        Ok(endpoint)
    }

    async fn current_inference(&self) -> Option<Arc<dyn RelayEndpoint>> {
        self.inference.read().await.clone()
    }

    async fn initialize(&self) -> RelayResponse {
        let endpoint = match self.ensure_inference().await {
            Ok(endpoint) => endpoint,
            Err(e) => {
                error!("Failed to create inference context: {}", e);
                return RelayResponse::failure(e);
            }
        };

        match endpoint.request(RelayMessage::InitializeHandDetection).await {
            Ok(response) => {
                if !response.success {
                    warn!(error = ?response.error, "Hand detection failed to initialize");
                }
                response
            }
            Err(e) => {
                error!("Failed to initialize hand detection: {}", e);
                RelayResponse::failure(e)
            }
        }
    }

    async fn process_frame(&self, message: RelayMessage) -> RelayResponse {
        let Some(endpoint) = self.current_inference().await else {
            debug!("Frame arrived without an inference context");
            return RelayResponse::failure(RelayError::NotInitialized);
        };

        match endpoint.request(message).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Failed to process frame: {}", e);
                RelayResponse::failure(e)
            }
        }
    }

    async fn stop(&self) -> RelayResponse {
        // The write guard is held until the host is closed, so a concurrent
        // initialize waits and then builds a fresh context.
        let mut slot = self.inference.write().await;
        let Some(endpoint) = slot.take() else {
            debug!("Stop without an inference context");
            return RelayResponse::ok();
        };

        let response = match endpoint.request(RelayMessage::StopHandDetection).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Failed to stop hand detection: {}", e);
                RelayResponse::failure(e)
            }
        };

        self.host.close().await;
        drop(slot);
        info!("Inference context closed");
        response
    }

    /// Deliver results to every eligible tab.
    pub async fn broadcast(&self, results: DetectionResult) -> (BroadcastReport, RelayResponse) {
        let tabs = self.tabs.query_tabs().await;
        let known = tabs.len();
        let eligible: Vec<TabInfo> = tabs.into_iter().filter(TabInfo::is_eligible).collect();

        if eligible.is_empty() {
            warn!(known, "No valid tabs found to forward results");
            let report = BroadcastReport {
                known,
                ..Default::default()
            };
            return (report, RelayResponse::failure(RelayError::NoEligibleRecipients));
        }

        let sends = eligible.iter().map(|tab| {
            let message = RelayMessage::HandDetectionResults {
                results: results.clone(),
            };
            async move {
                let outcome = self.tabs.send_to_tab(&tab.id, message).await;
                if let Err(e) = &outcome {
                    debug!(tab = %tab.id, "Result delivery failed: {}", e);
                }
                outcome.is_ok()
            }
        });
        let delivered = join_all(sends).await.into_iter().filter(|ok| *ok).count();

        let report = BroadcastReport {
            known,
            attempted: eligible.len(),
            delivered,
        };
        debug!(
            hands = results.hands.len(),
            attempted = report.attempted,
            delivered, "Hand detection results forwarded"
        );
        (report, RelayResponse::broadcast(delivered))
    }

    async fn forward_results(&self, results: DetectionResult) -> RelayResponse {
        // Results that outlive their session are not forwarded.
        if !self.has_inference().await {
            debug!("Dropping results received after stop");
            return RelayResponse::failure(RelayError::NotInitialized);
        }
        self.broadcast(results).await.1
    }
}

#[async_trait]
impl MessageHandler for Coordinator {
    async fn handle(&self, message: RelayMessage) -> RelayResponse {
        debug!(action = message.action(), "Coordinator received message");
        match message {
            RelayMessage::InitializeHandDetection => self.initialize().await,
            message @ RelayMessage::ProcessFrame { .. } => self.process_frame(message).await,
            RelayMessage::StopHandDetection => self.stop().await,
            RelayMessage::HandDetectionResults { results } => self.forward_results(results).await,
            other => {
                warn!(action = other.action(), "Unknown action in coordinator");
                RelayResponse::failure(RelayError::UnknownAction(other.action().to_string()))
            }
        }
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
