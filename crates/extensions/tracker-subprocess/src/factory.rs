//! Tracker and factory.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use gesturecall_protocols::{
    FrameData, HandObservation, HandTracker, HandTrackerFactory, TrackerError, TrackerOptions,
};

use crate::transport::StdioTransport;
use crate::wire::TrackerRequest;

/// How to launch the tracker process.
#[derive(Debug, Clone)]
pub struct TrackerCommand {
    pub program: String,
    pub args: Vec<String>,
    pub request_timeout: Duration,
}

impl TrackerCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            request_timeout: Duration::from_secs(5),
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

pub struct SubprocessTracker {
    transport: StdioTransport,
    initialized: AtomicBool,
}

#[async_trait]
impl HandTracker for SubprocessTracker {
    fn name(&self) -> &str {
        "subprocess"
    }

    async fn initialize(&self, options: &TrackerOptions) -> Result<(), TrackerError> {
        self.transport
            .send(&TrackerRequest::Configure(*options))
            .await?
            .into_ack()?;
        self.initialized.store(true, Ordering::SeqCst);
        info!(?options, "Subprocess tracker configured");
        Ok(())
    }

    async fn detect(&self, frame: &FrameData) -> Result<Vec<HandObservation>, TrackerError> {
        if !self.initialized.load(Ordering::SeqCst) {
            return Err(TrackerError::NotInitialized);
        }
        let hands = self
            .transport
            .send(&TrackerRequest::Image(frame.data_url.clone()))
            .await?
            .into_hands()?;
        debug!(hands = hands.len(), "Frame processed");
        Ok(hands)
    }

    async fn close(&self) -> Result<(), TrackerError> {
        self.initialized.store(false, Ordering::SeqCst);
        self.transport.close().await
    }
}

/// Launches a fresh tracker process per inference session.
pub struct SubprocessTrackerFactory {
    command: TrackerCommand,
}

impl SubprocessTrackerFactory {
    pub fn new(command: TrackerCommand) -> Self {
        Self { command }
    }
}

#[async_trait]
impl HandTrackerFactory for SubprocessTrackerFactory {
    async fn create(&self) -> Result<Box<dyn HandTracker>, TrackerError> {
        let transport = StdioTransport::spawn(
            &self.command.program,
            &self.command.args,
            self.command.request_timeout,
        )?;
        Ok(Box::new(SubprocessTracker {
            transport,
            initialized: AtomicBool::new(false),
        }))
    }
}

#[cfg(all(test, unix))]
#[path = "factory_tests.rs"]
mod tests;
