//! Null hand tracker.
//!
//! Detects nothing. Selected when no landmark model is configured so the rest
//! of the pipeline can run end to end.

use async_trait::async_trait;
use tracing::debug;

use gesturecall_protocols::{FrameData, HandObservation, HandTracker, HandTrackerFactory, TrackerError, TrackerOptions};

#[derive(Debug, Default)]
pub struct NullHandTracker;

#[async_trait]
impl HandTracker for NullHandTracker {
    fn name(&self) -> &str {
        "null"
    }

    async fn initialize(&self, options: &TrackerOptions) -> Result<(), TrackerError> {
        debug!(?options, "Null tracker initialized");
        Ok(())
    }

    async fn detect(&self, _frame: &FrameData) -> Result<Vec<HandObservation>, TrackerError> {
        Ok(Vec::new())
    }

    async fn close(&self) -> Result<(), TrackerError> {
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct NullTrackerFactory;

#[async_trait]
impl HandTrackerFactory for NullTrackerFactory {
    async fn create(&self) -> Result<Box<dyn HandTracker>, TrackerError> {
        Ok(Box::new(NullHandTracker))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_null_tracker_detects_nothing() {
        let tracker = NullTrackerFactory.create().await.unwrap();
        tracker.initialize(&TrackerOptions::default()).await.unwrap();
        let hands = tracker.detect(&FrameData::new("data:image/jpeg;base64,", 1, 1)).await.unwrap();
        assert!(hands.is_empty());
        assert_eq!(tracker.name(), "null");
        tracker.close().await.unwrap();
    }
}
