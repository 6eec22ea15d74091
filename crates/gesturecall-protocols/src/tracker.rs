//! Hand tracker protocol definitions.
//!
//! The tracker is the external landmark model. This crate only fixes the
//! contract: frames in, hand observations out.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::capture::FrameData;
use crate::error::TrackerError;
use crate::landmark::HandObservation;

/// Inference options handed to the tracker on initialization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerOptions {
    pub max_num_hands: u32,
    pub model_complexity: u32,
    pub min_detection_confidence: f32,
    pub min_tracking_confidence: f32,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            max_num_hands: 2,
            model_complexity: 1,
            min_detection_confidence: 0.5,
            min_tracking_confidence: 0.3,
        }
    }
}

/// External hand-pose estimator.
#[async_trait]
pub trait HandTracker: Send + Sync {
    fn name(&self) -> &str;

    /// Load model assets. Called once before the first `detect`.
    async fn initialize(&self, options: &TrackerOptions) -> Result<(), TrackerError>;

    /// Run inference on one frame. An empty vector means no hands.
    async fn detect(&self, frame: &FrameData) -> Result<Vec<HandObservation>, TrackerError>;

    /// Release model resources.
    async fn close(&self) -> Result<(), TrackerError>;
}

/// Produces fresh tracker instances for each inference session.
#[async_trait]
pub trait HandTrackerFactory: Send + Sync {
    async fn create(&self) -> Result<Box<dyn HandTracker>, TrackerError>;
}
