//! Video capture protocol definitions.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CaptureError;

/// Camera facing preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacingMode {
    #[default]
    User,
    Environment,
}

/// Requested stream shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureConstraints {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub facing_mode: FacingMode,
}

impl CaptureConstraints {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            facing_mode: FacingMode::User,
        }
    }
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self::new(640, 480)
    }
}

/// One encoded still frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameData {
    /// `data:image/jpeg;base64,...`
    pub data_url: String,
    pub width: u32,
    pub height: u32,
}

impl FrameData {
    pub const JPEG_PREFIX: &'static str = "data:image/jpeg;base64,";

    pub fn new(data_url: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            data_url: data_url.into(),
            width,
            height,
        }
    }

    /// Base64 payload without the data-URL header.
    pub fn payload(&self) -> &str {
        match self.data_url.split_once(',') {
            Some((_, payload)) => payload,
            None => &self.data_url,
        }
    }
}

/// Source of video streams (camera, image replay, ...).
#[async_trait]
pub trait VideoSource: Send + Sync {
    fn name(&self) -> &str;

    /// Acquire a stream. Fails when the device is missing or access is denied.
    async fn open(&self, constraints: CaptureConstraints)
    -> Result<Box<dyn VideoStream>, CaptureError>;
}

/// An acquired video stream.
#[async_trait]
pub trait VideoStream: Send + Sync {
    /// Actual resolution, which may differ from the requested one.
    fn resolution(&self) -> (u32, u32);

    /// Grab the current frame as a JPEG data URL.
    async fn capture(&mut self) -> Result<FrameData, CaptureError>;

    /// Stop all tracks. Capturing afterwards fails with `Released`.
    async fn release(&mut self);
}
