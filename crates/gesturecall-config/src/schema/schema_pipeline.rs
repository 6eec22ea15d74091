//! Detection, camera and tracker sections.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Detection loop timing and capture size for the extension variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Milliseconds between frames.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_height")]
    pub height: u32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            width: default_width(),
            height: default_height(),
        }
    }
}

fn default_interval_ms() -> u64 {
    500
}

fn default_width() -> u32 {
    180
}

fn default_height() -> u32 {
    120
}

/// Where frames come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    /// "webcam" or "replay".
    #[serde(default = "default_source")]
    pub source: String,

    /// Directory of images cycled through by the replay source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replay_dir: Option<PathBuf>,

    #[serde(default)]
    pub device_index: u32,

    /// "user" or "environment".
    #[serde(default = "default_facing_mode")]
    pub facing_mode: String,

    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// Capture size of the simple web variant.
    #[serde(default = "default_web_width")]
    pub web_width: u32,

    #[serde(default = "default_web_height")]
    pub web_height: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            replay_dir: None,
            device_index: 0,
            facing_mode: default_facing_mode(),
            jpeg_quality: default_jpeg_quality(),
            web_width: default_web_width(),
            web_height: default_web_height(),
        }
    }
}

fn default_source() -> String {
    "webcam".to_string()
}

fn default_facing_mode() -> String {
    "user".to_string()
}

fn default_jpeg_quality() -> u8 {
    80
}

fn default_web_width() -> u32 {
    1280
}

fn default_web_height() -> u32 {
    720
}

/// Hand-pose estimation collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// "subprocess" or "null".
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Program speaking the JSON-lines tracker protocol.
    #[serde(default = "default_command")]
    pub command: String,

    #[serde(default)]
    pub args: Vec<String>,

    /// Per-frame answer timeout.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    #[serde(default = "default_max_num_hands")]
    pub max_num_hands: u32,

    #[serde(default = "default_model_complexity")]
    pub model_complexity: u32,

    #[serde(default = "default_min_detection_confidence")]
    pub min_detection_confidence: f32,

    #[serde(default = "default_min_tracking_confidence")]
    pub min_tracking_confidence: f32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            command: default_command(),
            args: Vec::new(),
            request_timeout_ms: default_request_timeout_ms(),
            max_num_hands: default_max_num_hands(),
            model_complexity: default_model_complexity(),
            min_detection_confidence: default_min_detection_confidence(),
            min_tracking_confidence: default_min_tracking_confidence(),
        }
    }
}

fn default_backend() -> String {
    "subprocess".to_string()
}

fn default_command() -> String {
    "gesturecall-tracker".to_string()
}

fn default_request_timeout_ms() -> u64 {
    5_000
}

fn default_max_num_hands() -> u32 {
    2
}

fn default_model_complexity() -> u32 {
    1
}

fn default_min_detection_confidence() -> f32 {
    0.5
}

fn default_min_tracking_confidence() -> f32 {
    0.3
}
