//! Builds the pipeline collaborators from configuration.

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use gesturecall_capture::ReplaySource;
use gesturecall_config::{Config, ConfigLoader};
use gesturecall_core::{JsonFileSettingsStore, NullTrackerFactory, UrlPolicy};
use gesturecall_protocols::{
    CaptureConstraints, FacingMode, HandTrackerFactory, SettingsStore, TrackerOptions, VideoSource,
};
use gesturecall_tracker_subprocess::{SubprocessTrackerFactory, TrackerCommand};

/// Get the .gesturecall directory path.
pub(crate) fn gesturecall_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".gesturecall"))
        .unwrap_or_else(|| PathBuf::from(".gesturecall"))
}

pub(crate) async fn open_store(config: &Config) -> Result<Arc<dyn SettingsStore>, Box<dyn Error>> {
    let store = match &config.settings.path {
        Some(path) => JsonFileSettingsStore::open(ConfigLoader::expand_path(path)).await?,
        None => JsonFileSettingsStore::default_path().await?,
    };
    Ok(Arc::new(store))
}

fn facing_mode(config: &Config) -> FacingMode {
    match config.camera.facing_mode.as_str() {
        "environment" => FacingMode::Environment,
        _ => FacingMode::User,
    }
}

pub(crate) fn detection_config(config: &Config) -> gesturecall_core::DetectionConfig {
    let mut constraints = CaptureConstraints::new(config.detection.width, config.detection.height);
    constraints.facing_mode = facing_mode(config);
    gesturecall_core::DetectionConfig {
        interval: Duration::from_millis(config.detection.interval_ms),
        constraints,
    }
}

pub(crate) fn video_source(config: &Config) -> Result<Arc<dyn VideoSource>, Box<dyn Error>> {
    let quality = config.camera.jpeg_quality;
    match config.camera.source.as_str() {
        "replay" => {
            let dir = config
                .camera
                .replay_dir
                .as_deref()
                .ok_or("camera.replay_dir is required for the replay source")?;
            Ok(Arc::new(ReplaySource::new(ConfigLoader::expand_path(dir), quality)))
        }
        "webcam" => webcam(config.camera.device_index, quality),
        other => Err(format!("unknown camera source: {}", other).into()),
    }
}

#[cfg(feature = "webcam")]
fn webcam(index: u32, quality: u8) -> Result<Arc<dyn VideoSource>, Box<dyn Error>> {
    Ok(Arc::new(gesturecall_capture::WebcamSource::new(index, quality)))
}

#[cfg(not(feature = "webcam"))]
fn webcam(_index: u32, _quality: u8) -> Result<Arc<dyn VideoSource>, Box<dyn Error>> {
    Err("built without the `webcam` feature; rebuild with --features webcam or set camera.source = \"replay\"".into())
}

pub(crate) fn tracker_options(config: &Config) -> TrackerOptions {
    TrackerOptions {
        max_num_hands: config.tracker.max_num_hands,
        model_complexity: config.tracker.model_complexity,
        min_detection_confidence: config.tracker.min_detection_confidence,
        min_tracking_confidence: config.tracker.min_tracking_confidence,
    }
}

pub(crate) fn tracker_factory(config: &Config) -> Arc<dyn HandTrackerFactory> {
    match config.tracker.backend.as_str() {
        "null" => Arc::new(NullTrackerFactory),
        _ => {
            let command = TrackerCommand::new(expand_program(&config.tracker.command))
                .with_args(config.tracker.args.clone())
                .with_timeout(Duration::from_millis(config.tracker.request_timeout_ms));
            Arc::new(SubprocessTrackerFactory::new(command))
        }
    }
}

fn expand_program(program: &str) -> String {
    ConfigLoader::expand_path(std::path::Path::new(program))
        .display()
        .to_string()
}

pub(crate) fn url_policy(config: &Config) -> UrlPolicy {
    UrlPolicy::new(config.navigation.special_hosts.iter().cloned())
}
