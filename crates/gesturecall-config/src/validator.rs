//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::Config;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Fail with every error joined when any is present.
    pub fn ensure_valid(&self) -> Result<(), ConfigError> {
        if self.is_valid() {
            return Ok(());
        }
        let joined = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.path, e.message))
            .collect::<Vec<_>>()
            .join("; ");
        Err(ConfigError::Invalid(joined))
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

const CAMERA_SOURCES: [&str; 2] = ["webcam", "replay"];
const FACING_MODES: [&str; 2] = ["user", "environment"];
const TRACKER_BACKENDS: [&str; 2] = ["subprocess", "null"];

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();

        Self::validate_server(config, &mut result);
        Self::validate_detection(config, &mut result);
        Self::validate_camera(config, &mut result);
        Self::validate_tracker(config, &mut result);
        Self::validate_browser(config, &mut result);
        Self::validate_navigation(config, &mut result);
        Self::validate_settings(config, &mut result);

        Ok(result)
    }

    fn validate_server(config: &Config, result: &mut ValidationResult) {
        if config.server.port == 0 {
            result.add_error(ValidationError::new("server.port", "Port cannot be 0"));
        }
        if config.server.host.is_empty() {
            result.add_error(ValidationError::new("server.host", "Host cannot be empty"));
        }
    }

    fn validate_detection(config: &Config, result: &mut ValidationResult) {
        let detection = &config.detection;
        if detection.interval_ms == 0 {
            result.add_error(ValidationError::new(
                "detection.interval_ms",
                "interval_ms must be greater than 0",
            ));
        } else if detection.interval_ms < 100 {
            result.add_warning(ValidationWarning::new(
                "detection.interval_ms",
                "interval_ms below 100 will queue frames faster than most trackers answer",
            ));
        }
        if detection.width == 0 || detection.height == 0 {
            result.add_error(ValidationError::new(
                "detection",
                "width and height must be greater than 0",
            ));
        }
    }

    fn validate_camera(config: &Config, result: &mut ValidationResult) {
        let camera = &config.camera;
        if !CAMERA_SOURCES.contains(&camera.source.as_str()) {
            result.add_error(ValidationError::new(
                "camera.source",
                format!("Unknown camera source '{}', valid values: {:?}", camera.source, CAMERA_SOURCES),
            ));
        }

        if camera.source == "replay" {
            match &camera.replay_dir {
                None => result.add_error(ValidationError::new(
                    "camera.replay_dir",
                    "replay source needs replay_dir",
                )),
                Some(dir) if !dir.exists() => result.add_warning(ValidationWarning::new(
                    "camera.replay_dir",
                    format!("Replay directory does not exist: {:?}", dir),
                )),
                Some(_) => {}
            }
        }

        if !FACING_MODES.contains(&camera.facing_mode.as_str()) {
            result.add_error(ValidationError::new(
                "camera.facing_mode",
                format!("facing_mode must be one of {:?}", FACING_MODES),
            ));
        }

        if camera.jpeg_quality == 0 || camera.jpeg_quality > 100 {
            result.add_error(ValidationError::new(
                "camera.jpeg_quality",
                "jpeg_quality must be between 1 and 100",
            ));
        }

        if camera.web_width == 0 || camera.web_height == 0 {
            result.add_error(ValidationError::new(
                "camera",
                "web_width and web_height must be greater than 0",
            ));
        }
    }

    fn validate_tracker(config: &Config, result: &mut ValidationResult) {
        let tracker = &config.tracker;
        if !TRACKER_BACKENDS.contains(&tracker.backend.as_str()) {
            result.add_error(ValidationError::new(
                "tracker.backend",
                format!("Unknown tracker backend '{}', valid values: {:?}", tracker.backend, TRACKER_BACKENDS),
            ));
        }

        if tracker.backend == "subprocess" && tracker.command.trim().is_empty() {
            result.add_error(ValidationError::new(
                "tracker.command",
                "subprocess backend needs a command",
            ));
        }

        if tracker.backend == "null" {
            result.add_warning(ValidationWarning::new(
                "tracker.backend",
                "null tracker never reports hands, gestures will not fire",
            ));
        }

        if tracker.max_num_hands == 0 {
            result.add_error(ValidationError::new(
                "tracker.max_num_hands",
                "max_num_hands must be greater than 0",
            ));
        }

        if tracker.model_complexity > 1 {
            result.add_warning(ValidationWarning::new(
                "tracker.model_complexity",
                "model_complexity above 1 is not supported by most trackers",
            ));
        }

        for (path, value) in [
            ("tracker.min_detection_confidence", tracker.min_detection_confidence),
            ("tracker.min_tracking_confidence", tracker.min_tracking_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                result.add_error(ValidationError::new(path, "confidence must be within [0, 1]"));
            }
        }

        if tracker.request_timeout_ms == 0 {
            result.add_error(ValidationError::new(
                "tracker.request_timeout_ms",
                "request_timeout_ms must be greater than 0",
            ));
        }
    }

    fn validate_browser(config: &Config, result: &mut ValidationResult) {
        let url = &config.browser.debug_url;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            result.add_error(ValidationError::new(
                "browser.debug_url",
                "debug_url must start with http:// or https://",
            ));
        } else if url::Url::parse(url).is_err() {
            result.add_error(ValidationError::new(
                "browser.debug_url",
                format!("debug_url is not a valid URL: {}", url),
            ));
        }

        if config.browser.poll_secs == 0 {
            result.add_error(ValidationError::new(
                "browser.poll_secs",
                "poll_secs must be greater than 0",
            ));
        }
    }

    fn validate_navigation(config: &Config, result: &mut ValidationResult) {
        let hosts = &config.navigation.special_hosts;
        if hosts.is_empty() {
            result.add_warning(ValidationWarning::new(
                "navigation.special_hosts",
                "no special hosts, every target is compared as an exact URL",
            ));
        }
        for host in hosts {
            if host.contains('/') || host.contains(':') || host.trim().is_empty() {
                result.add_error(ValidationError::new(
                    "navigation.special_hosts",
                    format!("'{}' is not a bare host name", host),
                ));
            }
        }
    }

    fn validate_settings(config: &Config, result: &mut ValidationResult) {
        if url::Url::parse(&config.settings.default_target_url).is_err() {
            result.add_error(ValidationError::new(
                "settings.default_target_url",
                "default_target_url is not a valid URL",
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
