use super::*;
use std::path::PathBuf;

fn paths(result: &ValidationResult) -> Vec<&str> {
    result.errors.iter().map(|e| e.path.as_str()).collect()
}

#[test]
fn test_validate_default_config() {
    let result = ConfigValidator::validate(&Config::default()).unwrap();
    assert!(result.is_valid());
    assert!(result.warnings.is_empty());
    assert!(result.ensure_valid().is_ok());
}

#[test]
fn test_validate_invalid_port() {
    let mut config = Config::default();
    config.server.port = 0;

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(!result.is_valid());
    assert!(paths(&result).contains(&"server.port"));
}

#[test]
fn test_validate_zero_interval() {
    let mut config = Config::default();
    config.detection.interval_ms = 0;

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(paths(&result).contains(&"detection.interval_ms"));
}

#[test]
fn test_validate_fast_interval_warns() {
    let mut config = Config::default();
    config.detection.interval_ms = 50;

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.is_valid());
    assert!(result.warnings.iter().any(|w| w.path == "detection.interval_ms"));
}

#[test]
fn test_validate_unknown_camera_source() {
    let mut config = Config::default();
    config.camera.source = "kinect".into();

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(paths(&result).contains(&"camera.source"));
}

#[test]
fn test_validate_replay_needs_dir() {
    let mut config = Config::default();
    config.camera.source = "replay".into();

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(paths(&result).contains(&"camera.replay_dir"));

    config.camera.replay_dir = Some(PathBuf::from("/nonexistent/frames"));
    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.is_valid());
    assert!(result.warnings.iter().any(|w| w.path == "camera.replay_dir"));
}

#[test]
fn test_validate_jpeg_quality() {
    let mut config = Config::default();
    config.camera.jpeg_quality = 0;
    assert!(!ConfigValidator::validate(&config).unwrap().is_valid());

    config.camera.jpeg_quality = 101;
    assert!(!ConfigValidator::validate(&config).unwrap().is_valid());
}

#[test]
fn test_validate_tracker_confidence_range() {
    let mut config = Config::default();
    config.tracker.min_detection_confidence = 1.5;
    config.tracker.min_tracking_confidence = -0.1;

    let result = ConfigValidator::validate(&config).unwrap();
    let errors = paths(&result);
    assert!(errors.contains(&"tracker.min_detection_confidence"));
    assert!(errors.contains(&"tracker.min_tracking_confidence"));
}

#[test]
fn test_validate_subprocess_needs_command() {
    let mut config = Config::default();
    config.tracker.command = "  ".into();

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(paths(&result).contains(&"tracker.command"));
}

#[test]
fn test_validate_null_tracker_warns() {
    let mut config = Config::default();
    config.tracker.backend = "null".into();

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.is_valid());
    assert!(result.warnings.iter().any(|w| w.path == "tracker.backend"));
}

#[test]
fn test_validate_debug_url_scheme() {
    let mut config = Config::default();
    config.browser.debug_url = "127.0.0.1:9222".into();

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(paths(&result).contains(&"browser.debug_url"));
}

#[test]
fn test_validate_special_hosts() {
    let mut config = Config::default();
    config.navigation.special_hosts = vec!["https://chatgpt.com/".into()];

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(paths(&result).contains(&"navigation.special_hosts"));

    config.navigation.special_hosts.clear();
    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.is_valid());
    assert!(!result.warnings.is_empty());
}

#[test]
fn test_ensure_valid_joins_errors() {
    let mut config = Config::default();
    config.server.port = 0;
    config.settings.default_target_url = "not a url".into();

    let result = ConfigValidator::validate(&config).unwrap();
    let err = result.ensure_valid().unwrap_err().to_string();
    assert!(err.contains("server.port"));
    assert!(err.contains("settings.default_target_url"));
}
