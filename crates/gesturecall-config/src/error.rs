//! Configuration errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Environment variable not set: {0}")]
    EnvVarNotSet(String),

    /// Validation failed; the message lists every offending field.
    #[error("Config is invalid: {0}")]
    Invalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_names_path() {
        let err = ConfigError::NotFound("config/default.toml".to_string());
        assert_eq!(err.to_string(), "Config file not found: config/default.toml");
    }

    #[test]
    fn test_invalid_lists_fields() {
        let err = ConfigError::Invalid("detection.interval_ms: must be at least 1".to_string());
        assert!(err.to_string().contains("detection.interval_ms"));
    }

    #[test]
    fn test_toml_error_converts() {
        let parse = toml::from_str::<toml::Value>("[camera\nsource = 1").unwrap_err();
        let err = ConfigError::from(parse);
        assert!(matches!(err, ConfigError::TomlParse(_)));
    }
}
