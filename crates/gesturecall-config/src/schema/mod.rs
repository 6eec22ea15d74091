//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

mod schema_browser;
mod schema_pipeline;

pub use schema_browser::*;
pub use schema_pipeline::*;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub detection: DetectionConfig,

    #[serde(default)]
    pub camera: CameraConfig,

    #[serde(default)]
    pub tracker: TrackerConfig,

    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub navigation: NavigationConfig,

    #[serde(default)]
    pub settings: SettingsConfig,
}

/// Simple web variant server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

/// Settings store location and UI defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsConfig {
    /// JSON settings file. Defaults to `~/.gesturecall/settings.json`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Target URL shown by `settings show` when none is stored.
    #[serde(default = "default_target_url")]
    pub default_target_url: String,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            path: None,
            default_target_url: default_target_url(),
        }
    }
}

fn default_target_url() -> String {
    "https://chatgpt.com/".to_string()
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
