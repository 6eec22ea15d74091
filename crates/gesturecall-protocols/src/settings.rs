//! Settings store protocol definitions.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StoreError;
use crate::message::TabId;

/// Stored key names.
pub mod keys {
    pub const TARGET_URL: &str = "targetUrl";
    pub const CLICK_SELECTOR: &str = "clickSelector";
    pub const STOP_SELECTOR: &str = "stopSelector";
    pub const COVER_VISIBLE: &str = "coverVisible";
    pub const CAMERA_ACTIVE_FOR_TABS: &str = "cameraActiveForTabs";

    pub const ALL: [&str; 5] = [
        TARGET_URL,
        CLICK_SELECTOR,
        STOP_SELECTOR,
        COVER_VISIBLE,
        CAMERA_ACTIVE_FOR_TABS,
    ];
}

/// User configuration read by the page context and the dispatcher.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub click_selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_visible: Option<bool>,
    #[serde(default, rename = "cameraActiveForTabs")]
    pub per_tab_camera_active: HashMap<TabId, bool>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl ExtensionSettings {
    /// Target URL, `None` when unset or blank.
    pub fn target_url(&self) -> Option<&str> {
        non_empty(&self.target_url)
    }

    pub fn click_selector(&self) -> Option<&str> {
        non_empty(&self.click_selector)
    }

    pub fn stop_selector(&self) -> Option<&str> {
        non_empty(&self.stop_selector)
    }

    /// Cover visibility, visible unless explicitly hidden.
    pub fn cover_visible(&self) -> bool {
        self.cover_visible.unwrap_or(true)
    }

    /// Stored camera state for a tab. Unknown or stale tabs read as `false`.
    pub fn camera_active_for(&self, tab: &str) -> bool {
        self.per_tab_camera_active.get(tab).copied().unwrap_or(false)
    }

    /// Build settings from a raw key-value map, ignoring unknown keys.
    pub fn from_map(map: &Map<String, Value>) -> Result<Self, StoreError> {
        let known: Map<String, Value> = map
            .iter()
            .filter(|(k, v)| keys::ALL.contains(&k.as_str()) && !v.is_null())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(serde_json::from_value(Value::Object(known))?)
    }
}

/// Key-value persisted configuration.
///
/// Keys not listed in [`keys::ALL`] are preserved untouched by every
/// implementation.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Read the requested keys. Missing keys are absent from the result.
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, StoreError>;

    /// Merge `values` into the store.
    async fn set(&self, values: Map<String, Value>) -> Result<(), StoreError>;

    /// Remove keys from the store.
    async fn remove(&self, keys: &[&str]) -> Result<(), StoreError>;

    /// Record the camera state of one tab (read-modify-write).
    async fn set_camera_active_for_tab(&self, tab: &TabId, active: bool) -> Result<(), StoreError>;

    /// Drop the entry of a closed tab.
    async fn forget_tab(&self, tab: &TabId) -> Result<(), StoreError>;

    /// Read the typed settings.
    async fn load(&self) -> Result<ExtensionSettings, StoreError> {
        let map = self.get(&keys::ALL).await?;
        ExtensionSettings::from_map(&map)
    }
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
