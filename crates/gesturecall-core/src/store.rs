//! Settings store implementations.
//!
//! - [`MemorySettingsStore`]: process-local map, used by tests and the simple
//!   web variant
//! - [`JsonFileSettingsStore`]: a single JSON object on disk
//!   (`~/.gesturecall/settings.json` by default)
//!
//! Per-tab updates are read-modify-write and serialized per store instance.
//! Two processes writing the same file race; the last write wins.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::fs;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use gesturecall_protocols::settings::keys;
use gesturecall_protocols::{ExtensionSettings, SettingsStore, StoreError, TabId};

/// Reject values of the wrong type for known keys.
fn validate(values: &Map<String, Value>) -> Result<(), StoreError> {
    for (key, value) in values {
        if !keys::ALL.contains(&key.as_str()) || value.is_null() {
            continue;
        }
        let mut single = Map::new();
        single.insert(key.clone(), value.clone());
        if let Err(e) = ExtensionSettings::from_map(&single) {
            return Err(StoreError::InvalidValue {
                key: key.clone(),
                message: e.to_string(),
            });
        }
    }
    Ok(())
}

fn select(map: &Map<String, Value>, wanted: &[&str]) -> Map<String, Value> {
    wanted
        .iter()
        .filter_map(|k| map.get(*k).map(|v| (k.to_string(), v.clone())))
        .collect()
}

/// Set `tabs[tab] = active` inside `map`, replacing a malformed entry.
fn update_tab(map: &mut Map<String, Value>, tab: &TabId, active: bool) {
    let entry = map
        .entry(keys::CAMERA_ACTIVE_FOR_TABS)
        .or_insert_with(|| Value::Object(Map::new()));
    if !entry.is_object() {
        warn!("Replacing malformed {} entry", keys::CAMERA_ACTIVE_FOR_TABS);
        *entry = Value::Object(Map::new());
    }
    if let Value::Object(tabs) = entry {
        tabs.insert(tab.clone(), Value::Bool(active));
    }
}

fn remove_tab(map: &mut Map<String, Value>, tab: &TabId) -> bool {
    match map.get_mut(keys::CAMERA_ACTIVE_FOR_TABS) {
        Some(Value::Object(tabs)) => tabs.remove(tab).is_some(),
        _ => false,
    }
}

/// In-memory settings store.
#[derive(Default)]
pub struct MemorySettingsStore {
    values: RwLock<Map<String, Value>>,
    update_lock: Mutex<()>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with typed settings.
    pub fn with_settings(settings: &ExtensionSettings) -> Result<Self, StoreError> {
        let values = match serde_json::to_value(settings)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Ok(Self {
            values: RwLock::new(values),
            update_lock: Mutex::new(()),
        })
    }

    /// Copy of everything stored, unknown keys included.
    pub async fn snapshot(&self) -> Map<String, Value> {
        self.values.read().await.clone()
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, StoreError> {
        Ok(select(&*self.values.read().await, keys))
    }

    async fn set(&self, values: Map<String, Value>) -> Result<(), StoreError> {
        validate(&values)?;
        self.values.write().await.extend(values);
        Ok(())
    }

    async fn remove(&self, keys: &[&str]) -> Result<(), StoreError> {
        let mut values = self.values.write().await;
        for key in keys {
            values.remove(*key);
        }
        Ok(())
    }

    async fn set_camera_active_for_tab(&self, tab: &TabId, active: bool) -> Result<(), StoreError> {
        let _guard = self.update_lock.lock().await;
        update_tab(&mut *self.values.write().await, tab, active);
        Ok(())
    }

    async fn forget_tab(&self, tab: &TabId) -> Result<(), StoreError> {
        let _guard = self.update_lock.lock().await;
        remove_tab(&mut *self.values.write().await, tab);
        Ok(())
    }
}

struct FileCache {
    values: Map<String, Value>,
    modified: Option<SystemTime>,
}

/// Settings persisted as one JSON object on disk.
///
/// The file is re-read whenever its modification time changes, so edits made
/// by another process (the `settings` CLI) are picked up on the next read.
pub struct JsonFileSettingsStore {
    path: PathBuf,
    cache: RwLock<FileCache>,
    update_lock: Mutex<()>,
}

impl JsonFileSettingsStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
            cache: RwLock::new(FileCache {
                values: Map::new(),
                modified: None,
            }),
            update_lock: Mutex::new(()),
        };
        store.refresh().await?;
        info!("Settings store opened at {:?}", store.path);
        Ok(store)
    }

    /// Store at `~/.gesturecall/settings.json`.
    pub async fn default_path() -> Result<Self, StoreError> {
        Self::open(Self::default_location()?).await
    }

    pub fn default_location() -> Result<PathBuf, StoreError> {
        let home = dirs::home_dir().ok_or_else(|| {
            StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "home directory not found",
            ))
        })?;
        Ok(home.join(".gesturecall").join("settings.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn modified(&self) -> Option<SystemTime> {
        fs::metadata(&self.path).await.ok().and_then(|m| m.modified().ok())
    }

    /// Reload from disk when the file changed since the last read.
    async fn refresh(&self) -> Result<(), StoreError> {
        let modified = self.modified().await;
        {
            let cache = self.cache.read().await;
            if modified.is_some() && cache.modified == modified {
                return Ok(());
            }
        }

        let values = match fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Map::new(),
            Ok(content) => match serde_json::from_str::<Value>(&content)? {
                Value::Object(map) => map,
                other => {
                    return Err(StoreError::InvalidValue {
                        key: self.path.display().to_string(),
                        message: format!("expected a JSON object, found {}", other),
                    });
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => return Err(e.into()),
        };

        let mut cache = self.cache.write().await;
        cache.values = values;
        cache.modified = modified;
        debug!("Loaded {} settings keys from {:?}", cache.values.len(), self.path);
        Ok(())
    }

    async fn persist(&self, cache: &mut FileCache) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let content = serde_json::to_string_pretty(&cache.values)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content).await?;
        fs::rename(&tmp, &self.path).await?;
        cache.modified = self.modified().await;
        debug!("Saved settings to {:?}", self.path);
        Ok(())
    }

    async fn update<F>(&self, apply: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Map<String, Value>) + Send,
    {
        let _guard = self.update_lock.lock().await;
        self.refresh().await?;
        let mut cache = self.cache.write().await;
        apply(&mut cache.values);
        self.persist(&mut cache).await
    }
}

#[async_trait]
impl SettingsStore for JsonFileSettingsStore {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, StoreError> {
        self.refresh().await?;
        Ok(select(&self.cache.read().await.values, keys))
    }

    async fn set(&self, values: Map<String, Value>) -> Result<(), StoreError> {
        validate(&values)?;
        self.update(move |map| map.extend(values)).await
    }

    async fn remove(&self, keys: &[&str]) -> Result<(), StoreError> {
        let keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        self.update(move |map| {
            for key in &keys {
                map.remove(key);
            }
        })
        .await
    }

    async fn set_camera_active_for_tab(&self, tab: &TabId, active: bool) -> Result<(), StoreError> {
        self.update(|map| update_tab(map, tab, active)).await
    }

    async fn forget_tab(&self, tab: &TabId) -> Result<(), StoreError> {
        self.update(|map| {
            remove_tab(map, tab);
        })
        .await
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
