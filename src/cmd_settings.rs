//! `gesturecall settings`: the configuration surface.

use std::error::Error;

use serde_json::{Map, Value};

use gesturecall_config::Config;
use gesturecall_protocols::SettingsStore;
use gesturecall_protocols::settings::keys;

use crate::adapters;
use crate::cli::SettingsAction;

pub(crate) async fn handle_settings_command(config: &Config, action: SettingsAction) -> Result<(), Box<dyn Error>> {
    let store = adapters::open_store(config).await?;
    match action {
        SettingsAction::Show { format } => show(store.as_ref(), config, &format).await,
        SettingsAction::Set {
            target_url,
            click_selector,
            stop_selector,
            cover_visible,
        } => {
            let values = updates(target_url, click_selector, stop_selector, cover_visible);
            if values.is_empty() {
                return Err("nothing to set; pass at least one --option".into());
            }
            let changed: Vec<String> = values.keys().cloned().collect();
            store.set(values).await?;
            println!("Updated: {}", changed.join(", "));
            Ok(())
        }
        SettingsAction::Unset { keys: names } => {
            let unknown: Vec<&String> = names.iter().filter(|k| !keys::ALL.contains(&k.as_str())).collect();
            if !unknown.is_empty() {
                return Err(format!("unknown setting(s): {:?}; expected one of {:?}", unknown, keys::ALL).into());
            }
            let names: Vec<&str> = names.iter().map(String::as_str).collect();
            store.remove(&names).await?;
            println!("Removed: {}", names.join(", "));
            Ok(())
        }
    }
}

/// Build the update map; blank strings clear a selector or URL.
pub(crate) fn updates(
    target_url: Option<String>,
    click_selector: Option<String>,
    stop_selector: Option<String>,
    cover_visible: Option<bool>,
) -> Map<String, Value> {
    let mut values = Map::new();
    for (key, value) in [
        (keys::TARGET_URL, target_url),
        (keys::CLICK_SELECTOR, click_selector),
        (keys::STOP_SELECTOR, stop_selector),
    ] {
        if let Some(value) = value {
            let value = value.trim().to_string();
            values.insert(key.to_string(), Value::String(value));
        }
    }
    if let Some(visible) = cover_visible {
        values.insert(keys::COVER_VISIBLE.to_string(), Value::Bool(visible));
    }
    values
}

/// Rows in display order: the stored value, or the default shown by the UI.
pub(crate) fn rows(stored: &Map<String, Value>, config: &Config) -> Vec<(&'static str, String, bool)> {
    let text = |key: &str| stored.get(key).and_then(Value::as_str).filter(|s| !s.is_empty());
    let mut rows = Vec::new();

    match text(keys::TARGET_URL) {
        Some(url) => rows.push((keys::TARGET_URL, url.to_string(), false)),
        None => rows.push((keys::TARGET_URL, config.settings.default_target_url.clone(), true)),
    }
    for key in [keys::CLICK_SELECTOR, keys::STOP_SELECTOR] {
        match text(key) {
            Some(selector) => rows.push((key, selector.to_string(), false)),
            None => rows.push((key, "(none)".to_string(), true)),
        }
    }
    match stored.get(keys::COVER_VISIBLE).and_then(Value::as_bool) {
        Some(visible) => rows.push((keys::COVER_VISIBLE, visible.to_string(), false)),
        None => rows.push((keys::COVER_VISIBLE, "true".to_string(), true)),
    }
    let tabs = stored
        .get(keys::CAMERA_ACTIVE_FOR_TABS)
        .and_then(Value::as_object)
        .map(|m| m.values().filter(|v| v.as_bool() == Some(true)).count())
        .unwrap_or(0);
    rows.push((keys::CAMERA_ACTIVE_FOR_TABS, format!("{} tab(s)", tabs), false));
    rows
}

async fn show(store: &dyn SettingsStore, config: &Config, format: &str) -> Result<(), Box<dyn Error>> {
    let stored = store.get(&keys::ALL).await?;
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&Value::Object(stored))?),
        _ => {
            for (key, value, is_default) in rows(&stored, config) {
                let marker = if is_default { "  (default)" } else { "" };
                println!("{:<22} {}{}", key, value, marker);
            }
        }
    }
    Ok(())
}
