//! Tab registry.
//!
//! The coordinator's view of open tabs. A tab may be known without a page
//! endpoint (nothing injected yet); sending to it is a transport failure.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use gesturecall_protocols::{RelayEndpoint, RelayError, RelayMessage, RelayResponse, TabId, TabInfo, TabMessenger};

struct TabEntry {
    url: Option<String>,
    endpoint: Option<Arc<dyn RelayEndpoint>>,
    /// Registration order, for stable listing.
    order: u64,
}

/// Thread-safe registry of tabs and their page endpoints.
#[derive(Default)]
pub struct TabRegistry {
    tabs: DashMap<TabId, TabEntry>,
    next_order: std::sync::atomic::AtomicU64,
}

impl TabRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a tab.
    pub fn register(&self, id: impl Into<TabId>, url: Option<String>, endpoint: Option<Arc<dyn RelayEndpoint>>) {
        let id = id.into();
        let order = self
            .next_order
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        debug!(tab = %id, url = ?url, "Tab registered");
        self.tabs.insert(id, TabEntry { url, endpoint, order });
    }

    /// Record a URL change. Unknown tabs are ignored.
    pub fn update_url(&self, id: &str, url: impl Into<String>) {
        if let Some(mut entry) = self.tabs.get_mut(id) {
            entry.url = Some(url.into());
        }
    }

    pub fn unregister(&self, id: &str) -> bool {
        self.tabs.remove(id).is_some()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tabs.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }
}

#[async_trait]
impl TabMessenger for TabRegistry {
    async fn query_tabs(&self) -> Vec<TabInfo> {
        let mut tabs: Vec<(u64, TabInfo)> = self
            .tabs
            .iter()
            .map(|entry| (entry.order, TabInfo::new(entry.key().clone(), entry.url.clone())))
            .collect();
        tabs.sort_by_key(|(order, _)| *order);
        tabs.into_iter().map(|(_, tab)| tab).collect()
    }

    async fn send_to_tab(&self, tab: &TabId, message: RelayMessage) -> Result<RelayResponse, RelayError> {
        // Clone out of the map so no shard lock is held across the await.
        let endpoint = self
            .tabs
            .get(tab)
            .and_then(|entry| entry.endpoint.clone())
            .ok_or_else(|| RelayError::Transport(format!("no receiver in tab {}", tab)))?;
        endpoint.request(message).await
    }
}
