//! Browser and navigation sections.

use serde::{Deserialize, Serialize};

/// DevTools endpoint of the browser the extension variant drives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// HTTP address of the debugging endpoint (`--remote-debugging-port`).
    #[serde(default = "default_debug_url")]
    pub debug_url: String,

    /// Attach only to page targets whose URL contains this string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab_filter: Option<String>,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Seconds between polls for opened and closed tabs.
    #[serde(default = "default_poll_secs")]
    pub poll_secs: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            debug_url: default_debug_url(),
            tab_filter: None,
            connect_timeout_secs: default_connect_timeout_secs(),
            poll_secs: default_poll_secs(),
        }
    }
}

fn default_debug_url() -> String {
    "http://127.0.0.1:9222".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_poll_secs() -> u64 {
    2
}

/// Same-page rules for navigation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationConfig {
    /// Hosts where any path counts as already being on the target.
    #[serde(default = "default_special_hosts")]
    pub special_hosts: Vec<String>,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            special_hosts: default_special_hosts(),
        }
    }
}

fn default_special_hosts() -> Vec<String> {
    vec!["chatgpt.com".to_string(), "chat.openai.com".to_string()]
}
