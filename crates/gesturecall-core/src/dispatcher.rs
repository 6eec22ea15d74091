//! Action dispatcher.
//!
//! Turns a recognized gesture into a page side effect:
//!
//! | Gesture         | Effect                                              |
//! |-----------------|-----------------------------------------------------|
//! | `OpenPalm`      | navigate to the target URL, or click when already there |
//! | `IndexPointing` | click the first `clickSelector` match               |
//! | `ThumbUp`       | click the first `stopSelector` match                |

use std::sync::Arc;

use gesturecall_protocols::{ExtensionSettings, Gesture, PageError, PageSurface, SettingsStore, TabId};
use tracing::{debug, info, warn};
use url::Url;

/// Hosts where any URL on the same host counts as "already there".
pub const DEFAULT_SPECIAL_HOSTS: &[&str] = &["chatgpt.com", "chat.openai.com"];

/// URL equivalence rules used before navigating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlPolicy {
    special_hosts: Vec<String>,
}

impl Default for UrlPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_SPECIAL_HOSTS.iter().map(|h| h.to_string()))
    }
}

impl UrlPolicy {
    pub fn new(special_hosts: impl IntoIterator<Item = String>) -> Self {
        Self {
            special_hosts: special_hosts
                .into_iter()
                .map(|h| h.trim().to_ascii_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
        }
    }

    pub fn special_hosts(&self) -> &[String] {
        &self.special_hosts
    }

    /// Whether moving from `current` to `target` is a real navigation.
    ///
    /// Special hosts compare by hostname only; any other target must match
    /// the current URL exactly. Unparseable input falls back to string
    /// inequality.
    pub fn should_navigate(&self, current: &str, target: &str) -> bool {
        let (Ok(current_url), Ok(target_url)) = (Url::parse(current), Url::parse(target)) else {
            debug!(current, target, "URL parse failed, comparing raw strings");
            return current != target;
        };

        match target_url.host_str() {
            Some(host) if self.special_hosts.iter().any(|h| h == host) => {
                current_url.host_str() != Some(host)
            }
            _ => current != target,
        }
    }
}

/// [`UrlPolicy::should_navigate`] with the default host list.
pub fn should_navigate(current: &str, target: &str) -> bool {
    UrlPolicy::default().should_navigate(current, target)
}

/// Whether the page at `current` is on the target domain (camera auto-start).
///
/// No target means every page is allowed. Parse failure disallows.
pub fn is_url_allowed(current: &str, target: Option<&str>) -> bool {
    let Some(target) = target else {
        return true;
    };
    match (Url::parse(current), Url::parse(target)) {
        (Ok(current), Ok(target)) => current.host_str() == target.host_str(),
        _ => false,
    }
}

/// What a dispatch did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Navigated { url: String },
    Clicked { selector: String },
    /// The selector matched nothing. Not an error.
    SelectorMiss { selector: String },
    /// Nothing configured for this gesture.
    NoAction,
}

/// Executes the configured side effect of a gesture on one page.
pub struct ActionDispatcher {
    page: Arc<dyn PageSurface>,
    store: Arc<dyn SettingsStore>,
    tab_id: Option<TabId>,
    policy: UrlPolicy,
}

impl ActionDispatcher {
    pub fn new(page: Arc<dyn PageSurface>, store: Arc<dyn SettingsStore>) -> Self {
        Self {
            page,
            store,
            tab_id: None,
            policy: UrlPolicy::default(),
        }
    }

    /// Tab whose camera state is preserved across navigation.
    pub fn with_tab(mut self, tab_id: impl Into<TabId>) -> Self {
        self.tab_id = Some(tab_id.into());
        self
    }

    pub fn with_policy(mut self, policy: UrlPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &UrlPolicy {
        &self.policy
    }

    pub async fn dispatch(
        &self,
        gesture: Gesture,
        current_url: &str,
        settings: &ExtensionSettings,
        camera_active: bool,
    ) -> Result<DispatchOutcome, PageError> {
        debug!(gesture = %gesture, current_url, "Dispatching gesture");

        match gesture {
            Gesture::OpenPalm => {
                let Some(target) = settings.target_url() else {
                    debug!("No target URL configured");
                    return Ok(DispatchOutcome::NoAction);
                };

                if !self.policy.should_navigate(current_url, target) {
                    debug!(target, "Already on target, trying click action");
                    return self.click(settings.click_selector()).await;
                }

                if camera_active {
                    self.preserve_camera_state().await;
                }

                info!(target, "Navigating to target URL");
                self.page.navigate(target).await?;
                Ok(DispatchOutcome::Navigated {
                    url: target.to_string(),
                })
            }
            Gesture::IndexPointing => self.click(settings.click_selector()).await,
            Gesture::ThumbUp => self.click(settings.stop_selector()).await,
        }
    }

    async fn click(&self, selector: Option<&str>) -> Result<DispatchOutcome, PageError> {
        let Some(selector) = selector else {
            return Ok(DispatchOutcome::NoAction);
        };

        if self.page.click_first(selector).await? {
            info!(selector, "Clicked element");
            Ok(DispatchOutcome::Clicked {
                selector: selector.to_string(),
            })
        } else {
            debug!(selector, "No element matched selector");
            Ok(DispatchOutcome::SelectorMiss {
                selector: selector.to_string(),
            })
        }
    }

    async fn preserve_camera_state(&self) {
        let Some(tab) = &self.tab_id else {
            debug!("No tab id, camera state not preserved");
            return;
        };
        match self.store.set_camera_active_for_tab(tab, true).await {
            Ok(()) => debug!(tab = %tab, "Camera state preserved for navigation"),
            Err(e) => warn!(tab = %tab, "Failed to preserve camera state: {}", e),
        }
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
