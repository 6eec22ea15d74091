//! Page surface protocol definitions.
//!
//! A page is the browser tab the pipeline acts on. Three capabilities are
//! split out so that a test double can implement any subset:
//!
//! - [`PageSurface`]: read the URL, click elements, navigate
//! - [`OverlayRenderer`]: draw the camera overlay on top of the page
//! - [`NavigationObserver`]: learn about URL changes

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::PageError;
use crate::landmark::HandObservation;

/// Page automation surface.
#[async_trait]
pub trait PageSurface: Send + Sync {
    async fn current_url(&self) -> Result<String, PageError>;

    /// Activate the first element matching `selector`.
    ///
    /// Returns `Ok(false)` when nothing matches.
    async fn click_first(&self, selector: &str) -> Result<bool, PageError>;

    async fn navigate(&self, url: &str) -> Result<(), PageError>;
}

/// Overlay geometry and initial state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlaySpec {
    pub width: u32,
    pub height: u32,
    /// Whether the privacy cover starts visible.
    pub cover_visible: bool,
    /// Initial status text.
    pub status: String,
}

impl OverlaySpec {
    pub const DETECTING: &'static str = "Detecting...";

    pub fn new(width: u32, height: u32, cover_visible: bool) -> Self {
        Self {
            width,
            height,
            cover_visible,
            status: Self::DETECTING.to_string(),
        }
    }
}

/// Visual overlay drawn over the page.
#[async_trait]
pub trait OverlayRenderer: Send + Sync {
    async fn create_overlay(&self, spec: &OverlaySpec) -> Result<(), PageError>;

    async fn remove_overlay(&self) -> Result<(), PageError>;

    /// Clear the landmark canvas.
    async fn clear(&self) -> Result<(), PageError>;

    /// Draw one hand's landmarks and skeleton.
    async fn draw_hand(&self, hand: &HandObservation) -> Result<(), PageError>;

    /// Replace the status text. `highlight` marks a recognized gesture.
    async fn set_status(&self, text: &str, highlight: bool) -> Result<(), PageError>;

    async fn set_cover_visible(&self, visible: bool) -> Result<(), PageError>;
}

/// A top-level URL change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationEvent {
    pub url: String,
}

impl NavigationEvent {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Source of navigation events.
pub trait NavigationObserver: Send + Sync {
    /// Subscribe to URL changes. Each call yields an independent receiver.
    fn subscribe(&self) -> broadcast::Receiver<NavigationEvent>;
}
