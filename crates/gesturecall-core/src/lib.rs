//! # GestureCall Core
//!
//! The gesture pipeline without any concrete camera, tracker or browser.
//!
//! ## Components
//!
//! - [`classifier`] - Finger-state rules mapping landmarks to gestures
//! - [`DetectionLoop`] - Samples camera frames while a page is active
//! - [`relay`] - Message bus between page, coordinator and inference contexts
//! - [`ActionDispatcher`] - Turns a gesture into a click or a navigation
//! - [`PageContext`] - Per-tab glue: overlay, auto start, result handling
//! - [`store`] - Settings store implementations
//!
//! Collaborators (camera, tracker, page automation) are plugged in through
//! the traits in `gesturecall-protocols`.

pub mod classifier;
pub mod detection;
pub mod dispatcher;
pub mod page;
pub mod relay;
pub mod store;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod tracker;

pub use classifier::{FingerState, classify, classify_landmarks, classify_result};
pub use detection::{DetectionConfig, DetectionLoop, FrameTimer};
pub use dispatcher::{ActionDispatcher, DispatchOutcome, UrlPolicy, is_url_allowed, should_navigate};
pub use page::{PageContext, status_text};
pub use relay::{Coordinator, InferenceContext, LocalInferenceHost, TabRegistry};
pub use store::{JsonFileSettingsStore, MemorySettingsStore};
pub use tracker::{NullHandTracker, NullTrackerFactory};
