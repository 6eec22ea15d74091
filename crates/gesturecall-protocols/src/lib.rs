//! # GestureCall Protocols
//!
//! Core protocol definitions (types and traits) for the GestureCall pipeline.
//! Contains only data types and interface definitions - no implementations.
//!
//! ## Core Traits
//!
//! - [`HandTracker`] - External hand-pose estimation collaborator
//! - [`VideoSource`] - Video capture collaborator
//! - [`PageSurface`] - Page automation (element clicks, navigation)
//! - [`OverlayRenderer`] - Visual overlay drawn over the page
//! - [`NavigationObserver`] - URL change subscription
//! - [`SettingsStore`] - Key-value persisted configuration
//! - [`RelayEndpoint`] - Request/response endpoint on the relay bus

pub mod capture;
pub mod error;
pub mod gesture;
pub mod landmark;
pub mod message;
pub mod page;
pub mod relay;
pub mod settings;
pub mod tracker;

pub use capture::{CaptureConstraints, FacingMode, FrameData, VideoSource, VideoStream};
pub use error::{CaptureError, PageError, RelayError, StoreError, TrackerError};
pub use gesture::Gesture;
pub use landmark::{
    DetectionResult, HAND_CONNECTIONS, HandObservation, Handedness, LANDMARK_COUNT, Landmark,
};
pub use message::{Endpoint, RelayMessage, RelayResponse, TabId, TabInfo};
pub use page::{NavigationEvent, NavigationObserver, OverlayRenderer, OverlaySpec, PageSurface};
pub use relay::{InferenceHost, RelayEndpoint, TabMessenger};
pub use settings::{ExtensionSettings, SettingsStore};
pub use tracker::{HandTracker, HandTrackerFactory, TrackerOptions};
