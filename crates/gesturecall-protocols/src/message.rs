//! Relay message definitions.
//!
//! Messages travel between three logical contexts:
//!
//! - **Page**: one per browser tab, owns the camera and performs actions
//! - **Coordinator**: the privileged hub, the only context that can reach the
//!   inference context
//! - **Inference context**: hosts the external hand tracker
//!
//! Every request is answered with a [`RelayResponse`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RelayError;
use crate::landmark::DetectionResult;

/// Tab identifier, valid for the current browser session only.
pub type TabId = String;

/// URL prefixes of internal pages that never receive relay traffic.
pub const RESTRICTED_URL_PREFIXES: &[&str] =
    &["chrome://", "chrome-extension://", "devtools://", "about:"];

/// Logical endpoint a message is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Endpoint {
    Page,
    InferenceContext,
}

/// Relay message, tagged by `action` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum RelayMessage {
    /// Page -> coordinator -> inference: load the hand tracker.
    InitializeHandDetection,
    /// Page -> coordinator -> inference: run inference on one frame.
    ProcessFrame {
        #[serde(rename = "imageData")]
        image_data: String,
    },
    /// Page -> coordinator -> inference: tear the tracker down.
    StopHandDetection,
    /// Inference -> coordinator -> every page.
    HandDetectionResults { results: DetectionResult },
    /// Configuration surface -> page.
    StartCamera,
    /// Configuration surface -> page.
    StopCamera,
    /// Configuration surface -> page. `None` toggles the current state.
    ToggleCover {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        visible: Option<bool>,
    },
}

impl RelayMessage {
    /// Wire name of the action.
    pub fn action(&self) -> &'static str {
        match self {
            Self::InitializeHandDetection => "initializeHandDetection",
            Self::ProcessFrame { .. } => "processFrame",
            Self::StopHandDetection => "stopHandDetection",
            Self::HandDetectionResults { .. } => "handDetectionResults",
            Self::StartCamera => "startCamera",
            Self::StopCamera => "stopCamera",
            Self::ToggleCover { .. } => "toggleCover",
        }
    }

    /// The endpoint that finally handles this message.
    pub fn target(&self) -> Endpoint {
        match self {
            Self::InitializeHandDetection | Self::ProcessFrame { .. } | Self::StopHandDetection => {
                Endpoint::InferenceContext
            }
            Self::HandDetectionResults { .. }
            | Self::StartCamera
            | Self::StopCamera
            | Self::ToggleCover { .. } => Endpoint::Page,
        }
    }
}

/// Structured result of every relay request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Number of pages a broadcast reached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tabs_sent: Option<usize>,
}

impl RelayResponse {
    /// A bare success.
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Default::default()
        }
    }

    /// A success carrying a payload.
    pub fn ok_with(data: impl Into<Value>) -> Self {
        Self {
            success: true,
            data: Some(data.into()),
            ..Default::default()
        }
    }

    /// A failure with an error message.
    pub fn failure(error: impl std::fmt::Display) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
            ..Default::default()
        }
    }

    /// A broadcast summary.
    pub fn broadcast(tabs_sent: usize) -> Self {
        Self {
            success: true,
            tabs_sent: Some(tabs_sent),
            ..Default::default()
        }
    }

    /// Whether this is a failure carrying `error`.
    pub fn failed_with(&self, error: &RelayError) -> bool {
        !self.success && self.error.as_deref() == Some(error.to_string().as_str())
    }
}

impl From<RelayError> for RelayResponse {
    fn from(err: RelayError) -> Self {
        RelayResponse::failure(err)
    }
}

impl<T: Into<Value>> From<Result<T, RelayError>> for RelayResponse {
    fn from(result: Result<T, RelayError>) -> Self {
        match result {
            Ok(data) => RelayResponse::ok_with(data),
            Err(err) => RelayResponse::failure(err),
        }
    }
}

/// A tab known to the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabInfo {
    pub id: TabId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl TabInfo {
    pub fn new(id: impl Into<TabId>, url: Option<String>) -> Self {
        Self { id: id.into(), url }
    }

    /// Whether the tab may receive a results broadcast.
    ///
    /// A tab without a URL, or on an internal page, is skipped.
    pub fn is_eligible(&self) -> bool {
        match self.url.as_deref() {
            Some(url) if !url.is_empty() => !RESTRICTED_URL_PREFIXES
                .iter()
                .any(|prefix| url.starts_with(prefix)),
            _ => false,
        }
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
