//! WebSocket wire messages between the page and the server.

use serde::{Deserialize, Serialize};

use gesturecall_core::{classify, status_text};
use gesturecall_protocols::{Gesture, HandObservation, Handedness, LANDMARK_COUNT, Landmark};

/// Status shown while no hand is in view.
pub const DETECTING_STATUS: &str = "Detecting gestures...";

/// Page → server.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// A captured JPEG frame; the server runs the tracker on it.
    Frame {
        #[serde(rename = "imageData")]
        image_data: String,
        #[serde(default)]
        width: u32,
        #[serde(default)]
        height: u32,
    },
    /// Landmarks the page already has (e.g. from an in-browser model).
    Landmarks {
        #[serde(default)]
        hands: Vec<HandObservation>,
    },
    Ping,
}

/// Classification of one hand.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandReport {
    pub handedness: Handedness,
    pub score: f32,
    pub landmarks: [Landmark; LANDMARK_COUNT],
    pub gesture: Option<Gesture>,
    pub label: Option<&'static str>,
}

/// Server → page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    Ready {
        tracker: String,
    },
    Results {
        hands: Vec<HandReport>,
        /// `None` keeps the page's current status text.
        status: Option<String>,
        highlight: bool,
        timestamp: i64,
    },
    Error {
        message: String,
    },
    Pong,
}

impl ServerMessage {
    /// Classify every hand. The status follows the last recognized gesture.
    pub fn results(hands: &[HandObservation], timestamp: i64) -> Self {
        let reports: Vec<HandReport> = hands
            .iter()
            .map(|hand| {
                let gesture = classify(hand);
                HandReport {
                    handedness: hand.handedness,
                    score: hand.score,
                    landmarks: hand.landmarks,
                    gesture,
                    label: gesture.map(|g| g.label()),
                }
            })
            .collect();

        let recognized = reports
            .iter()
            .rev()
            .find_map(|r| r.gesture.map(|g| status_text(r.handedness, g)));

        let (status, highlight) = match recognized {
            Some(text) => (Some(text), true),
            None if reports.is_empty() => (Some(DETECTING_STATUS.to_string()), false),
            None => (None, false),
        };

        Self::Results {
            hands: reports,
            status,
            highlight,
            timestamp,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","message":"serialization failed: {}"}}"#, e)
        })
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
