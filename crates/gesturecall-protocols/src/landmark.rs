//! Hand landmark model.
//!
//! Landmarks are produced by the external pose-estimation collaborator and
//! consumed here, never computed. Indices follow the MediaPipe hand model.

use serde::{Deserialize, Serialize};

/// Number of landmarks per detected hand.
pub const LANDMARK_COUNT: usize = 21;

/// Landmark indices (MediaPipe hand landmark convention).
pub mod index {
    pub const WRIST: usize = 0;
    pub const THUMB_CMC: usize = 1;
    pub const THUMB_MCP: usize = 2;
    pub const THUMB_IP: usize = 3;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_FINGER_MCP: usize = 5;
    pub const INDEX_FINGER_PIP: usize = 6;
    pub const INDEX_FINGER_DIP: usize = 7;
    pub const INDEX_FINGER_TIP: usize = 8;
    pub const MIDDLE_FINGER_MCP: usize = 9;
    pub const MIDDLE_FINGER_PIP: usize = 10;
    pub const MIDDLE_FINGER_DIP: usize = 11;
    pub const MIDDLE_FINGER_TIP: usize = 12;
    pub const RING_FINGER_MCP: usize = 13;
    pub const RING_FINGER_PIP: usize = 14;
    pub const RING_FINGER_DIP: usize = 15;
    pub const RING_FINGER_TIP: usize = 16;
    pub const PINKY_MCP: usize = 17;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_DIP: usize = 19;
    pub const PINKY_TIP: usize = 20;

    /// Fingertips, thumb first.
    pub const TIPS: [usize; 5] = [THUMB_TIP, INDEX_FINGER_TIP, MIDDLE_FINGER_TIP, RING_FINGER_TIP, PINKY_TIP];
    /// Middle joints, thumb first (IP for the thumb, PIP for the others).
    pub const PIPS: [usize; 5] = [THUMB_IP, INDEX_FINGER_PIP, MIDDLE_FINGER_PIP, RING_FINGER_PIP, PINKY_PIP];
    /// Base joints, thumb first.
    pub const MCPS: [usize; 5] = [THUMB_MCP, INDEX_FINGER_MCP, MIDDLE_FINGER_MCP, RING_FINGER_MCP, PINKY_MCP];
}

/// Skeleton edges used when drawing a hand.
pub const HAND_CONNECTIONS: [(usize, usize); 21] = [
    (0, 1), (1, 2), (2, 3), (3, 4),
    (0, 5), (5, 6), (6, 7), (7, 8),
    (5, 9), (9, 10), (10, 11), (11, 12),
    (9, 13), (13, 14), (14, 15), (15, 16),
    (13, 17), (0, 17), (17, 18), (18, 19), (19, 20),
];

/// A single normalized keypoint.
///
/// `x` and `y` are normalized to the image width and height; smaller `y` is
/// higher on screen. `z` is depth relative to the wrist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Handedness label assigned by the tracker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum Handedness {
    Left,
    Right,
    #[default]
    Unknown,
}

impl From<String> for Handedness {
    fn from(label: String) -> Self {
        match label.as_str() {
            "Left" => Handedness::Left,
            "Right" => Handedness::Right,
            _ => Handedness::Unknown,
        }
    }
}

impl Handedness {
    /// Human-readable prefix for status text.
    pub fn display_name(&self) -> &'static str {
        match self {
            Handedness::Left => "Left hand",
            // Anything that is not "Left" reads as the right hand.
            Handedness::Right | Handedness::Unknown => "Right hand",
        }
    }
}

/// One detected hand in one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandObservation {
    pub landmarks: [Landmark; LANDMARK_COUNT],
    #[serde(default)]
    pub handedness: Handedness,
    #[serde(default)]
    pub score: f32,
}

impl HandObservation {
    pub fn new(landmarks: [Landmark; LANDMARK_COUNT], handedness: Handedness, score: f32) -> Self {
        Self {
            landmarks,
            handedness,
            score,
        }
    }

    /// Landmark at a MediaPipe index.
    pub fn point(&self, idx: usize) -> &Landmark {
        &self.landmarks[idx]
    }
}

/// Output of one inference cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    #[serde(default)]
    pub hands: Vec<HandObservation>,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl DetectionResult {
    pub fn new(hands: Vec<HandObservation>, timestamp: i64) -> Self {
        Self { hands, timestamp }
    }

    pub fn is_empty(&self) -> bool {
        self.hands.is_empty()
    }
}

#[cfg(test)]
#[path = "landmark_tests.rs"]
mod tests;
