//! Gesture classifier.
//!
//! Maps one hand's landmarks to an optional [`Gesture`]. Pure and stateless.

use gesturecall_protocols::landmark::index;
use gesturecall_protocols::{DetectionResult, Gesture, HandObservation, Handedness, LANDMARK_COUNT, Landmark};

/// Thumb tip must be this much farther from the wrist (horizontally) than
/// the thumb MCP to count as extended.
const THUMB_SPREAD_RATIO: f32 = 1.3;

/// A finger tip must sit above this fraction of its MCP height.
const FINGER_LIFT_RATIO: f32 = 0.9;

/// Per-finger extension state, thumb first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FingerState {
    pub thumb: bool,
    pub index: bool,
    pub middle: bool,
    pub ring: bool,
    pub pinky: bool,
}

impl FingerState {
    pub fn from_landmarks(landmarks: &[Landmark; LANDMARK_COUNT]) -> Self {
        let wrist = landmarks[index::WRIST];
        let thumb_mcp = landmarks[index::THUMB_MCP];
        let thumb_ip = landmarks[index::THUMB_IP];
        let thumb_tip = landmarks[index::THUMB_TIP];

        let spread = (thumb_tip.x - wrist.x).abs() > (thumb_mcp.x - wrist.x).abs() * THUMB_SPREAD_RATIO;
        let thumb = spread && thumb_tip.y < thumb_ip.y;

        let finger = |i: usize| {
            let tip = landmarks[index::TIPS[i]].y;
            let pip = landmarks[index::PIPS[i]].y;
            let mcp = landmarks[index::MCPS[i]].y;
            tip < pip && tip < mcp * FINGER_LIFT_RATIO
        };

        Self {
            thumb,
            index: finger(1),
            middle: finger(2),
            ring: finger(3),
            pinky: finger(4),
        }
    }

    pub fn as_array(&self) -> [bool; 5] {
        [self.thumb, self.index, self.middle, self.ring, self.pinky]
    }

    /// Number of extended fingers.
    pub fn count(&self) -> usize {
        self.as_array().iter().filter(|f| **f).count()
    }

    /// Gesture for this finger pattern, first match wins.
    pub fn gesture(&self) -> Option<Gesture> {
        match self.as_array() {
            [true, true, true, true, true] => Some(Gesture::OpenPalm),
            [false, true, false, false, false] => Some(Gesture::IndexPointing),
            [true, false, false, false, false] => Some(Gesture::ThumbUp),
            _ => None,
        }
    }
}

impl std::fmt::Display for FingerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bits: Vec<&str> = self
            .as_array()
            .iter()
            .map(|up| if *up { "1" } else { "0" })
            .collect();
        write!(f, "[{}]", bits.join(","))
    }
}

pub fn classify_landmarks(landmarks: &[Landmark; LANDMARK_COUNT]) -> Option<Gesture> {
    FingerState::from_landmarks(landmarks).gesture()
}

pub fn classify(hand: &HandObservation) -> Option<Gesture> {
    classify_landmarks(&hand.landmarks)
}

/// Classify every hand of a result, in order.
pub fn classify_result(result: &DetectionResult) -> Vec<(Handedness, Option<Gesture>)> {
    result
        .hands
        .iter()
        .map(|hand| (hand.handedness, classify(hand)))
        .collect()
}

#[cfg(test)]
#[path = "classifier_tests.rs"]
mod tests;
