//! Gesture labels.

use serde::{Deserialize, Serialize};

/// A discrete interpretation of one hand in one frame.
///
/// "No gesture" is represented as `Option::<Gesture>::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gesture {
    /// All five fingers extended.
    OpenPalm,
    /// Only the index finger extended.
    IndexPointing,
    /// Only the thumb extended.
    ThumbUp,
}

impl Gesture {
    /// String representation used in logs and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenPalm => "open_palm",
            Self::IndexPointing => "index_pointing",
            Self::ThumbUp => "thumb_up",
        }
    }

    /// Status text shown in the overlay.
    pub fn label(&self) -> &'static str {
        match self {
            Self::OpenPalm => "Hand raised",
            Self::IndexPointing => "Index finger raised",
            Self::ThumbUp => "Thumb raised",
        }
    }
}

impl std::fmt::Display for Gesture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
