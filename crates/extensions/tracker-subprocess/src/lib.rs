//! Hand tracker backed by an external process.
//!
//! The process speaks one JSON object per line on stdin/stdout:
//!
//! ```text
//! -> {"configure": {"maxNumHands": 2, ...}}
//! <- {"ok": true}
//! -> {"image": "data:image/jpeg;base64,..."}
//! <- {"hands": [{"landmarks": [{"x":..,"y":..,"z":..}, ...], "handedness": "Right", "score": 0.97}]}
//! <- {"error": "model not loaded"}
//! ```
//!
//! Anything that loads a MediaPipe-style hand model can sit behind it.

mod factory;
mod transport;
mod wire;

pub use factory::{SubprocessTracker, SubprocessTrackerFactory, TrackerCommand};
pub use transport::StdioTransport;
pub use wire::{TrackerReply, TrackerRequest};
