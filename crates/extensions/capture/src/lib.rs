//! Video sources for the detection loop.
//!
//! - [`ReplaySource`]: cycles through a directory of still images
//! - [`WebcamSource`]: a local camera through `nokhwa` (feature `webcam`)
//!
//! Both hand out frames as JPEG data URLs via [`encode`].

pub mod encode;
mod replay;
#[cfg(feature = "webcam")]
mod webcam;

pub use encode::{DEFAULT_JPEG_QUALITY, encode_data_url, fit_to};
pub use replay::ReplaySource;
#[cfg(feature = "webcam")]
pub use webcam::WebcamSource;
