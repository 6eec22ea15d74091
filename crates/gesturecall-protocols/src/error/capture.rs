//! Video capture errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    /// The camera could not be acquired (missing device, permission denied).
    #[error("Camera unavailable: {0}")]
    Unavailable(String),

    #[error("Frame capture failed: {0}")]
    FrameFailed(String),

    #[error("Frame encoding failed: {0}")]
    EncodeFailed(String),

    /// The stream was already released.
    #[error("Video stream released")]
    Released,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_error() {
        let err = CaptureError::Unavailable("no device at index 0".to_string());
        let display = err.to_string();
        assert!(display.contains("Camera unavailable"));
        assert!(display.contains("index 0"));
    }

    #[test]
    fn test_frame_failed_error() {
        let err = CaptureError::FrameFailed("decode".to_string());
        assert!(err.to_string().contains("decode"));
    }

    #[test]
    fn test_released_error() {
        assert!(CaptureError::Released.to_string().contains("released"));
    }
}
