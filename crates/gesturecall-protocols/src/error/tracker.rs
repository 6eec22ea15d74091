//! Hand tracker errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Hand tracker not initialized")]
    NotInitialized,

    #[error("Failed to launch hand tracker: {0}")]
    LaunchFailed(String),

    /// The tracker answered with something that is not a detection result.
    #[error("Tracker protocol error: {0}")]
    Protocol(String),

    /// The tracker reported an inference failure for a frame.
    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Hand tracker closed")]
    Closed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_failed_error() {
        let err = TrackerError::LaunchFailed("python3 not found".to_string());
        assert!(err.to_string().contains("python3 not found"));
    }

    #[test]
    fn test_protocol_error() {
        let err = TrackerError::Protocol("expected object".to_string());
        assert!(err.to_string().contains("protocol"));
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err = TrackerError::from(io_err);
        assert!(err.to_string().contains("pipe closed"));
    }
}
