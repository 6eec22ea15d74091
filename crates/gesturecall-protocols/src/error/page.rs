//! Page automation errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PageError {
    /// A script injected into the page threw.
    #[error("Page script error: {0}")]
    Script(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("Page disconnected")]
    Disconnected,

    #[error("Page operation failed: {0}")]
    Other(String),
}
