//! Relay errors.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RelayError {
    /// The message could not be delivered to its endpoint.
    #[error("Transport failure: {0}")]
    Transport(String),

    /// A frame or stop arrived before the inference context was initialized.
    #[error("Hand detection not initialized")]
    NotInitialized,

    /// A results broadcast found no page eligible to receive it.
    #[error("No valid tabs")]
    NoEligibleRecipients,

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    /// The inference context could not be created.
    #[error("Inference context unavailable: {0}")]
    InferenceUnavailable(String),
}

impl RelayError {
    /// Whether the failure comes from the transport rather than the receiver.
    pub fn is_transport(&self) -> bool {
        matches!(self, RelayError::Transport(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error() {
        let err = RelayError::Transport("mailbox closed".to_string());
        let display = err.to_string();
        assert!(display.contains("Transport failure"));
        assert!(display.contains("mailbox closed"));
        assert!(err.is_transport());
    }

    #[test]
    fn test_not_initialized_error() {
        let err = RelayError::NotInitialized;
        assert_eq!(err.to_string(), "Hand detection not initialized");
        assert!(!err.is_transport());
    }

    #[test]
    fn test_no_eligible_recipients_error() {
        assert_eq!(RelayError::NoEligibleRecipients.to_string(), "No valid tabs");
    }

    #[test]
    fn test_unknown_action_error() {
        let err = RelayError::UnknownAction("getCurrentTabId".to_string());
        assert!(err.to_string().contains("getCurrentTabId"));
    }

    #[test]
    fn test_all_error_variants() {
        let errors = vec![
            RelayError::Transport("a".to_string()),
            RelayError::NotInitialized,
            RelayError::NoEligibleRecipients,
            RelayError::UnknownAction("b".to_string()),
            RelayError::InferenceUnavailable("c".to_string()),
        ];

        for err in errors {
            assert!(!err.to_string().is_empty());
        }
    }
}
