//! Caller-input validation errors.
//!
//! These are raised synchronously, before any network traffic, and never
//! touch session state.

use std::fmt;

/// Validation error variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// `related.how_many` outside the 1-5 range accepted by the service.
    RelatedQueriesLimit { requested: u8 },

    /// A second `ask_stream` was issued while one is already in flight.
    SessionBusy,

    /// Regeneration was requested with no message/interaction history.
    NothingToRegenerate,

    /// Regeneration was requested but the last message is not an
    /// assistant message.
    LastMessageNotAssistant,

    /// `abort_answer` was called before any request was dispatched.
    NotReady,

    /// Malformed client configuration.
    InvalidConfig { message: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::RelatedQueriesLimit { requested } => {
                write!(
                    f,
                    "Related queries: how_many must be between 1 and 5, got {}",
                    requested
                )
            }
            ValidationError::SessionBusy => {
                write!(f, "Session busy: an answer request is already in flight")
            }
            ValidationError::NothingToRegenerate => {
                write!(f, "No message to regenerate")
            }
            ValidationError::LastMessageNotAssistant => {
                write!(f, "Last message is not an assistant message")
            }
            ValidationError::NotReady => {
                write!(f, "Not ready: no answer request has been dispatched")
            }
            ValidationError::InvalidConfig { message } => {
                write!(f, "Invalid configuration: {}", message)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_related_limit_display() {
        let err = ValidationError::RelatedQueriesLimit { requested: 6 };
        assert_eq!(
            err.to_string(),
            "Related queries: how_many must be between 1 and 5, got 6"
        );
    }

    #[test]
    fn test_not_ready_display() {
        assert!(ValidationError::NotReady.to_string().contains("Not ready"));
    }

    #[test]
    fn test_session_busy_display() {
        assert!(ValidationError::SessionBusy
            .to_string()
            .contains("already in flight"));
    }
}
