//! Streaming-related error types.
//!
//! Errors raised while consuming an answer stream: frame decoding, payload
//! parsing, and mid-stream read failures. Per-frame decode errors are
//! logged and skipped by the session engine; only read failures terminate a
//! stream.

use std::fmt;

use crate::traits::HttpError;

/// Stream-specific error variants.
#[derive(Debug, Clone)]
pub enum StreamError {
    /// A frame payload was not valid JSON for its event type.
    InvalidPayload { event: String, message: String },

    /// The underlying byte stream failed mid-read.
    ReadFailed { message: String },

    /// The stream was closed by the server with an error.
    ServerClosed { message: String },
}

impl StreamError {
    /// True when the failure is scoped to a single frame and the stream
    /// should keep going.
    pub fn is_frame_local(&self) -> bool {
        matches!(self, StreamError::InvalidPayload { .. })
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::InvalidPayload { event, message } => {
                write!(f, "Invalid payload for '{}' frame: {}", event, message)
            }
            StreamError::ReadFailed { message } => {
                write!(f, "Stream read failed: {}", message)
            }
            StreamError::ServerClosed { message } => {
                write!(f, "Server closed stream: {}", message)
            }
        }
    }
}

impl std::error::Error for StreamError {}

impl From<HttpError> for StreamError {
    fn from(err: HttpError) -> Self {
        StreamError::ReadFailed {
            message: err.to_string(),
        }
    }
}
