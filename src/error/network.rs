//! Network-related error types.
//!
//! These errors cover the HTTP leg of every request: connection setup, the
//! status line, and the presence of a body to read.

use std::fmt;

use crate::traits::HttpError;

/// Network-specific error variants.
#[derive(Debug, Clone)]
pub enum NetworkError {
    /// Connection to the server failed.
    ConnectionFailed { message: String },

    /// Request timed out.
    Timeout { message: String },

    /// HTTP status error (non-2xx response).
    HttpStatus { status: u16, message: String },

    /// The response carried no readable body.
    MissingBody,

    /// Request was cancelled.
    Cancelled,

    /// Generic network error.
    Other { message: String },
}

impl NetworkError {
    /// Check if this error is likely transient and can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            NetworkError::ConnectionFailed { .. } => true,
            NetworkError::Timeout { .. } => true,
            NetworkError::HttpStatus { status, .. } => {
                *status >= 500 || *status == 429 || *status == 408
            }
            NetworkError::MissingBody => false,
            NetworkError::Cancelled => false,
            NetworkError::Other { .. } => false,
        }
    }
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkError::ConnectionFailed { message } => {
                write!(f, "Connection failed: {}", message)
            }
            NetworkError::Timeout { message } => {
                write!(f, "Request timed out: {}", message)
            }
            NetworkError::HttpStatus { status, message } => {
                write!(f, "HTTP {}: {}", status, message)
            }
            NetworkError::MissingBody => {
                write!(f, "Response has no readable body")
            }
            NetworkError::Cancelled => {
                write!(f, "Request cancelled")
            }
            NetworkError::Other { message } => {
                write!(f, "Network error: {}", message)
            }
        }
    }
}

impl std::error::Error for NetworkError {}

impl From<HttpError> for NetworkError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::ConnectionFailed(message) => NetworkError::ConnectionFailed { message },
            HttpError::Timeout(message) => NetworkError::Timeout { message },
            HttpError::ServerError { status, message } => {
                NetworkError::HttpStatus { status, message }
            }
            HttpError::Cancelled => NetworkError::Cancelled,
            HttpError::Io(message) => NetworkError::Other { message },
            HttpError::Other(message) => NetworkError::Other { message },
        }
    }
}
