//! Unified error handling for the Meridian SDK.
//!
//! This module provides:
//!
//! - **Domain-specific errors**: [`ValidationError`], [`NetworkError`],
//!   [`StreamError`]
//! - **Unified error type**: [`MeridianError`] consolidates all of them
//! - **Result type alias**: [`MeridianResult<T>`] for consistent returns
//!
//! Validation errors are raised synchronously and leave session state
//! untouched. Network and stream errors are recorded on the affected
//! interaction before propagating. Cancellation never surfaces as an error;
//! it is reported only through callbacks and interaction flags.

mod network;
mod stream;
mod validation;

pub use network::NetworkError;
pub use stream::StreamError;
pub use validation::ValidationError;

use std::fmt;

use crate::traits::HttpError;

/// Unified error type for the Meridian SDK.
#[derive(Debug, Clone)]
pub enum MeridianError {
    /// Malformed caller input; raised before any network traffic.
    Validation(ValidationError),

    /// HTTP-level failure (connection, status, missing body).
    Network(NetworkError),

    /// Failure while consuming an answer stream.
    Stream(StreamError),
}

/// Type alias for Results using [`MeridianError`].
pub type MeridianResult<T> = Result<T, MeridianError>;

impl MeridianError {
    /// Check if this error is likely transient and can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            MeridianError::Validation(_) => false,
            MeridianError::Network(err) => err.is_retryable(),
            MeridianError::Stream(err) => !err.is_frame_local(),
        }
    }
}

impl fmt::Display for MeridianError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeridianError::Validation(err) => write!(f, "{}", err),
            MeridianError::Network(err) => write!(f, "{}", err),
            MeridianError::Stream(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for MeridianError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MeridianError::Validation(err) => Some(err),
            MeridianError::Network(err) => Some(err),
            MeridianError::Stream(err) => Some(err),
        }
    }
}

impl From<ValidationError> for MeridianError {
    fn from(err: ValidationError) -> Self {
        MeridianError::Validation(err)
    }
}

impl From<NetworkError> for MeridianError {
    fn from(err: NetworkError) -> Self {
        MeridianError::Network(err)
    }
}

impl From<StreamError> for MeridianError {
    fn from(err: StreamError) -> Self {
        MeridianError::Stream(err)
    }
}

impl From<HttpError> for MeridianError {
    fn from(err: HttpError) -> Self {
        MeridianError::Network(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_unification() {
        let validation: MeridianError = ValidationError::SessionBusy.into();
        let network: MeridianError = NetworkError::MissingBody.into();
        let stream: MeridianError = StreamError::ReadFailed {
            message: "reset".to_string(),
        }
        .into();

        assert!(matches!(validation, MeridianError::Validation(_)));
        assert!(matches!(network, MeridianError::Network(_)));
        assert!(matches!(stream, MeridianError::Stream(_)));
    }

    #[test]
    fn test_validation_never_retryable() {
        let err: MeridianError = ValidationError::NotReady.into();
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_http_error_converts_to_network() {
        let err: MeridianError = HttpError::Timeout("30s".to_string()).into();
        assert!(matches!(
            err,
            MeridianError::Network(NetworkError::Timeout { .. })
        ));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_source_chain() {
        use std::error::Error;
        let err: MeridianError = NetworkError::MissingBody.into();
        assert!(err.source().is_some());
    }
}
