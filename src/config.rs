//! Client configuration.

use std::time::Duration;

use crate::error::ValidationError;

/// How often the telemetry queue is flushed regardless of size.
pub const DEFAULT_TELEMETRY_FLUSH_INTERVAL: Duration = Duration::from_secs(5);

/// Queue length at which the telemetry queue flushes immediately.
pub const DEFAULT_TELEMETRY_FLUSH_SIZE: usize = 25;

/// Telemetry batching parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    pub flush_interval: Duration,
    pub flush_size: usize,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            flush_interval: DEFAULT_TELEMETRY_FLUSH_INTERVAL,
            flush_size: DEFAULT_TELEMETRY_FLUSH_SIZE,
        }
    }
}

/// Configuration for a [`crate::client::MeridianClient`].
///
/// Telemetry and caching are on by default, matching the service's
/// expectations; both can be switched off per instance.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base endpoint of the target index, e.g.
    /// `https://cloud.meridian.example/indexes/v1/my-index`.
    pub endpoint: String,
    /// Index api key.
    pub api_key: String,
    /// Telemetry batching; `None` disables collection entirely.
    pub telemetry: Option<TelemetryConfig>,
    /// Whether search responses are cached in memory.
    pub cache_enabled: bool,
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            telemetry: Some(TelemetryConfig::default()),
            cache_enabled: true,
        }
    }

    pub fn without_telemetry(mut self) -> Self {
        self.telemetry = None;
        self
    }

    pub fn with_telemetry(mut self, telemetry: TelemetryConfig) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    pub fn without_cache(mut self) -> Self {
        self.cache_enabled = false;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        if self.endpoint.is_empty() {
            return Err(ValidationError::InvalidConfig {
                message: "endpoint must not be empty".to_string(),
            });
        }
        if self.api_key.is_empty() {
            return Err(ValidationError::InvalidConfig {
                message: "api_key must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// URL of a service route, api key attached.
    pub(crate) fn url(&self, path: &str) -> String {
        format!(
            "{}/{}?api-key={}",
            self.endpoint.trim_end_matches('/'),
            path,
            self.api_key
        )
    }
}
