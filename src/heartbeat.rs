//! Periodic health pinger.
//!
//! Keeps a deployment warm by hitting the health endpoint on a fixed
//! frequency from a background task. Ping failures are logged and the
//! pinger keeps going; the service treats the beat as best-effort.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::traits::{Headers, HttpClient};

/// Heartbeat parameters.
#[derive(Debug, Clone)]
pub struct HeartBeatConfig {
    /// Full health endpoint URL, api key included.
    pub endpoint: String,
    /// Time between beats.
    pub frequency: Duration,
}

/// Background health pinger.
///
/// `start` replaces any running pinger; `stop` (and drop) aborts the
/// background task.
pub struct HeartBeat {
    config: HeartBeatConfig,
    transport: Arc<dyn HttpClient>,
    handle: Option<JoinHandle<()>>,
}

impl HeartBeat {
    pub fn new(config: HeartBeatConfig, transport: Arc<dyn HttpClient>) -> Self {
        Self {
            config,
            transport,
            handle: None,
        }
    }

    /// Start beating. Must be called within a tokio runtime.
    pub fn start(&mut self) {
        self.stop();

        let endpoint = self.config.endpoint.clone();
        let frequency = self.config.frequency;
        let transport = Arc::clone(&self.transport);

        self.handle = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(frequency);
            interval.tick().await;
            loop {
                interval.tick().await;
                match transport.get(&endpoint, &Headers::new()).await {
                    Ok(response) if response.is_success() => {
                        debug!("heartbeat ok");
                    }
                    Ok(response) => {
                        warn!(status = response.status, "heartbeat rejected");
                    }
                    Err(err) => {
                        warn!(error = %err, "heartbeat failed");
                    }
                }
            }
        }));
    }

    /// Abort the background task, if running.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for HeartBeat {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for HeartBeat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeartBeat")
            .field("endpoint", &self.config.endpoint)
            .field("frequency", &self.config.frequency)
            .field("running", &self.is_running())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockHttpClient, MockResponse};
    use crate::traits::Response;
    use bytes::Bytes;

    fn heartbeat(frequency: Duration, transport: MockHttpClient) -> HeartBeat {
        HeartBeat::new(
            HeartBeatConfig {
                endpoint: "https://cloud.example.com/health?api-key=k".to_string(),
                frequency,
            },
            Arc::new(transport),
        )
    }

    #[tokio::test]
    async fn test_beats_on_frequency() {
        let transport = MockHttpClient::new();
        transport.set_default_response(MockResponse::Success(Response::new(200, Bytes::new())));

        let mut beat = heartbeat(Duration::from_millis(10), transport.clone());
        beat.start();
        assert!(beat.is_running());

        tokio::time::sleep(Duration::from_millis(55)).await;
        beat.stop();

        let beats = transport.recorded_requests().len();
        assert!(beats >= 2, "expected at least 2 beats, saw {}", beats);
        assert!(transport.recorded_requests()[0].url.contains("/health"));
    }

    #[tokio::test]
    async fn test_stop_halts_beats() {
        let transport = MockHttpClient::new();
        transport.set_default_response(MockResponse::Success(Response::new(200, Bytes::new())));

        let mut beat = heartbeat(Duration::from_millis(10), transport.clone());
        beat.start();
        tokio::time::sleep(Duration::from_millis(25)).await;
        beat.stop();
        assert!(!beat.is_running());

        let after_stop = transport.recorded_requests().len();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(transport.recorded_requests().len(), after_stop);
    }

    #[tokio::test]
    async fn test_start_replaces_running_pinger() {
        let transport = MockHttpClient::new();
        transport.set_default_response(MockResponse::Success(Response::new(200, Bytes::new())));

        let mut beat = heartbeat(Duration::from_millis(10), transport);
        beat.start();
        beat.start();
        assert!(beat.is_running());
        beat.stop();
    }

    #[tokio::test]
    async fn test_failures_keep_the_pinger_alive() {
        let transport = MockHttpClient::new();
        transport.set_default_response(MockResponse::Error(
            crate::traits::HttpError::ConnectionFailed("down".to_string()),
        ));

        let mut beat = heartbeat(Duration::from_millis(10), transport.clone());
        beat.start();
        tokio::time::sleep(Duration::from_millis(35)).await;

        assert!(beat.is_running());
        assert!(transport.recorded_requests().len() >= 2);
    }
}
