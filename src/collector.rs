//! Search telemetry batching.
//!
//! Search events queue up locally and are shipped to the collect endpoint
//! in batches: immediately once the queue reaches the configured size, and
//! on a fixed interval otherwise. The queue is swapped out synchronously
//! before the POST so new events keep accumulating while a flush is in
//! flight. Delivery is fire-and-forget: failures are logged, never
//! propagated, and never retried.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::models::SearchQuery;
use crate::traits::{Headers, HttpClient};

/// One recorded search, as queued for the collect endpoint.
#[derive(Debug, Clone)]
pub struct SearchEvent {
    pub raw_search_string: Option<String>,
    pub query: SearchQuery,
    pub results_count: usize,
    pub round_trip_time_ms: u64,
    pub searched_at: DateTime<Utc>,
    pub cached: bool,
}

/// Collect-endpoint coordinates, known only after the `init` handshake.
#[derive(Debug, Clone)]
pub struct DeploymentParams {
    pub endpoint: String,
    pub deployment_id: String,
    pub index: String,
}

/// Batching parameters plus the identity stamped on every event.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Client instance id, shared with the search client.
    pub instance_id: String,
    pub api_key: String,
    pub flush_interval: Duration,
    pub flush_size: usize,
}

struct CollectorInner {
    config: CollectorConfig,
    transport: Arc<dyn HttpClient>,
    queue: Mutex<Vec<Value>>,
    params: Mutex<Option<DeploymentParams>>,
}

/// Batching telemetry queue with a periodic background flush.
pub struct Collector {
    inner: Arc<CollectorInner>,
    handle: JoinHandle<()>,
}

impl Collector {
    /// Create the collector and start its periodic flush task.
    ///
    /// Must be called within a tokio runtime.
    pub fn create(config: CollectorConfig, transport: Arc<dyn HttpClient>) -> Self {
        let flush_interval = config.flush_interval;
        let inner = Arc::new(CollectorInner {
            config,
            transport,
            queue: Mutex::new(Vec::new()),
            params: Mutex::new(None),
        });

        let task_inner = Arc::clone(&inner);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(flush_interval);
            interval.tick().await;
            loop {
                interval.tick().await;
                task_inner.flush().await;
            }
        });

        Self { inner, handle }
    }

    /// Record the collect-endpoint coordinates from the init handshake.
    pub fn set_params(&self, params: DeploymentParams) {
        *self.inner.params.lock().unwrap() = Some(params);
    }

    /// Queue one search event; triggers an immediate background flush once
    /// the queue reaches the configured size.
    pub fn add(&self, event: SearchEvent) {
        let params = self.inner.params.lock().unwrap().clone();
        let should_flush = {
            let mut queue = self.inner.queue.lock().unwrap();
            queue.push(self.inner.wire_record(&event, params.as_ref()));
            queue.len() >= self.inner.config.flush_size
        };

        if should_flush {
            let inner = Arc::clone(&self.inner);
            tokio::spawn(async move {
                inner.flush().await;
            });
        }
    }

    /// Number of events waiting to be shipped.
    pub fn pending(&self) -> usize {
        self.inner.queue.lock().unwrap().len()
    }

    /// Ship everything queued so far.
    pub async fn flush(&self) {
        self.inner.flush().await;
    }
}

impl Drop for Collector {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl std::fmt::Debug for Collector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collector")
            .field("pending", &self.pending())
            .finish()
    }
}

impl CollectorInner {
    fn wire_record(&self, event: &SearchEvent, params: Option<&DeploymentParams>) -> Value {
        json!({
            "source": "fe",
            "id": self.config.instance_id,
            "index": params.map(|p| p.index.clone()),
            "deploymentID": params.map(|p| p.deployment_id.clone()),
            "rawSearchString": event.raw_search_string,
            "query": event.query,
            "resultsCount": event.results_count,
            "roundTripTime": event.round_trip_time_ms,
            "cached": event.cached,
            "searchedAt": event.searched_at.to_rfc3339(),
        })
    }

    async fn flush(&self) {
        // Events queued before init completes stay queued until the
        // collect endpoint is known.
        let endpoint = match self.params.lock().unwrap().as_ref() {
            Some(params) => params.endpoint.clone(),
            None => return,
        };

        let batch = {
            let mut queue = self.queue.lock().unwrap();
            if queue.is_empty() {
                return;
            }
            std::mem::take(&mut *queue)
        };

        let body = match serde_json::to_string(&batch) {
            Ok(body) => body,
            Err(err) => {
                error!(error = %err, "failed to serialize telemetry batch");
                return;
            }
        };

        let mut headers = Headers::new();
        headers.insert(
            "Authorization".to_string(),
            format!("Bearer {}", self.config.api_key),
        );
        headers.insert("Content-Type".to_string(), "application/json".to_string());

        match self.transport.post(&endpoint, &body, &headers).await {
            Ok(response) if response.is_success() => {
                debug!(events = batch.len(), "telemetry batch shipped");
            }
            Ok(response) => {
                error!(status = response.status, "telemetry batch rejected");
            }
            Err(err) => {
                error!(error = %err, "telemetry batch failed");
            }
        }
    }
}
