//! Meridian search client.
//!
//! The client owns everything per-index: the `init` handshake, search with
//! response caching and telemetry capture, heartbeat management, and the
//! construction of answer sessions wired to the same transport and
//! identity.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::OnceCell;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::cache::Cache;
use crate::collector::{Collector, CollectorConfig, DeploymentParams, SearchEvent};
use crate::config::ClientConfig;
use crate::error::{MeridianResult, NetworkError};
use crate::heartbeat::{HeartBeat, HeartBeatConfig};
use crate::models::{Elapsed, InitResponse, Message, SearchQuery, SearchResults};
use crate::profile::Profile;
use crate::session::{
    encode_form, AnswerSession, AnswerSessionConfig, InferenceType, SessionEvents,
};
use crate::adapters::ReqwestHttpClient;
use crate::traits::{Headers, HttpClient, IdentityProvider};

/// Per-call search options.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchOptions {
    /// Bypass the response cache for this call.
    pub fresh: bool,
}

/// Client for one Meridian index.
pub struct MeridianClient {
    /// Instance id, stamped on every search request and telemetry event.
    id: String,
    config: ClientConfig,
    transport: Arc<dyn HttpClient>,
    profile: Arc<Profile>,
    cache: Option<Mutex<Cache<SearchResults>>>,
    collector: Option<Collector>,
    heartbeat: Mutex<Option<HeartBeat>>,
    init: OnceCell<Option<InitResponse>>,
}

impl MeridianClient {
    /// Create a client with the production transport and an ephemeral
    /// profile.
    ///
    /// Must be called within a tokio runtime when telemetry is enabled
    /// (the collector starts its flush task immediately).
    pub fn new(config: ClientConfig) -> MeridianResult<Self> {
        Self::with_transport(config, Arc::new(ReqwestHttpClient::new()))
    }

    /// Create a client over a custom transport.
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn HttpClient>,
    ) -> MeridianResult<Self> {
        Self::build(config, transport, Profile::new())
    }

    /// Create a client with a persisted profile.
    pub fn with_profile(config: ClientConfig, profile: Profile) -> MeridianResult<Self> {
        Self::build(config, Arc::new(ReqwestHttpClient::new()), profile)
    }

    fn build(
        config: ClientConfig,
        transport: Arc<dyn HttpClient>,
        profile: Profile,
    ) -> MeridianResult<Self> {
        config.validate()?;

        let id = Uuid::new_v4().to_string();
        let collector = config.telemetry.as_ref().map(|telemetry| {
            Collector::create(
                CollectorConfig {
                    instance_id: id.clone(),
                    api_key: config.api_key.clone(),
                    flush_interval: telemetry.flush_interval,
                    flush_size: telemetry.flush_size,
                },
                Arc::clone(&transport),
            )
        });
        let cache = config.cache_enabled.then(|| Mutex::new(Cache::new()));

        Ok(Self {
            id,
            config,
            transport,
            profile: Arc::new(profile),
            cache,
            collector,
            heartbeat: Mutex::new(None),
            init: OnceCell::new(),
        })
    }

    /// The stable user id attached to answer requests and telemetry.
    pub fn user_id(&self) -> String {
        self.profile.user_id().to_string()
    }

    /// Run a search against the index.
    ///
    /// Results are cached by serialized query; a repeat query is answered
    /// locally unless [`SearchOptions::fresh`] is set. Every search is
    /// recorded for telemetry (when enabled), cached or not.
    pub async fn search(&self, query: &SearchQuery) -> MeridianResult<SearchResults> {
        self.search_with(query, SearchOptions::default()).await
    }

    /// Run a search with explicit options.
    pub async fn search_with(
        &self,
        query: &SearchQuery,
        options: SearchOptions,
    ) -> MeridianResult<SearchResults> {
        self.ensure_init().await;

        let cache_key = match serde_json::to_string(query) {
            Ok(serialized) => format!("search-{}", serialized),
            Err(err) => {
                return Err(NetworkError::Other {
                    message: format!("unencodable query: {}", err),
                }
                .into())
            }
        };

        let cached_results = if options.fresh {
            None
        } else {
            self.cache
                .as_ref()
                .and_then(|cache| cache.lock().unwrap().get(&cache_key).cloned())
        };

        let cached = cached_results.is_some();
        let (results, round_trip) = match cached_results {
            Some(results) => (results, Duration::ZERO),
            None => {
                let started = Instant::now();
                let mut results = self.fetch_search(query).await?;
                let round_trip = started.elapsed();
                results.elapsed = Some(Elapsed::from_micros(round_trip.as_micros() as u64));

                if let Some(cache) = &self.cache {
                    cache.lock().unwrap().set(cache_key.as_str(), results.clone());
                }
                (results, round_trip)
            }
        };

        if let Some(collector) = &self.collector {
            collector.add(SearchEvent {
                raw_search_string: Some(query.term.clone()),
                query: query.clone(),
                results_count: results.hits.len(),
                round_trip_time_ms: round_trip.as_millis() as u64,
                searched_at: chrono::Utc::now(),
                cached,
            });
        }

        Ok(results)
    }

    /// Create an answer session against this index, sharing the client's
    /// transport and identity.
    pub fn create_answer_session(
        &self,
        initial_messages: Vec<Message>,
        events: SessionEvents,
    ) -> AnswerSession {
        let config = AnswerSessionConfig {
            answer_url: self.config.url("answer"),
            index_endpoint: self.config.endpoint.clone(),
            inference_type: InferenceType::default(),
            initial_messages,
            events,
        };
        AnswerSession::new(
            config,
            Arc::clone(&self.transport),
            Arc::clone(&self.profile) as Arc<dyn IdentityProvider>,
        )
    }

    /// Start (or restart) the heartbeat pinger at `frequency`.
    pub fn start_heartbeat(&self, frequency: Duration) {
        let mut slot = self.heartbeat.lock().unwrap();
        if let Some(beat) = slot.as_mut() {
            beat.stop();
        }
        let mut beat = HeartBeat::new(
            HeartBeatConfig {
                endpoint: self.config.url("health"),
                frequency,
            },
            Arc::clone(&self.transport),
        );
        beat.start();
        *slot = Some(beat);
    }

    /// Stop the heartbeat pinger, if running.
    pub fn stop_heartbeat(&self) {
        if let Some(beat) = self.heartbeat.lock().unwrap().as_mut() {
            beat.stop();
        }
    }

    /// The point of presence serving this index, empty until the init
    /// handshake has completed.
    pub async fn get_pop(&self) -> String {
        match self.ensure_init().await {
            Some(init) => init.pop.clone(),
            None => String::new(),
        }
    }

    /// Run the init handshake once; later calls reuse the outcome.
    ///
    /// A failed handshake degrades the client (no telemetry coordinates,
    /// empty pop) but never fails a search.
    async fn ensure_init(&self) -> Option<&InitResponse> {
        self.init
            .get_or_init(|| async {
                match self.fetch_init().await {
                    Ok(init) => {
                        debug!(deployment_id = %init.deployment_id, "init handshake complete");
                        if let Some(collector) = &self.collector {
                            collector.set_params(DeploymentParams {
                                endpoint: init.collect_url.clone(),
                                deployment_id: init.deployment_id.clone(),
                                index: init.index.clone(),
                            });
                        }
                        Some(init)
                    }
                    Err(err) => {
                        warn!(error = %err, "init handshake failed");
                        None
                    }
                }
            })
            .await
            .as_ref()
    }

    async fn fetch_init(&self) -> MeridianResult<InitResponse> {
        let response = self
            .transport
            .get(&self.config.url("init"), &Headers::new())
            .await?;

        if !response.is_success() {
            return Err(NetworkError::HttpStatus {
                status: response.status,
                message: response.text().unwrap_or_default(),
            }
            .into());
        }

        response.json().map_err(|err| {
            NetworkError::Other {
                message: format!("invalid init response: {}", err),
            }
            .into()
        })
    }

    async fn fetch_search(&self, query: &SearchQuery) -> MeridianResult<SearchResults> {
        let query_json = serde_json::to_string(query).map_err(|err| NetworkError::Other {
            message: format!("unencodable query: {}", err),
        })?;
        let body = encode_form(&[
            ("q", query_json),
            ("version", format!("\"{}\"", env!("CARGO_PKG_VERSION"))),
            ("id", format!("\"{}\"", self.id)),
        ]);

        let mut headers = Headers::new();
        headers.insert(
            "Content-Type".to_string(),
            "application/x-www-form-urlencoded".to_string(),
        );

        let response = self
            .transport
            .post(&self.config.url("search"), &body, &headers)
            .await?;

        if !response.is_success() {
            return Err(NetworkError::HttpStatus {
                status: response.status,
                message: response.text().unwrap_or_default(),
            }
            .into());
        }

        response.json().map_err(|err| {
            NetworkError::Other {
                message: format!("invalid search response: {}", err),
            }
            .into()
        })
    }
}

impl std::fmt::Debug for MeridianClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeridianClient")
            .field("id", &self.id)
            .field("endpoint", &self.config.endpoint)
            .field("cache", &self.cache.is_some())
            .field("telemetry", &self.collector.is_some())
            .finish()
    }
}
