//! Meridian client SDK.
//!
//! A Rust client for the Meridian hosted search/answer service: search
//! with response caching and batched telemetry, plus streaming answer
//! sessions over the service's SSE-shaped answer protocol.
//!
//! ```ignore
//! use meridian::{ClientConfig, MeridianClient};
//! use meridian::models::SearchQuery;
//! use meridian::session::{AskParams, SessionEvents};
//!
//! let client = MeridianClient::new(ClientConfig::new(
//!     "https://cloud.meridian.example/indexes/v1/my-index",
//!     "my-api-key",
//! ))?;
//!
//! let results = client.search(&SearchQuery::term("rust sdk")).await?;
//!
//! let mut session = client.create_answer_session(Vec::new(), SessionEvents::new());
//! let answer = session.ask(AskParams::term("how do I get started?")).await?;
//! ```

pub mod adapters;
pub mod cache;
pub mod client;
pub mod collector;
pub mod config;
pub mod error;
pub mod heartbeat;
pub mod models;
pub mod profile;
pub mod session;
pub mod sse;
pub mod traits;

pub use client::{MeridianClient, SearchOptions};
pub use config::{ClientConfig, TelemetryConfig};
pub use error::{MeridianError, MeridianResult};
pub use profile::Profile;
pub use session::{AnswerSession, AnswerStream, AskParams, SessionEvents};
