//! Search query and result types.
//!
//! The result document shape belongs to the index, so hits carry their
//! documents as opaque JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How the index matches a query term.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    Fulltext,
    Vector,
    Hybrid,
}

/// A search query as understood by the Meridian service.
///
/// Only `term` is required; everything else is omitted from the wire when
/// unset.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchQuery {
    #[serde(default)]
    pub term: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<SearchMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<String>>,
}

impl SearchQuery {
    /// Query for a plain term with service-side defaults for everything
    /// else.
    pub fn term(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            ..Self::default()
        }
    }
}

/// One matched document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Hit {
    pub id: String,
    pub score: f64,
    pub document: Value,
}

/// Time spent on a search, as reported to callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Elapsed {
    /// Raw duration in microseconds.
    pub raw: u64,
    /// Human-readable form, e.g. "12ms".
    pub formatted: String,
}

impl Elapsed {
    pub fn from_micros(raw: u64) -> Self {
        let formatted = if raw >= 1_000_000 {
            format!("{}s", raw / 1_000_000)
        } else if raw >= 1_000 {
            format!("{}ms", raw / 1_000)
        } else {
            format!("{}μs", raw)
        };
        Self { raw, formatted }
    }
}

/// A search response from the service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SearchResults {
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub hits: Vec<Hit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed: Option<Elapsed>,
}

/// Deployment metadata returned by the `init` handshake.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct InitResponse {
    #[serde(rename = "deploymentID")]
    pub deployment_id: String,
    #[serde(rename = "deploymentDatetime", default)]
    pub deployment_datetime: String,
    #[serde(rename = "collectUrl")]
    pub collect_url: String,
    pub index: String,
    #[serde(default)]
    pub pop: String,
}
