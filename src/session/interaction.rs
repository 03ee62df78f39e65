//! Interaction history for an answer session.
//!
//! An interaction is one query/answer cycle plus its streamed metadata.
//! The store is an insertion-ordered, append-only sequence: indices are
//! assigned at append time and stay valid for the life of the session (the
//! only removal is `pop_last`, used by regeneration, which never shifts
//! surviving entries).

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

/// One query/answer exchange and its streamed metadata.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Interaction {
    /// Client-generated id, unique within the session.
    pub interaction_id: String,
    /// The submitted search term; may be empty.
    pub query: String,
    /// Accumulated answer text; grows monotonically while streaming.
    pub response: String,
    /// Follow-up query suggestions, set at most once.
    pub related_queries: Option<Vec<String>>,
    /// Search results backing the answer, set at most once; opaque.
    pub sources: Option<Value>,
    /// Server-rewritten form of the query, set at most once.
    pub translated_query: Option<String>,
    /// True only after explicit cancellation.
    pub aborted: bool,
    /// True from dispatch until the stream terminates.
    pub loading: bool,
    /// True on unrecoverable transport/stream failure.
    pub error: bool,
    /// Failure detail when `error` is set.
    pub error_message: Option<String>,
}

impl Interaction {
    /// A fresh interaction for a just-dispatched query: loading, with all
    /// streamed fields unset.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            interaction_id: Uuid::new_v4().to_string(),
            query: query.into(),
            response: String::new(),
            related_queries: None,
            sources: None,
            translated_query: None,
            aborted: false,
            loading: true,
            error: false,
            error_message: None,
        }
    }
}

/// Ordered, index-stable interaction sequence.
#[derive(Debug, Default)]
pub struct InteractionStore {
    items: Vec<Interaction>,
}

impl InteractionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an interaction, returning its stable index.
    pub fn append(&mut self, interaction: Interaction) -> usize {
        self.items.push(interaction);
        self.items.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&Interaction> {
        self.items.get(index)
    }

    /// Apply a partial update to the interaction at `index`.
    ///
    /// Returns false if the index was never assigned.
    pub fn update(&mut self, index: usize, apply: impl FnOnce(&mut Interaction)) -> bool {
        match self.items.get_mut(index) {
            Some(interaction) => {
                apply(interaction);
                true
            }
            None => false,
        }
    }

    /// Remove and return the most recent interaction.
    pub fn pop_last(&mut self) -> Option<Interaction> {
        self.items.pop()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Owned copy of the full sequence, handed to observers.
    pub fn snapshot(&self) -> Vec<Interaction> {
        self.items.clone()
    }
}
