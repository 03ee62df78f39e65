//! Shared helpers for integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use meridian::adapters::mock::{FixedIdentity, MockHttpClient};
use meridian::models::Message;
use meridian::session::{AnswerSession, AnswerSessionConfig, Interaction, SessionEvents};

pub const ANSWER_URL: &str = "https://cloud.example.com/indexes/idx-1/answer?api-key=k1";
pub const INDEX_ENDPOINT: &str = "https://cloud.example.com/indexes/idx-1";

/// One protocol frame carrying a `text` event.
pub fn text_frame(message: &str) -> String {
    format!(
        "event: message\ndata: {}\n\n",
        serde_json::json!({ "type": "text", "message": message })
    )
}

/// One protocol frame of an arbitrary event type.
pub fn frame(kind: &str, message: serde_json::Value) -> String {
    format!(
        "event: message\ndata: {}\n\n",
        serde_json::json!({ "type": kind, "message": message })
    )
}

/// Callback counters shared between a test and its session.
#[derive(Default)]
pub struct Recorded {
    pub state_changes: AtomicUsize,
    pub aborted_calls: AtomicUsize,
    pub loading_calls: Mutex<Vec<bool>>,
    pub message_snapshots: Mutex<Vec<Vec<Message>>>,
    pub new_interactions: Mutex<Vec<String>>,
    pub last_state: Mutex<Vec<Interaction>>,
    pub sources_seen: AtomicUsize,
    pub translated: Mutex<Vec<String>>,
    pub related: Mutex<Vec<Vec<String>>>,
}

impl Recorded {
    pub fn state_change_count(&self) -> usize {
        self.state_changes.load(Ordering::SeqCst)
    }

    pub fn aborted_count(&self) -> usize {
        self.aborted_calls.load(Ordering::SeqCst)
    }
}

/// Build a session over `transport` with every hook wired to `recorded`.
pub fn recording_session(
    transport: MockHttpClient,
    recorded: Arc<Recorded>,
) -> AnswerSession {
    let events = {
        let r = Arc::clone(&recorded);
        let events = SessionEvents::new().on_state_change(move |state| {
            r.state_changes.fetch_add(1, Ordering::SeqCst);
            *r.last_state.lock().unwrap() = state.to_vec();
        });
        let r = Arc::clone(&recorded);
        let events = events.on_answer_aborted(move |aborted| {
            assert!(aborted);
            r.aborted_calls.fetch_add(1, Ordering::SeqCst);
        });
        let r = Arc::clone(&recorded);
        let events = events.on_message_loading(move |loading| {
            r.loading_calls.lock().unwrap().push(loading);
        });
        let r = Arc::clone(&recorded);
        let events = events.on_message_change(move |messages| {
            r.message_snapshots.lock().unwrap().push(messages.to_vec());
        });
        let r = Arc::clone(&recorded);
        let events = events.on_new_interaction_started(move |id| {
            r.new_interactions.lock().unwrap().push(id.to_string());
        });
        let r = Arc::clone(&recorded);
        let events = events.on_source_change(move |_| {
            r.sources_seen.fetch_add(1, Ordering::SeqCst);
        });
        let r = Arc::clone(&recorded);
        let events = events.on_query_translated(move |query| {
            r.translated.lock().unwrap().push(query.to_string());
        });
        let r = Arc::clone(&recorded);
        events.on_related_queries(move |queries| {
            r.related.lock().unwrap().push(queries.to_vec());
        })
    };

    AnswerSession::new(
        AnswerSessionConfig::new(ANSWER_URL, INDEX_ENDPOINT).with_events(events),
        Arc::new(transport),
        Arc::new(FixedIdentity::new("user-1")),
    )
}

/// Build a plain session with no hooks.
pub fn plain_session(transport: MockHttpClient) -> AnswerSession {
    AnswerSession::new(
        AnswerSessionConfig::new(ANSWER_URL, INDEX_ENDPOINT),
        Arc::new(transport),
        Arc::new(FixedIdentity::new("user-1")),
    )
}
