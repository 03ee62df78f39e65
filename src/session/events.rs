//! Session callback registry.
//!
//! Callbacks are plain optional fields set once at construction; dispatch
//! is static and every hook is invoked synchronously from the session's
//! read loop, never batched or debounced. Unset hooks cost nothing.

use serde_json::Value;

use crate::models::Message;
use crate::session::interaction::Interaction;

/// Optional observer hooks for an answer session.
///
/// ```ignore
/// let events = SessionEvents::new()
///     .on_state_change(|state| println!("{} interactions", state.len()))
///     .on_message_change(|messages| render(messages));
/// ```
#[derive(Default)]
pub struct SessionEvents {
    pub on_message_change: Option<Box<dyn Fn(&[Message]) + Send + Sync>>,
    pub on_message_loading: Option<Box<dyn Fn(bool) + Send + Sync>>,
    pub on_answer_aborted: Option<Box<dyn Fn(bool) + Send + Sync>>,
    pub on_source_change: Option<Box<dyn Fn(&Value) + Send + Sync>>,
    pub on_query_translated: Option<Box<dyn Fn(&str) + Send + Sync>>,
    pub on_related_queries: Option<Box<dyn Fn(&[String]) + Send + Sync>>,
    pub on_new_interaction_started: Option<Box<dyn Fn(&str) + Send + Sync>>,
    pub on_state_change: Option<Box<dyn Fn(&[Interaction]) + Send + Sync>>,
}

impl SessionEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_message_change(mut self, f: impl Fn(&[Message]) + Send + Sync + 'static) -> Self {
        self.on_message_change = Some(Box::new(f));
        self
    }

    pub fn on_message_loading(mut self, f: impl Fn(bool) + Send + Sync + 'static) -> Self {
        self.on_message_loading = Some(Box::new(f));
        self
    }

    pub fn on_answer_aborted(mut self, f: impl Fn(bool) + Send + Sync + 'static) -> Self {
        self.on_answer_aborted = Some(Box::new(f));
        self
    }

    pub fn on_source_change(mut self, f: impl Fn(&Value) + Send + Sync + 'static) -> Self {
        self.on_source_change = Some(Box::new(f));
        self
    }

    pub fn on_query_translated(mut self, f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_query_translated = Some(Box::new(f));
        self
    }

    pub fn on_related_queries(mut self, f: impl Fn(&[String]) + Send + Sync + 'static) -> Self {
        self.on_related_queries = Some(Box::new(f));
        self
    }

    pub fn on_new_interaction_started(
        mut self,
        f: impl Fn(&str) + Send + Sync + 'static,
    ) -> Self {
        self.on_new_interaction_started = Some(Box::new(f));
        self
    }

    pub fn on_state_change(mut self, f: impl Fn(&[Interaction]) + Send + Sync + 'static) -> Self {
        self.on_state_change = Some(Box::new(f));
        self
    }

    pub(crate) fn emit_message_change(&self, messages: &[Message]) {
        if let Some(f) = &self.on_message_change {
            f(messages);
        }
    }

    pub(crate) fn emit_message_loading(&self, loading: bool) {
        if let Some(f) = &self.on_message_loading {
            f(loading);
        }
    }

    pub(crate) fn emit_answer_aborted(&self, aborted: bool) {
        if let Some(f) = &self.on_answer_aborted {
            f(aborted);
        }
    }

    pub(crate) fn emit_source_change(&self, sources: &Value) {
        if let Some(f) = &self.on_source_change {
            f(sources);
        }
    }

    pub(crate) fn emit_query_translated(&self, query: &str) {
        if let Some(f) = &self.on_query_translated {
            f(query);
        }
    }

    pub(crate) fn emit_related_queries(&self, queries: &[String]) {
        if let Some(f) = &self.on_related_queries {
            f(queries);
        }
    }

    pub(crate) fn emit_new_interaction_started(&self, interaction_id: &str) {
        if let Some(f) = &self.on_new_interaction_started {
            f(interaction_id);
        }
    }

    pub(crate) fn emit_state_change(&self, state: &[Interaction]) {
        if let Some(f) = &self.on_state_change {
            f(state);
        }
    }
}

impl std::fmt::Debug for SessionEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn set(present: bool) -> &'static str {
            if present {
                "set"
            } else {
                "unset"
            }
        }
        f.debug_struct("SessionEvents")
            .field("on_message_change", &set(self.on_message_change.is_some()))
            .field("on_message_loading", &set(self.on_message_loading.is_some()))
            .field("on_answer_aborted", &set(self.on_answer_aborted.is_some()))
            .field("on_source_change", &set(self.on_source_change.is_some()))
            .field("on_query_translated", &set(self.on_query_translated.is_some()))
            .field("on_related_queries", &set(self.on_related_queries.is_some()))
            .field(
                "on_new_interaction_started",
                &set(self.on_new_interaction_started.is_some()),
            )
            .field("on_state_change", &set(self.on_state_change.is_some()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_unset_hooks_are_noops() {
        let events = SessionEvents::new();
        events.emit_message_loading(true);
        events.emit_answer_aborted(true);
        events.emit_state_change(&[]);
    }

    #[test]
    fn test_set_hooks_fire_synchronously() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let events = SessionEvents::new().on_message_loading(move |loading| {
            assert!(loading);
            counter.fetch_add(1, Ordering::SeqCst);
        });

        events.emit_message_loading(true);
        events.emit_message_loading(true);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_debug_shows_which_hooks_are_set() {
        let events = SessionEvents::new().on_answer_aborted(|_| {});
        let debug = format!("{:?}", events);
        assert!(debug.contains("on_answer_aborted: \"set\""));
        assert!(debug.contains("on_state_change: \"unset\""));
    }
}
