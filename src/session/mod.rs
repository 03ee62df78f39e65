//! Answer session engine.
//!
//! An [`AnswerSession`] manages one multi-turn conversation with the
//! answer endpoint: it builds and dispatches requests, drives the
//! streaming read loop, feeds frames through the [`crate::sse`] parser,
//! maintains the message and interaction history, and reports progress
//! through the [`SessionEvents`] hooks.
//!
//! Each request moves through `Idle -> Dispatched -> Streaming ->
//! {Completed | Aborted | Errored}`. The per-request machinery (byte
//! stream, cancellation token, decode buffers, interaction index) lives in
//! a per-call `ExecutionContext`; the session itself only holds cross-call
//! state. One request may be in flight per session at a time: a second
//! `ask_stream` while one is running is rejected with a `SessionBusy`
//! validation error rather than tolerated.
//!
//! Cancellation is cooperative and non-destructive: `abort_answer` signals
//! the token captured at dispatch, the read loop unwinds at its next
//! suspension point, and the partially streamed assistant message is kept
//! and marked aborted rather than discarded.
//!
//! # Module structure
//! - `interaction` - the ordered, index-stable interaction store
//! - `events` - the callback registry
//! - `request` - request body construction and caller-input validation

mod events;
mod interaction;
mod request;

pub use events::SessionEvents;
pub use interaction::{Interaction, InteractionStore};
pub use request::{AskParams, InferenceType, RelatedConfig, RelatedFormat};

pub(crate) use request::encode_form;

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use futures_util::stream::{self, Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{MeridianResult, NetworkError, StreamError, ValidationError};
use crate::models::{Message, MessageRole};
use crate::session::request::AnswerRequest;
use crate::sse::{decode_frame, parse_answer_event, AnswerEvent, FrameBuffer, StreamDecoder};
use crate::traits::{ByteStream, Headers, HttpClient, HttpError, IdentityProvider};

/// The produced sequence of an `ask_stream` call: each item is the
/// cumulative answer text after one more `text` frame. Single-pass,
/// non-restartable; terminates on completion or abort, or with an error.
pub type AnswerStream = Pin<Box<dyn Stream<Item = MeridianResult<String>> + Send>>;

/// Wiring an answer session needs from its owner.
pub struct AnswerSessionConfig {
    /// Full answer endpoint URL, api key included.
    pub answer_url: String,
    /// Opaque identifier of the target search index, sent in every body.
    pub index_endpoint: String,
    pub inference_type: InferenceType,
    /// Seed conversation, may be empty.
    pub initial_messages: Vec<Message>,
    pub events: SessionEvents,
}

impl AnswerSessionConfig {
    pub fn new(answer_url: impl Into<String>, index_endpoint: impl Into<String>) -> Self {
        Self {
            answer_url: answer_url.into(),
            index_endpoint: index_endpoint.into(),
            inference_type: InferenceType::default(),
            initial_messages: Vec::new(),
            events: SessionEvents::new(),
        }
    }

    pub fn with_initial_messages(mut self, messages: Vec<Message>) -> Self {
        self.initial_messages = messages;
        self
    }

    pub fn with_events(mut self, events: SessionEvents) -> Self {
        self.events = events;
        self
    }
}

/// A stateful, multi-turn conversational exchange with the answer
/// endpoint.
pub struct AnswerSession {
    conversation_id: String,
    answer_url: String,
    index_endpoint: String,
    inference_type: InferenceType,
    transport: Arc<dyn HttpClient>,
    identity: Arc<dyn IdentityProvider>,
    messages: Arc<Mutex<Vec<Message>>>,
    state: Arc<Mutex<InteractionStore>>,
    events: Arc<SessionEvents>,
    last_params: Option<AskParams>,
    abort_token: Option<CancellationToken>,
    in_flight: Arc<AtomicBool>,
}

impl AnswerSession {
    /// Create a session with a fresh conversation id.
    pub fn new(
        config: AnswerSessionConfig,
        transport: Arc<dyn HttpClient>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            conversation_id: Uuid::new_v4().to_string(),
            answer_url: config.answer_url,
            index_endpoint: config.index_endpoint,
            inference_type: config.inference_type,
            transport,
            identity,
            messages: Arc::new(Mutex::new(config.initial_messages)),
            state: Arc::new(Mutex::new(InteractionStore::new())),
            events: Arc::new(config.events),
            last_params: None,
            abort_token: None,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Stable conversation id, generated at session creation.
    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    /// Snapshot of the conversation so far.
    pub fn messages(&self) -> Vec<Message> {
        self.messages.lock().unwrap().clone()
    }

    /// Snapshot of the interaction history.
    pub fn state(&self) -> Vec<Interaction> {
        self.state.lock().unwrap().snapshot()
    }

    /// Ask a question and stream the answer.
    ///
    /// Appends the user message and a loading interaction, then returns a
    /// lazy stream that issues the HTTP call on first poll and yields the
    /// cumulative answer text after every `text` frame. Validation errors
    /// are returned before any session state changes.
    pub fn ask_stream(&mut self, params: AskParams) -> MeridianResult<AnswerStream> {
        params.validate()?;
        if self.in_flight.load(Ordering::SeqCst) {
            return Err(ValidationError::SessionBusy.into());
        }

        let term = params.query.term.clone();
        let interaction = Interaction::new(&term);
        let interaction_id = interaction.interaction_id.clone();
        debug!(
            conversation_id = %self.conversation_id,
            interaction_id = %interaction_id,
            "dispatching answer request"
        );

        let messages_snapshot = {
            let mut messages = self.messages.lock().unwrap();
            messages.push(Message::user(&term));
            messages.clone()
        };
        let index = self.state.lock().unwrap().append(interaction);
        self.events.emit_new_interaction_started(&interaction_id);
        self.emit_state();

        self.last_params = Some(params.clone());

        let user_id = self.identity.user_id();
        let request = AnswerRequest {
            inference_type: self.inference_type,
            messages: &messages_snapshot,
            conversation_id: &self.conversation_id,
            user_id: &user_id,
            endpoint: &self.index_endpoint,
            interaction_id: &interaction_id,
            params: &params,
        };
        let body = match request.to_form_body() {
            Ok(body) => body,
            Err(err) => {
                // The interaction was already appended; never leave it
                // dangling in the loading state.
                self.state.lock().unwrap().update(index, |i| {
                    i.error = true;
                    i.error_message = Some(err.to_string());
                    i.loading = false;
                });
                self.emit_state();
                return Err(ValidationError::InvalidConfig {
                    message: err.to_string(),
                }
                .into());
            }
        };

        let token = CancellationToken::new();
        self.abort_token = Some(token.clone());
        self.in_flight.store(true, Ordering::SeqCst);

        let cx = ExecutionContext {
            transport: Arc::clone(&self.transport),
            url: self.answer_url.clone(),
            body,
            token,
            messages: Arc::clone(&self.messages),
            state: Arc::clone(&self.state),
            events: Arc::clone(&self.events),
            index,
            decoder: StreamDecoder::new(),
            frames: FrameBuffer::new(),
            ready: VecDeque::new(),
            phase: Phase::Dispatch,
            _guard: FlightGuard(Arc::clone(&self.in_flight)),
        };

        Ok(Box::pin(stream::unfold(cx, |mut cx| async move {
            cx.step().await.map(|item| (item, cx))
        })))
    }

    /// Ask a question and wait for the complete answer.
    ///
    /// Drives [`ask_stream`](Self::ask_stream) to completion, fires
    /// `on_message_change` once at the end, and returns the final
    /// cumulative text (partial if the answer was aborted mid-stream).
    pub async fn ask(&mut self, params: AskParams) -> MeridianResult<String> {
        let mut answer_stream = self.ask_stream(params)?;
        let mut response = String::new();
        while let Some(item) = answer_stream.next().await {
            response = item?;
        }
        drop(answer_stream);

        let messages = self.messages();
        self.events.emit_message_change(&messages);
        Ok(response)
    }

    /// Throw away the last answer and produce a new one for the same
    /// parameters, streaming.
    pub fn regenerate_last_stream(&mut self) -> MeridianResult<AnswerStream> {
        let params = self.prepare_regenerate()?;
        self.ask_stream(params)
    }

    /// Throw away the last answer and produce a new one for the same
    /// parameters.
    pub async fn regenerate_last(&mut self) -> MeridianResult<String> {
        let params = self.prepare_regenerate()?;
        self.ask(params).await
    }

    /// Cancel the in-flight answer request.
    ///
    /// The read loop unwinds at its next suspension point, the partial
    /// answer is kept, and the interaction is marked aborted. Errors if no
    /// request was ever dispatched on this session; cancelling twice, or
    /// after completion, is a no-op.
    pub fn abort_answer(&mut self) -> MeridianResult<()> {
        match &self.abort_token {
            Some(token) => {
                token.cancel();
                Ok(())
            }
            None => Err(ValidationError::NotReady.into()),
        }
    }

    /// Reset the conversation: empty message and interaction history.
    pub fn clear_session(&mut self) {
        self.messages.lock().unwrap().clear();
        self.state.lock().unwrap().clear();
        self.events.emit_message_change(&[]);
        self.events.emit_state_change(&[]);
    }

    /// Pop the last assistant message and interaction ahead of a
    /// regeneration, returning the parameters to re-issue.
    fn prepare_regenerate(&mut self) -> MeridianResult<AskParams> {
        if self.in_flight.load(Ordering::SeqCst) {
            return Err(ValidationError::SessionBusy.into());
        }
        let params = self
            .last_params
            .clone()
            .ok_or(ValidationError::NothingToRegenerate)?;

        {
            let mut messages = self.messages.lock().unwrap();
            match messages.last() {
                None => return Err(ValidationError::NothingToRegenerate.into()),
                Some(last) if last.role != MessageRole::Assistant => {
                    return Err(ValidationError::LastMessageNotAssistant.into())
                }
                Some(_) => {
                    messages.pop();
                }
            }
        }
        if self.state.lock().unwrap().pop_last().is_none() {
            return Err(ValidationError::NothingToRegenerate.into());
        }
        Ok(params)
    }

    fn emit_state(&self) {
        let snapshot = self.state.lock().unwrap().snapshot();
        self.events.emit_state_change(&snapshot);
    }
}

impl std::fmt::Debug for AnswerSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerSession")
            .field("conversation_id", &self.conversation_id)
            .field("messages", &self.messages.lock().unwrap().len())
            .field("interactions", &self.state.lock().unwrap().len())
            .field("in_flight", &self.in_flight.load(Ordering::SeqCst))
            .finish()
    }
}

/// Clears the session's single-flight flag when the per-call context is
/// dropped, whatever the exit path (completion, abort, error, or the
/// caller dropping the stream).
struct FlightGuard(Arc<AtomicBool>);

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

enum Phase {
    /// HTTP call not yet issued.
    Dispatch,
    /// Reading chunks off the response body.
    Streaming(ByteStream),
    /// Stream exhausted; finalize once pending yields are drained.
    Finishing,
    Done,
}

/// Per-call execution state. Built fresh for every `ask_stream` so that
/// two calls never share a buffer, token or interaction index; the only
/// state shared with the session is the message/interaction history behind
/// its locks.
struct ExecutionContext {
    transport: Arc<dyn HttpClient>,
    url: String,
    body: String,
    token: CancellationToken,
    messages: Arc<Mutex<Vec<Message>>>,
    state: Arc<Mutex<InteractionStore>>,
    events: Arc<SessionEvents>,
    /// This call's interaction index, fixed at dispatch.
    index: usize,
    decoder: StreamDecoder,
    frames: FrameBuffer,
    /// Cumulative responses decoded but not yet yielded; one text frame
    /// can arrive per chunk, or many.
    ready: VecDeque<String>,
    phase: Phase,
    _guard: FlightGuard,
}

impl ExecutionContext {
    /// Advance the state machine until the next yield or termination.
    async fn step(&mut self) -> Option<MeridianResult<String>> {
        loop {
            if let Some(response) = self.ready.pop_front() {
                return Some(Ok(response));
            }

            // The current phase is taken out so the arms below can borrow
            // the rest of the context freely; every non-terminal arm puts
            // the next phase back.
            match std::mem::replace(&mut self.phase, Phase::Done) {
                Phase::Dispatch => {
                    let token = self.token.clone();
                    let transport = Arc::clone(&self.transport);
                    let url = self.url.clone();
                    let body = self.body.clone();
                    let headers = form_headers();

                    let sent = tokio::select! {
                        _ = token.cancelled() => {
                            self.finish_aborted();
                            return None;
                        }
                        result = transport.post_stream(&url, &body, &headers) => result,
                    };

                    match sent {
                        Ok(byte_stream) => {
                            self.messages.lock().unwrap().push(Message::assistant(""));
                            self.events.emit_message_loading(true);
                            self.phase = Phase::Streaming(byte_stream);
                        }
                        Err(err) => {
                            let err: NetworkError = err.into();
                            self.finish_errored(err.to_string());
                            return Some(Err(err.into()));
                        }
                    }
                }
                Phase::Streaming(mut byte_stream) => {
                    let token = self.token.clone();
                    let next = tokio::select! {
                        _ = token.cancelled() => {
                            // byte_stream drops here: the reader is
                            // released on the abort path too.
                            self.finish_aborted();
                            return None;
                        }
                        chunk = byte_stream.next() => chunk,
                    };

                    match next {
                        Some(Ok(chunk)) => {
                            let text = self.decoder.decode(&chunk);
                            self.frames.push(&text);
                            self.drain_frames();
                            self.phase = Phase::Streaming(byte_stream);
                        }
                        Some(Err(HttpError::Cancelled)) => {
                            // A transport may surface cancellation itself;
                            // same non-destructive path as the token.
                            self.finish_aborted();
                            return None;
                        }
                        Some(Err(err)) => {
                            let err: StreamError = err.into();
                            self.finish_errored(err.to_string());
                            return Some(Err(err.into()));
                        }
                        None => {
                            let tail = self.decoder.finish();
                            if !tail.is_empty() {
                                self.frames.push(&tail);
                            }
                            self.drain_frames();
                            self.phase = Phase::Finishing;
                        }
                    }
                }
                Phase::Finishing => {
                    self.finish_completed();
                    return None;
                }
                Phase::Done => return None,
            }
        }
    }

    /// Pull every complete frame out of the buffer and dispatch it.
    /// Decode failures are frame-local: logged and skipped.
    fn drain_frames(&mut self) {
        while let Some(frame) = self.frames.next_frame() {
            let raw = decode_frame(&frame);
            match parse_answer_event(&raw) {
                Ok(Some(event)) => self.dispatch_event(event),
                Ok(None) => {
                    debug!(event = %raw.event, "ignoring unrecognized answer event");
                }
                Err(err) => {
                    warn!(error = %err, "skipping undecodable frame");
                }
            }
        }
    }

    fn dispatch_event(&mut self, event: AnswerEvent) {
        match event {
            AnswerEvent::Sources(sources) => {
                self.state
                    .lock()
                    .unwrap()
                    .update(self.index, |i| i.sources = Some(sources.clone()));
                self.events.emit_source_change(&sources);
            }
            AnswerEvent::QueryTranslated(query) => {
                self.state
                    .lock()
                    .unwrap()
                    .update(self.index, |i| i.translated_query = Some(query.clone()));
                self.events.emit_query_translated(&query);
            }
            AnswerEvent::RelatedQueries(queries) => {
                self.state
                    .lock()
                    .unwrap()
                    .update(self.index, |i| i.related_queries = Some(queries.clone()));
                self.events.emit_related_queries(&queries);
            }
            AnswerEvent::Text { message, .. } => {
                let cumulative = {
                    let mut state = self.state.lock().unwrap();
                    state.update(self.index, |i| i.response.push_str(&message));
                    state
                        .get(self.index)
                        .map(|i| i.response.clone())
                        .unwrap_or_default()
                };
                let messages_snapshot = {
                    let mut messages = self.messages.lock().unwrap();
                    if let Some(last) = messages.last_mut() {
                        if last.role == MessageRole::Assistant {
                            last.content.push_str(&message);
                        }
                    }
                    messages.clone()
                };
                self.events.emit_message_change(&messages_snapshot);
                self.ready.push_back(cumulative);
            }
        }
        self.emit_state();
    }

    fn finish_completed(&mut self) {
        self.state
            .lock()
            .unwrap()
            .update(self.index, |i| i.loading = false);
        self.emit_state();
        self.events.emit_message_loading(false);
        self.phase = Phase::Done;
        debug!("answer stream completed");
    }

    fn finish_aborted(&mut self) {
        self.state.lock().unwrap().update(self.index, |i| {
            i.aborted = true;
            i.loading = false;
        });
        self.events.emit_answer_aborted(true);
        self.emit_state();
        self.events.emit_message_loading(false);
        self.phase = Phase::Done;
        debug!("answer stream aborted");
    }

    fn finish_errored(&mut self, message: String) {
        self.state.lock().unwrap().update(self.index, |i| {
            i.error = true;
            i.error_message = Some(message.clone());
            i.loading = false;
        });
        self.emit_state();
        self.events.emit_message_loading(false);
        self.phase = Phase::Done;
        warn!(error = %message, "answer stream failed");
    }

    fn emit_state(&self) {
        let snapshot = self.state.lock().unwrap().snapshot();
        self.events.emit_state_change(&snapshot);
    }
}

fn form_headers() -> Headers {
    let mut headers = Headers::new();
    headers.insert(
        "Content-Type".to_string(),
        "application/x-www-form-urlencoded".to_string(),
    );
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{FixedIdentity, MockHttpClient};
    use crate::error::MeridianError;

    fn session_with(transport: MockHttpClient) -> AnswerSession {
        AnswerSession::new(
            AnswerSessionConfig::new(
                "https://cloud.example.com/answer?api-key=k",
                "https://cloud.example.com/indexes/idx-1",
            ),
            Arc::new(transport),
            Arc::new(FixedIdentity::new("user-1")),
        )
    }

    #[test]
    fn test_new_session_has_stable_conversation_id() {
        let session = session_with(MockHttpClient::new());
        let id = session.conversation_id().to_string();
        assert!(!id.is_empty());
        assert_eq!(session.conversation_id(), id);
        assert!(session.messages().is_empty());
        assert!(session.state().is_empty());
    }

    #[test]
    fn test_seed_messages_are_kept() {
        let transport = MockHttpClient::new();
        let session = AnswerSession::new(
            AnswerSessionConfig::new("https://c.example.com/answer", "idx")
                .with_initial_messages(vec![Message::user("hi"), Message::assistant("hello")]),
            Arc::new(transport),
            Arc::new(FixedIdentity::new("user-1")),
        );
        assert_eq!(session.messages().len(), 2);
    }

    #[test]
    fn test_abort_before_any_dispatch_is_not_ready() {
        let mut session = session_with(MockHttpClient::new());
        let err = session.abort_answer().unwrap_err();
        assert!(matches!(
            err,
            MeridianError::Validation(ValidationError::NotReady)
        ));
    }

    #[test]
    fn test_invalid_related_rejected_before_any_request() {
        let transport = MockHttpClient::new();
        let spy = transport.clone();
        let mut session = session_with(transport);

        let params = AskParams {
            related: Some(RelatedConfig {
                how_many: 6,
                ..RelatedConfig::default()
            }),
            ..AskParams::term("q")
        };
        let Err(err) = session.ask_stream(params) else {
            panic!("expected ask_stream to reject an over-limit related config");
        };
        assert!(matches!(
            err,
            MeridianError::Validation(ValidationError::RelatedQueriesLimit { requested: 6 })
        ));
        // No state was touched and nothing went out.
        assert!(session.messages().is_empty());
        assert!(session.state().is_empty());
        assert!(spy.recorded_requests().is_empty());
    }

    #[test]
    fn test_clear_session_is_idempotent() {
        let mut session = session_with(MockHttpClient::new());
        session.clear_session();
        session.clear_session();
        assert!(session.messages().is_empty());
        assert!(session.state().is_empty());
    }

    #[test]
    fn test_regenerate_with_empty_history_fails() {
        let mut session = session_with(MockHttpClient::new());
        let Err(err) = session.regenerate_last_stream() else {
            panic!("expected regenerate with empty history to fail");
        };
        assert!(matches!(
            err,
            MeridianError::Validation(ValidationError::NothingToRegenerate)
        ));
    }
}
