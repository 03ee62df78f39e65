//! Typed answer events decoded from frame payloads.
//!
//! A frame's `data` is a JSON object of the form
//! `{"type": ..., "message": ..., "endOfBlock": ...}` where the shape of
//! `message` depends on `type`. Unrecognized types are ignored rather than
//! failing the stream; malformed payloads produce a frame-local error the
//! session engine logs and skips.

use serde::Deserialize;
use serde_json::Value;

use crate::error::StreamError;
use crate::sse::frames::RawFrame;

/// A decoded answer-stream event.
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerEvent {
    /// Search results backing the answer; opaque to the client.
    Sources(Value),
    /// The server's rewritten form of the submitted query.
    QueryTranslated(String),
    /// Follow-up query suggestions.
    RelatedQueries(Vec<String>),
    /// An incremental slice of the answer text.
    Text { message: String, end_of_block: bool },
}

#[derive(Debug, Deserialize)]
struct FramePayload {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    message: Value,
    #[serde(rename = "endOfBlock", default)]
    end_of_block: bool,
}

/// Decode a frame payload into a typed event.
///
/// Returns `Ok(None)` for event types this client does not know about.
pub fn parse_answer_event(frame: &RawFrame) -> Result<Option<AnswerEvent>, StreamError> {
    let payload: FramePayload =
        serde_json::from_str(&frame.data).map_err(|err| StreamError::InvalidPayload {
            event: frame.event.clone(),
            message: err.to_string(),
        })?;

    match payload.kind.as_str() {
        "sources" => Ok(Some(AnswerEvent::Sources(payload.message))),
        "query-translated" => Ok(Some(AnswerEvent::QueryTranslated(stringify(
            payload.message,
        )))),
        "related-queries" => {
            let queries = parse_related(payload.message).map_err(|message| {
                StreamError::InvalidPayload {
                    event: frame.event.clone(),
                    message,
                }
            })?;
            Ok(Some(AnswerEvent::RelatedQueries(queries)))
        }
        "text" => match payload.message {
            Value::String(message) => Ok(Some(AnswerEvent::Text {
                message,
                end_of_block: payload.end_of_block,
            })),
            other => Err(StreamError::InvalidPayload {
                event: frame.event.clone(),
                message: format!("text message must be a string, got {}", other),
            }),
        },
        _ => Ok(None),
    }
}

/// The translated query arrives either as a plain string or as a query
/// object; either way the session stores its string form.
fn stringify(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Related queries arrive either as a JSON array or as a JSON-encoded
/// string containing one.
fn parse_related(value: Value) -> Result<Vec<String>, String> {
    match value {
        Value::String(encoded) => {
            serde_json::from_str(&encoded).map_err(|err| err.to_string())
        }
        other => serde_json::from_value(other).map_err(|err| err.to_string()),
    }
}
