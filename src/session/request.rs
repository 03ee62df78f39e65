//! Answer request construction.
//!
//! The answer endpoint takes a form-urlencoded POST in which every value is
//! JSON-encoded before percent-encoding, the same scheme the search
//! endpoint uses. Validation of caller input happens here, before anything
//! touches the network.

use serde::Serialize;
use serde_json::Value;

use crate::error::ValidationError;
use crate::models::{Message, SearchQuery};

/// Inference flavor requested from the answer service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InferenceType {
    #[default]
    Documentation,
}

impl InferenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InferenceType::Documentation => "documentation",
        }
    }
}

/// Shape of the related-query suggestions.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RelatedFormat {
    /// Plain search terms.
    Query,
    /// Full natural-language questions.
    #[default]
    Question,
}

/// Request for follow-up query suggestions alongside the answer.
///
/// The service caps `how_many` at 5; values outside 1-5 are rejected
/// client-side before any request is sent.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RelatedConfig {
    pub enabled: bool,
    #[serde(rename = "howMany")]
    pub how_many: u8,
    pub format: RelatedFormat,
}

impl Default for RelatedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            how_many: 3,
            format: RelatedFormat::default(),
        }
    }
}

impl RelatedConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if (1..=5).contains(&self.how_many) {
            Ok(())
        } else {
            Err(ValidationError::RelatedQueriesLimit {
                requested: self.how_many,
            })
        }
    }
}

/// Caller input for one `ask`/`ask_stream` call.
#[derive(Debug, Clone, Default)]
pub struct AskParams {
    /// The search query driving the answer.
    pub query: SearchQuery,
    /// Opaque caller context forwarded to the service.
    pub user_context: Option<Value>,
    /// Opaque caller data forwarded to the service.
    pub user_data: Option<Value>,
    /// Related-query suggestions, off when unset.
    pub related: Option<RelatedConfig>,
}

impl AskParams {
    /// Ask about a plain term.
    pub fn term(term: impl Into<String>) -> Self {
        Self {
            query: SearchQuery::term(term),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(related) = &self.related {
            related.validate()?;
        }
        Ok(())
    }
}

/// Everything that goes into one answer POST body.
#[derive(Debug)]
pub(crate) struct AnswerRequest<'a> {
    pub inference_type: InferenceType,
    pub messages: &'a [Message],
    pub conversation_id: &'a str,
    pub user_id: &'a str,
    /// Opaque identifier of the target search index.
    pub endpoint: &'a str,
    pub interaction_id: &'a str,
    pub params: &'a AskParams,
}

impl AnswerRequest<'_> {
    /// Encode as the service's form scheme: each value JSON-encoded, then
    /// percent-encoded.
    pub fn to_form_body(&self) -> Result<String, serde_json::Error> {
        let mut pairs: Vec<(&str, String)> = vec![
            (
                "type",
                serde_json::to_string(self.inference_type.as_str())?,
            ),
            ("messages", serde_json::to_string(self.messages)?),
            ("query", serde_json::to_string(&self.params.query.term)?),
            ("conversationId", serde_json::to_string(self.conversation_id)?),
            ("userId", serde_json::to_string(self.user_id)?),
            ("endpoint", serde_json::to_string(self.endpoint)?),
            ("searchParams", serde_json::to_string(&self.params.query)?),
            ("interactionId", serde_json::to_string(self.interaction_id)?),
        ];

        if let Some(user_context) = &self.params.user_context {
            pairs.push(("userContext", serde_json::to_string(user_context)?));
        }
        if let Some(user_data) = &self.params.user_data {
            pairs.push(("userData", serde_json::to_string(user_data)?));
        }
        if let Some(related) = &self.params.related {
            pairs.push(("related", serde_json::to_string(related)?));
        }

        Ok(encode_form(&pairs))
    }
}

/// Join pre-serialized values into `key=value&...` with percent-encoding.
pub(crate) fn encode_form(pairs: &[(&str, String)]) -> String {
    pairs
        .iter()
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request<'a>(params: &'a AskParams, messages: &'a [Message]) -> AnswerRequest<'a> {
        AnswerRequest {
            inference_type: InferenceType::Documentation,
            messages,
            conversation_id: "conv-1",
            user_id: "user-1",
            endpoint: "https://cloud.example.com/indexes/idx-1",
            interaction_id: "int-1",
            params,
        }
    }

    #[test]
    fn test_related_bounds() {
        for how_many in 1..=5 {
            let config = RelatedConfig {
                how_many,
                ..RelatedConfig::default()
            };
            assert!(config.validate().is_ok(), "how_many={}", how_many);
        }

        for how_many in [0u8, 6, 200] {
            let config = RelatedConfig {
                how_many,
                ..RelatedConfig::default()
            };
            assert_eq!(
                config.validate(),
                Err(ValidationError::RelatedQueriesLimit {
                    requested: how_many
                })
            );
        }
    }

    #[test]
    fn test_ask_params_validate_passes_without_related() {
        assert!(AskParams::term("hello").validate().is_ok());
    }

    #[test]
    fn test_body_contains_required_keys() {
        let params = AskParams::term("what is meridian");
        let messages = [Message::user("what is meridian")];
        let body = request(&params, &messages).to_form_body().unwrap();

        for key in [
            "type=",
            "messages=",
            "query=",
            "conversationId=",
            "userId=",
            "endpoint=",
            "searchParams=",
            "interactionId=",
        ] {
            assert!(body.contains(key), "missing {} in {}", key, body);
        }
        // Optional keys stay off the wire when unset.
        assert!(!body.contains("related="));
        assert!(!body.contains("userData="));
        assert!(!body.contains("userContext="));
    }

    #[test]
    fn test_values_are_json_then_percent_encoded() {
        let params = AskParams::term("a b");
        let messages: [Message; 0] = [];
        let body = request(&params, &messages).to_form_body().unwrap();

        // "a b" -> "\"a b\"" -> %22a%20b%22
        assert!(body.contains("query=%22a%20b%22"), "{}", body);
    }

    #[test]
    fn test_related_config_on_the_wire() {
        let params = AskParams {
            related: Some(RelatedConfig {
                enabled: true,
                how_many: 5,
                format: RelatedFormat::Query,
            }),
            ..AskParams::term("q")
        };
        let messages: [Message; 0] = [];
        let body = request(&params, &messages).to_form_body().unwrap();

        let related = body
            .split('&')
            .find(|pair| pair.starts_with("related="))
            .expect("related pair");
        let decoded = urlencoding::decode(related.trim_start_matches("related=")).unwrap();
        assert_eq!(
            decoded,
            r#"{"enabled":true,"howMany":5,"format":"query"}"#
        );
    }

    #[test]
    fn test_encode_form_joins_pairs() {
        let body = encode_form(&[
            ("a", "\"1\"".to_string()),
            ("b", "[2]".to_string()),
        ]);
        assert_eq!(body, "a=%221%22&b=%5B2%5D");
    }
}
