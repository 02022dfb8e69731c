//! # Wire Payloads
//!
//! Question payloads going out and answer extraction coming in, in the shape
//! the assistant service speaks.
//!
//! The service answers with a `message` event whose argument is usually a
//! JSON-encoded string such as `{"answer": "...", "status": "success", "userID": "..."}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::message::FALLBACK_ANSWER;

/// Event name used for both questions and answers.
pub const MESSAGE_EVENT: &str = "message";

/// Answer fields, checked in this order. The first non-empty string wins.
/// `answer` may also be an object carrying the text under `context`.
pub const ANSWER_FIELDS: [&str; 2] = ["answer", "response"];

/// Outgoing question.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct QuestionPayload {
    #[serde(rename = "userID")]
    pub requester_id: String,
    #[serde(rename = "context")]
    pub question: String,
    /// Client-generated correlation id. Servers that echo it let the client
    /// drop answers meant for a different question.
    #[serde(rename = "requestId")]
    pub request_id: String,
}

/// Decode an inbound payload. String payloads are parsed as JSON; anything
/// else is already structured.
pub fn decode(raw: Value) -> Result<Value, String> {
    match raw {
        Value::String(s) => serde_json::from_str(&s).map_err(|e| format!("malformed answer payload: {e}")),
        other => Ok(other),
    }
}

/// Pick the answer text out of a decoded payload, falling back to
/// [`FALLBACK_ANSWER`] when nothing usable is present.
pub fn answer_text(value: &Value) -> String {
    if let Some(text) = non_empty(value) {
        return text.to_string();
    }

    if let Value::Object(map) = value {
        for field in ANSWER_FIELDS {
            match map.get(field) {
                Some(Value::Object(inner)) if field == "answer" => {
                    if let Some(text) = inner.get("context").and_then(non_empty) {
                        return text.to_string();
                    }
                }
                Some(candidate) => {
                    if let Some(text) = non_empty(candidate) {
                        return text.to_string();
                    }
                }
                None => {}
            }
        }
    }

    FALLBACK_ANSWER.to_string()
}

/// The correlation id an answer echoes back, if any.
pub fn echoed_request_id(raw: &Value) -> Option<String> {
    let decoded;
    let value = match raw {
        Value::String(s) => {
            decoded = serde_json::from_str::<Value>(s).ok()?;
            &decoded
        }
        other => other,
    };
    value
        .get("requestId")
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn non_empty(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.trim().is_empty())
}
