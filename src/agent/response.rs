//! Interpretation of a model reply.
//!
//! Structured tool calls always win. Without them the text is scanned for a
//! single inline call wrapped in marker tokens, e.g.
//! `<call>{"name": "list_items", "arguments": {}}</call>`. Anything else is
//! plain text.

use crate::error::InlineParseFailure;
use crate::types::{InferenceResponse, ToolCall};
use serde_json::{Map, Value};
use tracing::warn;

/// Opening and closing tokens around an inline call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineMarkers {
    pub open: String,
    pub close: String,
}

impl InlineMarkers {
    pub fn new(open: &str, close: &str) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }

    /// The text between the first opening marker and the first closing
    /// marker after it, trimmed.
    pub fn extract<'a>(&self, text: &'a str) -> Option<&'a str> {
        let start = text.find(&self.open)? + self.open.len();
        let len = text[start..].find(&self.close)?;
        Some(text[start..start + len].trim())
    }
}

impl Default for InlineMarkers {
    fn default() -> Self {
        Self::new("<call>", "</call>")
    }
}

/// A call recovered from marker text. Arguments are already parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// What the model asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelReply {
    StructuredCalls(Vec<ToolCall>),
    InlineCall(InlineCall),
    PlainText(String),
}

/// Classify a model response.
///
/// A marker payload that fails to parse is logged and the original text is
/// returned as plain text.
pub fn parse_model_response(response: InferenceResponse, markers: &InlineMarkers) -> ModelReply {
    if !response.tool_calls.is_empty() {
        return ModelReply::StructuredCalls(response.tool_calls);
    }

    let content = response.content.unwrap_or_default();
    let Some(payload) = markers.extract(&content) else {
        return ModelReply::PlainText(content);
    };

    match parse_inline_payload(payload) {
        Ok(call) => ModelReply::InlineCall(call),
        Err(e) => {
            warn!("Ignoring malformed inline call ({}): {}", e, payload);
            ModelReply::PlainText(content)
        }
    }
}

/// Parse `{"name": string, "arguments": object}`. `arguments` may be omitted.
pub fn parse_inline_payload(payload: &str) -> Result<InlineCall, InlineParseFailure> {
    let value: Value = serde_json::from_str(payload)?;

    let name = value
        .get("name")
        .and_then(Value::as_str)
        .ok_or(InlineParseFailure::MissingName)?
        .to_string();

    let arguments = match value.get("arguments") {
        None | Some(Value::Null) => Value::Object(Map::new()),
        Some(args @ Value::Object(_)) => args.clone(),
        Some(_) => return Err(InlineParseFailure::ArgumentsNotObject),
    };

    Ok(InlineCall {
        id: format!("inline_{}", ulid::Ulid::new()),
        name,
        arguments,
    })
}
