//! Single-turn tool dispatch.
//!
//! One query goes through:
//! 1. Build a one-message conversation from the user's text
//! 2. Call the model with the full tool catalogue
//! 3. Classify the reply (structured calls, inline call, plain text)
//! 4. Execute the requested calls one after another, in request order
//! 5. Render every outcome into a single text answer
//!
//! Nothing escapes `process_query` as an error: transport failures and
//! per-call failures are both rendered as `Error: ...` text.

use crate::agent::response::{parse_model_response, InlineMarkers, ModelReply};
use crate::error::{ToolError, ToolResult};
use crate::inference::ModelClient;
use crate::tools::ToolRegistry;
use crate::types::{CallState, ChatMessage, ToolCall};
use anyhow::Result;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Returned when the model produced neither calls nor text.
pub const NO_RESPONSE: &str = "No response from assistant";

/// Outcome of one tool call within a dispatch cycle.
#[derive(Debug)]
pub struct ToolCallResult {
    pub call_id: String,
    pub name: String,
    pub outcome: ToolResult<Value>,
}

impl ToolCallResult {
    /// `Result from {name}:\n{payload}` or `Error: {reason}`.
    pub fn render(&self) -> String {
        match &self.outcome {
            Ok(payload) => format!("Result from {}:\n{}", self.name, pretty(payload)),
            Err(e) => format!("Error: {}", e),
        }
    }

    /// Rendering used for the inline-call fallback.
    pub fn render_inline(&self) -> String {
        match &self.outcome {
            Ok(payload) => format!(
                "I called {} for you. Here are the results:\n\n{}",
                self.name,
                pretty(payload)
            ),
            Err(e) => format!("Error: {}", e),
        }
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Join rendered results with a blank line, preserving call order.
pub fn aggregate(results: &[ToolCallResult]) -> String {
    results
        .iter()
        .map(ToolCallResult::render)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Arguments as they arrive from the two reply paths.
enum CallArguments<'a> {
    /// JSON-encoded string from a structured call.
    Encoded(&'a str),
    /// Already parsed from an inline call.
    Parsed(&'a Value),
}

impl CallArguments<'_> {
    fn decode(&self, name: &str) -> ToolResult<Value> {
        match self {
            Self::Encoded(raw) if raw.trim().is_empty() => Ok(Value::Object(Map::new())),
            Self::Encoded(raw) => {
                let value: Value =
                    serde_json::from_str(raw).map_err(|e| ToolError::MalformedArguments {
                        name: name.to_string(),
                        reason: e.to_string(),
                    })?;
                if value.is_object() {
                    Ok(value)
                } else {
                    Err(ToolError::MalformedArguments {
                        name: name.to_string(),
                        reason: "arguments must be a JSON object".into(),
                    })
                }
            }
            Self::Parsed(value) => Ok((*value).clone()),
        }
    }
}

/// Sends a query to the model and executes the tools it asks for.
pub struct Dispatcher {
    model: Arc<dyn ModelClient>,
    registry: Arc<ToolRegistry>,
    markers: InlineMarkers,
}

impl Dispatcher {
    pub fn new(model: Arc<dyn ModelClient>, registry: Arc<ToolRegistry>) -> Self {
        Self {
            model,
            registry,
            markers: InlineMarkers::default(),
        }
    }

    pub fn with_markers(mut self, markers: InlineMarkers) -> Self {
        self.markers = markers;
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Process one user query to a final text answer. Never fails.
    pub async fn process_query(&self, text: &str) -> String {
        match self.dispatch(text).await {
            Ok(answer) => answer,
            Err(e) => {
                error!("Inference error: {:#}", e);
                format!("Error: {:#}", e)
            }
        }
    }

    async fn dispatch(&self, text: &str) -> Result<String> {
        let messages = vec![ChatMessage::user(text)];
        let tools = self.registry.describe_all();

        let response = self.model.complete(&messages, &tools).await?;
        debug!(
            "Model reply: {} tool call(s), {} tokens",
            response.tool_calls.len(),
            response.usage.total_tokens
        );

        let answer = match parse_model_response(response, &self.markers) {
            ModelReply::StructuredCalls(calls) => {
                let results = self.run_structured(&calls).await;
                aggregate(&results)
            }
            ModelReply::InlineCall(call) => {
                info!("Model used inline call syntax for '{}'", call.name);
                let result = self
                    .run_call(&call.id, &call.name, CallArguments::Parsed(&call.arguments))
                    .await;
                result.render_inline()
            }
            ModelReply::PlainText(text) if text.is_empty() => NO_RESPONSE.to_string(),
            ModelReply::PlainText(text) => text,
        };

        Ok(answer)
    }

    /// Execute structured calls sequentially. A failed call never stops the
    /// calls after it.
    pub async fn run_structured(&self, calls: &[ToolCall]) -> Vec<ToolCallResult> {
        let mut results = Vec::with_capacity(calls.len());
        for tc in calls {
            let result = self
                .run_call(&tc.id, &tc.name, CallArguments::Encoded(&tc.arguments))
                .await;
            results.push(result);
        }
        results
    }

    async fn run_call(&self, id: &str, name: &str, args: CallArguments<'_>) -> ToolCallResult {
        let mut state = CallState::Pending;
        let outcome = self.drive(id, name, &args, &mut state).await;

        let terminal = if outcome.is_ok() {
            CallState::Succeeded
        } else {
            CallState::Failed
        };
        advance(&mut state, terminal, id, name);

        match &outcome {
            Ok(payload) => info!("Tool {} succeeded ({} bytes)", name, payload.to_string().len()),
            Err(e) => warn!("Tool {} failed: {}", name, e),
        }

        ToolCallResult {
            call_id: id.to_string(),
            name: name.to_string(),
            outcome,
        }
    }

    async fn drive(
        &self,
        id: &str,
        name: &str,
        args: &CallArguments<'_>,
        state: &mut CallState,
    ) -> ToolResult<Value> {
        advance(state, CallState::Resolving, id, name);
        let tool = self.registry.resolve(name)?;
        let args = args.decode(name)?;

        advance(state, CallState::Executing, id, name);
        info!("Tool: {}({})", name, args);
        tool.call(&args).await
    }
}

/// A call leaves a terminal state never; there are no retries.
fn advance(state: &mut CallState, next: CallState, id: &str, name: &str) {
    debug_assert!(
        !state.is_terminal(),
        "call {} already finished as {}",
        id,
        state
    );
    debug!("[{}] {} {} -> {}", id, name, state, next);
    *state = next;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::MemoryStore;
    use crate::tools::item_registry;
    use crate::tools::traits::ToolDefinition;
    use crate::types::{InferenceResponse, Item};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Model that replays a canned response and records what it was sent.
    struct ScriptedModel {
        reply: Mutex<Option<Result<InferenceResponse>>>,
        seen: Mutex<Vec<(Vec<ChatMessage>, Vec<String>)>>,
    }

    impl ScriptedModel {
        fn replying(reply: Result<InferenceResponse>) -> Arc<Self> {
            Arc::new(Self {
                reply: Mutex::new(Some(reply)),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn text(content: &str) -> Arc<Self> {
            Self::replying(Ok(InferenceResponse {
                content: Some(content.into()),
                ..InferenceResponse::default()
            }))
        }

        fn calls(calls: &[(&str, &str)]) -> Arc<Self> {
            let tool_calls = calls
                .iter()
                .enumerate()
                .map(|(i, (name, args))| ToolCall {
                    id: format!("call_{}", i),
                    name: name.to_string(),
                    arguments: args.to_string(),
                })
                .collect();
            Self::replying(Ok(InferenceResponse {
                content: None,
                tool_calls,
                ..InferenceResponse::default()
            }))
        }
    }

    #[async_trait]
    impl ModelClient for ScriptedModel {
        async fn complete(
            &self,
            messages: &[ChatMessage],
            tools: &[ToolDefinition],
        ) -> Result<InferenceResponse> {
            self.seen.lock().unwrap().push((
                messages.to_vec(),
                tools.iter().map(|t| t.name.clone()).collect(),
            ));
            self.reply
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Ok(InferenceResponse::default()))
        }
    }

    fn store() -> Arc<MemoryStore> {
        Arc::new(MemoryStore::with_items(vec![
            Item {
                id: 1,
                name: "Ana".into(),
                age: 30,
            },
            Item {
                id: 2,
                name: "Rui".into(),
                age: 41,
            },
        ]))
    }

    fn dispatcher(model: Arc<ScriptedModel>) -> Dispatcher {
        let registry = item_registry(store()).unwrap();
        Dispatcher::new(model, Arc::new(registry))
    }

    #[tokio::test]
    async fn sends_single_user_turn_with_full_catalogue() {
        let model = ScriptedModel::text("ok");
        let d = dispatcher(model.clone());
        d.process_query("list everything").await;

        let seen = model.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, vec![ChatMessage::user("list everything")]);
        assert_eq!(
            seen[0].1,
            vec!["list_items", "get_item", "create_item", "update_item", "delete_item"]
        );
    }

    #[tokio::test]
    async fn structured_call_renders_payload() {
        let d = dispatcher(ScriptedModel::calls(&[("get_item", r#"{"item_id": 2}"#)]));
        let out = d.process_query("show item 2").await;
        assert_eq!(
            out,
            "Result from get_item:\n{\n  \"id\": 2,\n  \"nome\": \"Rui\",\n  \"idade\": 41\n}"
        );
    }

    #[tokio::test]
    async fn unknown_tool_does_not_block_siblings() {
        let d = dispatcher(ScriptedModel::calls(&[
            ("drop_table", "{}"),
            ("list_items", "{}"),
        ]));
        let out = d.process_query("do things").await;
        let parts: Vec<&str> = out.split("\n\n").collect();
        assert_eq!(parts[0], "Error: Function drop_table not found");
        assert!(parts[1].starts_with("Result from list_items:\n["));
    }

    #[tokio::test]
    async fn results_keep_call_order_and_failures_are_local() {
        let d = dispatcher(ScriptedModel::calls(&[
            ("create_item", r#"{"nome": "A", "idade": 1}"#),
            ("delete_item", r#"{"item_id": 999}"#),
        ]));
        let out = d.process_query("add A then remove 999").await;

        let create_at = out.find("Result from create_item:").unwrap();
        let delete_at = out.find("Error: Item 999 not found").unwrap();
        assert!(create_at < delete_at);
        assert!(out.contains("\"nome\": \"A\"\n}\n\nError: Item 999 not found"));
    }

    #[tokio::test]
    async fn malformed_arguments_are_reported_per_call() {
        let d = dispatcher(ScriptedModel::calls(&[
            ("get_item", "{item_id: 1"),
            ("get_item", "[1]"),
            ("get_item", r#"{"item_id": "one"}"#),
            ("list_items", ""),
        ]));
        let out = d.process_query("?").await;
        let parts: Vec<&str> = out.split("\n\n").collect();
        assert!(parts[0].starts_with("Error: Malformed arguments for get_item"));
        assert_eq!(
            parts[1],
            "Error: Malformed arguments for get_item: arguments must be a JSON object"
        );
        assert!(parts[2].starts_with("Error: Invalid arguments for get_item"));
        assert!(parts[3].starts_with("Result from list_items:"));
    }

    #[tokio::test]
    async fn plain_text_is_returned_unchanged() {
        let text = "There are two items: Ana and Rui.";
        let d = dispatcher(ScriptedModel::text(text));
        assert_eq!(d.process_query("who is there?").await, text);
    }

    #[tokio::test]
    async fn empty_reply_yields_placeholder() {
        let d = dispatcher(ScriptedModel::replying(Ok(InferenceResponse::default())));
        assert_eq!(d.process_query("hello").await, NO_RESPONSE);
    }

    #[tokio::test]
    async fn malformed_inline_call_returns_original_text() {
        let text = "Let me think... <call>{\"name\": list_items}</call>";
        let d = dispatcher(ScriptedModel::text(text));
        assert_eq!(d.process_query("list").await, text);
    }

    #[tokio::test]
    async fn inline_call_is_executed() {
        let d = dispatcher(ScriptedModel::text(
            r#"<call>{"name":"list_items","arguments":{}}</call>"#,
        ));
        let out = d.process_query("list").await;
        assert!(out.starts_with("I called list_items for you."));
        assert!(out.contains("Here are the results:\n\n[\n  {\n    \"id\": 1,"));
    }

    #[tokio::test]
    async fn inline_call_to_unknown_tool_is_an_error() {
        let d = dispatcher(ScriptedModel::text(
            r#"<call>{"name":"purge","arguments":{}}</call>"#,
        ));
        assert_eq!(d.process_query("purge").await, "Error: Function purge not found");
    }

    #[tokio::test]
    async fn custom_markers_are_honoured() {
        let d = dispatcher(ScriptedModel::text(
            r#"<tool_call>{"name":"get_item","arguments":{"item_id":1}}</tool_call>"#,
        ))
        .with_markers(InlineMarkers::new("<tool_call>", "</tool_call>"));
        let out = d.process_query("item 1").await;
        assert!(out.starts_with("I called get_item for you."));
    }

    #[tokio::test]
    async fn transport_failure_becomes_text() {
        let d = dispatcher(ScriptedModel::replying(Err(anyhow::anyhow!(
            "Inference request failed"
        ))));
        let out = d.process_query("hello").await;
        assert_eq!(out, "Error: Inference request failed");
    }

    #[test]
    fn aggregate_joins_with_blank_line() {
        let results = vec![
            ToolCallResult {
                call_id: "a".into(),
                name: "list_items".into(),
                outcome: Ok(serde_json::json!([])),
            },
            ToolCallResult {
                call_id: "b".into(),
                name: "nope".into(),
                outcome: Err(ToolError::UnknownTool("nope".into())),
            },
        ];
        assert_eq!(
            aggregate(&results),
            "Result from list_items:\n[]\n\nError: Function nope not found"
        );
    }
}
