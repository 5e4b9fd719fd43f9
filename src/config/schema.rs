//! Configuration schema for crudagent.toml.

use serde::{Deserialize, Serialize};

/// Where the CRUD tools read and write items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemsBackend {
    /// The items REST API at `items_api_url`.
    Http,
    /// A process-local table, lost on exit.
    Memory,
}

/// Root configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Base URL of the OpenAI-compatible server, including the `/v1` prefix.
    pub model_api_url: String,

    /// Bearer token for the model server. Empty means no auth header.
    pub model_api_key: String,

    /// Model identifier sent with each request.
    pub model: String,

    /// Sampling temperature; server default when unset.
    pub temperature: Option<f64>,

    /// Completion token limit; server default when unset.
    pub max_tokens: Option<u32>,

    /// `tool_choice` sent with the catalogue ("auto", "none", "required").
    pub tool_choice: String,

    /// Timeout applied to every HTTP request, in seconds.
    pub request_timeout_secs: u64,

    pub items_backend: ItemsBackend,

    /// Base URL of the items REST API.
    pub items_api_url: String,

    /// Opening token of the inline call fallback.
    pub inline_call_open: String,

    /// Closing token of the inline call fallback.
    pub inline_call_close: String,

    /// Log level (debug, info, warn, error).
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model_api_url: "http://localhost:1234/v1".into(),
            model_api_key: String::new(),
            model: "local-model".into(),
            temperature: None,
            max_tokens: None,
            tool_choice: "auto".into(),
            request_timeout_secs: 60,
            items_backend: ItemsBackend::Http,
            items_api_url: "http://127.0.0.1:8000".into(),
            inline_call_open: "<call>".into(),
            inline_call_close: "</call>".into(),
            log_level: "info".into(),
        }
    }
}
