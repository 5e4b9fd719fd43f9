//! Insertion-ordered registry of callable tools.

use crate::error::{RegistryError, ToolError, ToolResult};
use crate::tools::traits::{Tool, ToolDefinition};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// A tool as held by the registry: its frozen definition plus the handler.
pub struct RegisteredTool {
    definition: ToolDefinition,
    handler: Arc<dyn Tool>,
}

impl RegisteredTool {
    /// Validate `args` against the definition, then run the handler.
    ///
    /// The handler is only invoked with a complete, schema-valid argument set.
    pub async fn call(&self, args: &Value) -> ToolResult<Value> {
        let checked = self.definition.validate(args)?;
        self.handler.execute(checked).await
    }
}

/// Catalogue of invocable operations. Built once at startup, read-only after.
#[derive(Default)]
pub struct ToolRegistry {
    entries: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under the name from its definition.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), RegistryError> {
        let definition = tool.definition();
        if self.index.contains_key(&definition.name) {
            return Err(RegistryError::DuplicateName(definition.name));
        }

        debug!("Registered tool '{}'", definition.name);
        self.index.insert(definition.name.clone(), self.entries.len());
        self.entries.push(RegisteredTool {
            definition,
            handler: tool,
        });
        Ok(())
    }

    /// All definitions, in registration order.
    pub fn describe_all(&self) -> Vec<ToolDefinition> {
        self.entries.iter().map(|e| e.definition.clone()).collect()
    }

    /// Look up a tool by name.
    pub fn resolve(&self, name: &str) -> ToolResult<&RegisteredTool> {
        self.index
            .get(name)
            .map(|&i| &self.entries[i])
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))
    }

    /// Resolve and call in one step.
    pub async fn invoke(&self, name: &str, args: &Value) -> ToolResult<Value> {
        self.resolve(name)?.call(args).await
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
