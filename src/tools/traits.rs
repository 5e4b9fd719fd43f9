//! Tool trait and parameter schema.

use crate::error::{ToolError, ToolResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;

/// JSON type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Boolean,
    Number,
}

impl ParamType {
    /// Whether `value` has this JSON type.
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64(),
            Self::Boolean => value.is_boolean(),
            Self::Number => value.is_number(),
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Integer => write!(f, "integer"),
            Self::Boolean => write!(f, "boolean"),
            Self::Number => write!(f, "number"),
        }
    }
}

/// One declared parameter of a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ParamType,
    pub description: String,
    pub required: bool,
}

impl ParamSpec {
    pub fn required(name: &str, kind: ParamType, description: &str) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            required: true,
        }
    }

    pub fn optional(name: &str, kind: ParamType, description: &str) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            required: false,
        }
    }
}

/// Definition of a tool exposed to the inference model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub params: Vec<ParamSpec>,
}

impl ToolDefinition {
    pub fn new(name: &str, description: &str, params: Vec<ParamSpec>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params,
        }
    }

    /// JSON Schema for the tool's parameters, in the function-calling format.
    pub fn parameters_schema(&self) -> Value {
        let mut properties = Map::new();
        for p in &self.params {
            properties.insert(
                p.name.clone(),
                json!({
                    "type": p.kind.to_string(),
                    "description": p.description,
                }),
            );
        }
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Check a complete argument set against the declared parameters.
    ///
    /// Returns the argument object with `null` optionals removed, so the
    /// handler only ever sees values that passed the type check.
    pub fn validate(&self, args: &Value) -> ToolResult<Map<String, Value>> {
        let invalid = |reason: String| ToolError::InvalidArguments {
            name: self.name.clone(),
            reason,
        };

        let obj = args
            .as_object()
            .ok_or_else(|| invalid(format!("expected an object, got {}", json_kind(args))))?;

        for key in obj.keys() {
            if !self.params.iter().any(|p| &p.name == key) {
                return Err(invalid(format!("unexpected parameter '{}'", key)));
            }
        }

        let mut checked = Map::new();
        for p in &self.params {
            match obj.get(&p.name) {
                None | Some(Value::Null) => {
                    if p.required {
                        return Err(invalid(format!("missing required parameter '{}'", p.name)));
                    }
                }
                Some(value) => {
                    if !p.kind.accepts(value) {
                        return Err(invalid(format!(
                            "parameter '{}' must be {}, got {}",
                            p.name,
                            p.kind,
                            json_kind(value)
                        )));
                    }
                    checked.insert(p.name.clone(), value.clone());
                }
            }
        }

        Ok(checked)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A named operation the model may invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name, description and parameter schema.
    fn definition(&self) -> ToolDefinition;

    /// Execute with arguments that already passed `ToolDefinition::validate`.
    async fn execute(&self, args: Map<String, Value>) -> ToolResult<Value>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update_def() -> ToolDefinition {
        ToolDefinition::new(
            "update_item",
            "Update an existing item",
            vec![
                ParamSpec::required("item_id", ParamType::Integer, "The ID"),
                ParamSpec::optional("nome", ParamType::String, "The new name"),
                ParamSpec::optional("idade", ParamType::Integer, "The new age"),
            ],
        )
    }

    #[test]
    fn schema_lists_properties_and_required() {
        let schema = update_def().parameters_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["item_id"]["type"], "integer");
        assert_eq!(schema["properties"]["nome"]["type"], "string");
        assert_eq!(schema["required"], json!(["item_id"]));
    }

    #[test]
    fn empty_tool_schema_has_empty_required() {
        let def = ToolDefinition::new("list_items", "List", vec![]);
        let schema = def.parameters_schema();
        assert_eq!(schema["properties"], json!({}));
        assert_eq!(schema["required"], json!([]));
    }

    #[test]
    fn validate_accepts_complete_arguments() {
        let args = update_def()
            .validate(&json!({"item_id": 3, "nome": "Bia", "idade": null}))
            .unwrap();
        assert_eq!(args.get("item_id"), Some(&json!(3)));
        assert_eq!(args.get("nome"), Some(&json!("Bia")));
        assert!(!args.contains_key("idade"));
    }

    #[test]
    fn validate_rejects_missing_required() {
        let err = update_def().validate(&json!({"nome": "Bia"})).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
        assert!(err.to_string().contains("missing required parameter 'item_id'"));
    }

    #[test]
    fn validate_rejects_wrong_type() {
        let err = update_def().validate(&json!({"item_id": "3"})).unwrap_err();
        assert!(err.to_string().contains("'item_id' must be integer, got string"));

        let err = update_def().validate(&json!({"item_id": 1.5})).unwrap_err();
        assert!(err.to_string().contains("got number"));
    }

    #[test]
    fn validate_rejects_unexpected_parameter() {
        let err = update_def()
            .validate(&json!({"item_id": 1, "colour": "red"}))
            .unwrap_err();
        assert!(err.to_string().contains("unexpected parameter 'colour'"));
    }

    #[test]
    fn validate_rejects_non_object() {
        let err = update_def().validate(&json!([1, 2])).unwrap_err();
        assert!(err.to_string().contains("expected an object, got array"));
    }

    #[test]
    fn number_accepts_integers_and_floats() {
        assert!(ParamType::Number.accepts(&json!(2)));
        assert!(ParamType::Number.accepts(&json!(2.5)));
        assert!(!ParamType::Integer.accepts(&json!(2.5)));
        assert!(ParamType::Boolean.accepts(&json!(true)));
    }

    #[test]
    fn integer_must_fit_in_i64() {
        assert!(ParamType::Integer.accepts(&json!(i64::MIN)));
        assert!(!ParamType::Integer.accepts(&json!(u64::MAX)));

        let err = update_def()
            .validate(&json!({"item_id": u64::MAX}))
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
        assert!(err.to_string().contains("'item_id' must be integer, got number"));
    }
}
