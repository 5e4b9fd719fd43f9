//! CRUD tools over the items table.

use crate::error::{ToolError, ToolResult};
use crate::items::ItemStore;
use crate::tools::traits::{ParamSpec, ParamType, Tool, ToolDefinition};
use crate::types::{ItemUpdate, NewItem};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

type Args = Map<String, Value>;

// -- Argument helpers ---------------------------------------------------------
//
// Arguments have already been validated against the definition, so a missing
// required value here means the definition and the handler disagree.

fn require_i64(args: &Args, key: &str) -> ToolResult<i64> {
    args.get(key)
        .and_then(Value::as_i64)
        .ok_or_else(|| ToolError::Execution(format!("Missing '{}' argument", key)))
}

fn require_str(args: &Args, key: &str) -> ToolResult<String> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ToolError::Execution(format!("Missing '{}' argument", key)))
}

fn opt_i64(args: &Args, key: &str) -> Option<i64> {
    args.get(key).and_then(Value::as_i64)
}

fn opt_str(args: &Args, key: &str) -> Option<String> {
    args.get(key).and_then(Value::as_str).map(str::to_string)
}

fn to_payload<T: serde::Serialize>(value: T) -> ToolResult<Value> {
    serde_json::to_value(value).map_err(|e| ToolError::Execution(e.to_string()))
}

fn item_id_param(description: &str) -> ParamSpec {
    ParamSpec::required("item_id", ParamType::Integer, description)
}

// -- Tools ----------------------------------------------------------------------

pub struct ListItems {
    store: Arc<dyn ItemStore>,
}

#[async_trait]
impl Tool for ListItems {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("list_items", "Get all items from the database", vec![])
    }

    async fn execute(&self, _args: Args) -> ToolResult<Value> {
        to_payload(self.store.list_all().await?)
    }
}

pub struct GetItem {
    store: Arc<dyn ItemStore>,
}

#[async_trait]
impl Tool for GetItem {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "get_item",
            "Get a specific item by ID",
            vec![item_id_param("The ID of the item to retrieve")],
        )
    }

    async fn execute(&self, args: Args) -> ToolResult<Value> {
        let id = require_i64(&args, "item_id")?;
        to_payload(self.store.get_by_id(id).await?)
    }
}

pub struct CreateItem {
    store: Arc<dyn ItemStore>,
}

#[async_trait]
impl Tool for CreateItem {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "create_item",
            "Create a new item",
            vec![
                ParamSpec::required("nome", ParamType::String, "The name of the item"),
                ParamSpec::required("idade", ParamType::Integer, "The age value"),
            ],
        )
    }

    async fn execute(&self, args: Args) -> ToolResult<Value> {
        let item = NewItem {
            name: require_str(&args, "nome")?,
            age: require_i64(&args, "idade")?,
        };
        to_payload(self.store.create(&item).await?)
    }
}

pub struct UpdateItem {
    store: Arc<dyn ItemStore>,
}

#[async_trait]
impl Tool for UpdateItem {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "update_item",
            "Update an existing item",
            vec![
                item_id_param("The ID of the item to update"),
                ParamSpec::optional("nome", ParamType::String, "The new name (optional)"),
                ParamSpec::optional("idade", ParamType::Integer, "The new age (optional)"),
            ],
        )
    }

    async fn execute(&self, args: Args) -> ToolResult<Value> {
        let id = require_i64(&args, "item_id")?;
        let update = ItemUpdate {
            name: opt_str(&args, "nome"),
            age: opt_i64(&args, "idade"),
        };
        if update.is_empty() {
            return Err(ToolError::Execution(
                "Nothing to update: provide 'nome' and/or 'idade'".into(),
            ));
        }
        to_payload(self.store.update(id, &update).await?)
    }
}

pub struct DeleteItem {
    store: Arc<dyn ItemStore>,
}

#[async_trait]
impl Tool for DeleteItem {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "delete_item",
            "Delete an item",
            vec![item_id_param("The ID of the item to delete")],
        )
    }

    async fn execute(&self, args: Args) -> ToolResult<Value> {
        let id = require_i64(&args, "item_id")?;
        to_payload(self.store.delete(id).await?)
    }
}

/// The five CRUD tools, in the order they are offered to the model.
pub fn item_tools(store: Arc<dyn ItemStore>) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(ListItems {
            store: store.clone(),
        }),
        Arc::new(GetItem {
            store: store.clone(),
        }),
        Arc::new(CreateItem {
            store: store.clone(),
        }),
        Arc::new(UpdateItem {
            store: store.clone(),
        }),
        Arc::new(DeleteItem { store }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::MemoryStore;
    use crate::tools::registry::ToolRegistry;
    use crate::types::Item;
    use serde_json::json;

    fn registry() -> ToolRegistry {
        let store = Arc::new(MemoryStore::with_items(vec![Item {
            id: 1,
            name: "Ana".into(),
            age: 30,
        }]));
        let mut registry = ToolRegistry::new();
        for tool in item_tools(store) {
            registry.register(tool).unwrap();
        }
        registry
    }

    #[test]
    fn catalogue_matches_agent_contract() {
        let names: Vec<String> = registry().describe_all().into_iter().map(|d| d.name).collect();
        assert_eq!(
            names,
            vec!["list_items", "get_item", "create_item", "update_item", "delete_item"]
        );
    }

    #[tokio::test]
    async fn create_then_list() {
        let registry = registry();
        let created = registry
            .invoke("create_item", &json!({"nome": "Rui", "idade": 41}))
            .await
            .unwrap();
        assert_eq!(created, json!({"id": 2, "nome": "Rui", "idade": 41}));

        let all = registry.invoke("list_items", &json!({})).await.unwrap();
        assert_eq!(all.as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn update_keeps_omitted_fields() {
        let registry = registry();
        let updated = registry
            .invoke("update_item", &json!({"item_id": 1, "idade": 31}))
            .await
            .unwrap();
        assert_eq!(updated, json!({"id": 1, "nome": "Ana", "idade": 31}));
    }

    #[tokio::test]
    async fn update_without_fields_fails() {
        let err = registry()
            .invoke("update_item", &json!({"item_id": 1}))
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Nothing to update"));
    }

    #[tokio::test]
    async fn missing_item_is_an_execution_error() {
        let err = registry()
            .invoke("delete_item", &json!({"item_id": 999}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Execution(_)));
        assert_eq!(err.to_string(), "Item 999 not found");
    }

    #[tokio::test]
    async fn out_of_range_id_fails_validation() {
        let err = registry()
            .invoke("get_item", &json!({"item_id": u64::MAX}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
    }
}
