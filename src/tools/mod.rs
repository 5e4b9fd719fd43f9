pub mod items;
pub mod registry;
pub mod traits;

pub use registry::ToolRegistry;
pub use traits::{ParamSpec, ParamType, Tool, ToolDefinition};

use crate::error::RegistryError;
use crate::items::ItemStore;
use std::sync::Arc;

/// Build the registry of tools exposed to the inference model.
pub fn item_registry(store: Arc<dyn ItemStore>) -> Result<ToolRegistry, RegistryError> {
    let mut registry = ToolRegistry::new();
    for tool in items::item_tools(store) {
        registry.register(tool)?;
    }
    Ok(registry)
}
