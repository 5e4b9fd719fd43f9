pub mod dispatcher;
pub mod response;

pub use dispatcher::{Dispatcher, ToolCallResult};
pub use response::{parse_model_response, InlineMarkers, ModelReply};

use crate::config::{self, AgentConfig, ItemsBackend};
use crate::inference::InferenceClient;
use crate::items::{ItemStore, ItemsClient, MemoryStore};
use crate::tools;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

/// Build the items backend selected in the config.
pub fn build_store(config: &AgentConfig) -> Result<Arc<dyn ItemStore>> {
    let store: Arc<dyn ItemStore> = match config.items_backend {
        ItemsBackend::Http => Arc::new(ItemsClient::new(
            &config.items_api_url,
            Duration::from_secs(config.request_timeout_secs),
        )?),
        ItemsBackend::Memory => Arc::new(MemoryStore::new()),
    };
    Ok(store)
}

/// Wire the inference client, the item tools and the inline markers into a
/// ready dispatcher.
pub fn build_dispatcher(config: &AgentConfig, store: Arc<dyn ItemStore>) -> Result<Dispatcher> {
    config::validate_config(config)?;

    let model = InferenceClient::from_config(config)?;
    let registry = tools::item_registry(store).context("Failed to register item tools")?;
    let markers = InlineMarkers::new(&config.inline_call_open, &config.inline_call_close);

    Ok(Dispatcher::new(Arc::new(model), Arc::new(registry)).with_markers(markers))
}
