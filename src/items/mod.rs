pub mod client;
pub mod memory;

pub use client::ItemsClient;
pub use memory::MemoryStore;

use crate::error::StoreResult;
use crate::types::{Ack, Item, ItemUpdate, NewItem};
use async_trait::async_trait;

/// Backend for the items table.
#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn list_all(&self) -> StoreResult<Vec<Item>>;

    async fn get_by_id(&self, id: i64) -> StoreResult<Item>;

    async fn create(&self, item: &NewItem) -> StoreResult<Item>;

    /// Overwrite only the fields present in `update`.
    async fn update(&self, id: i64, update: &ItemUpdate) -> StoreResult<Item>;

    async fn delete(&self, id: i64) -> StoreResult<Ack>;
}
