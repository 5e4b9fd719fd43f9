//! In-process items store, for running the agent without the REST API.

use crate::error::{StoreError, StoreResult};
use crate::items::ItemStore;
use crate::types::{Ack, Item, ItemUpdate, NewItem};
use async_trait::async_trait;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct Table {
    rows: Vec<Item>,
    next_id: i64,
}

/// Items kept in memory, ids assigned from 1 upwards.
#[derive(Debug, Default)]
pub struct MemoryStore {
    table: Mutex<Table>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing rows. Later inserts continue after the
    /// highest seeded id.
    pub fn with_items(items: Vec<Item>) -> Self {
        let next_id = items.iter().map(|i| i.id).max().unwrap_or(0);
        Self {
            table: Mutex::new(Table {
                rows: items,
                next_id,
            }),
        }
    }
}

#[async_trait]
impl ItemStore for MemoryStore {
    async fn list_all(&self) -> StoreResult<Vec<Item>> {
        Ok(self.table.lock().await.rows.clone())
    }

    async fn get_by_id(&self, id: i64) -> StoreResult<Item> {
        let table = self.table.lock().await;
        table
            .rows
            .iter()
            .find(|i| i.id == id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn create(&self, item: &NewItem) -> StoreResult<Item> {
        if item.name.trim().is_empty() {
            return Err(StoreError::Validation("name must not be empty".into()));
        }

        let mut table = self.table.lock().await;
        table.next_id += 1;
        let row = Item {
            id: table.next_id,
            name: item.name.clone(),
            age: item.age,
        };
        table.rows.push(row.clone());
        Ok(row)
    }

    async fn update(&self, id: i64, update: &ItemUpdate) -> StoreResult<Item> {
        let mut table = self.table.lock().await;
        let row = table
            .rows
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(StoreError::NotFound(id))?;
        update.apply_to(row);
        Ok(row.clone())
    }

    async fn delete(&self, id: i64) -> StoreResult<Ack> {
        let mut table = self.table.lock().await;
        let before = table.rows.len();
        table.rows.retain(|i| i.id != id);
        if table.rows.len() == before {
            return Err(StoreError::NotFound(id));
        }
        Ok(Ack {
            message: format!("Item {} deleted", id),
        })
    }
}
