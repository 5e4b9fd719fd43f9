//! HTTP client for the items REST API.

use crate::error::{StoreError, StoreResult};
use crate::items::ItemStore;
use crate::types::{Ack, Item, ItemUpdate, NewItem};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use std::time::Duration;
use tracing::debug;

/// Items API client.
#[derive(Debug, Clone)]
pub struct ItemsClient {
    base_url: String,
    http: reqwest::Client,
}

impl ItemsClient {
    /// Create a new items client.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build items HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn items_url(&self) -> String {
        format!("{}/items", self.base_url)
    }

    fn item_url(&self, id: i64) -> String {
        format!("{}/items/{}", self.base_url, id)
    }
}

/// Map a non-success status to a store error.
async fn check(resp: Response, id: Option<i64>) -> StoreResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    match (status, id) {
        (StatusCode::NOT_FOUND, Some(id)) => Err(StoreError::NotFound(id)),
        (StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY, _) => {
            Err(StoreError::Validation(body))
        }
        _ => Err(StoreError::Transport(format!("{} {}", status, body))),
    }
}

/// Body `PUT /items/{id}` answers with when the row is gone.
const UPDATE_MISSING: &str = "Registro não encontrado!";

/// The API acknowledges writes with `{"message": …}` and never returns the
/// row, so `create` and `update` read it back and `update`/`delete` check
/// that it exists first.
#[async_trait]
impl ItemStore for ItemsClient {
    async fn list_all(&self) -> StoreResult<Vec<Item>> {
        debug!("GET {}", self.items_url());
        let resp = self.http.get(self.items_url()).send().await?;
        let resp = check(resp, None).await?;
        Ok(resp.json().await?)
    }

    async fn get_by_id(&self, id: i64) -> StoreResult<Item> {
        debug!("GET {}", self.item_url(id));
        let resp = self.http.get(self.item_url(id)).send().await?;
        let resp = check(resp, Some(id)).await?;
        // The API answers a missing row with a `null` body.
        let item: Option<Item> = resp.json().await?;
        item.ok_or(StoreError::NotFound(id))
    }

    async fn create(&self, item: &NewItem) -> StoreResult<Item> {
        if item.name.trim().is_empty() {
            return Err(StoreError::Validation("name must not be empty".into()));
        }

        debug!("POST {}", self.items_url());
        let resp = self.http.post(self.items_url()).json(item).send().await?;
        let ack: Ack = check(resp, None).await?.json().await?;
        debug!("Create acknowledged: {}", ack.message);

        // Newest row with the submitted values.
        self.list_all()
            .await?
            .into_iter()
            .filter(|row| row.name == item.name && row.age == item.age)
            .max_by_key(|row| row.id)
            .ok_or_else(|| {
                StoreError::Transport(format!(
                    "created item '{}' is missing from the listing",
                    item.name
                ))
            })
    }

    async fn update(&self, id: i64, update: &ItemUpdate) -> StoreResult<Item> {
        self.get_by_id(id).await?;

        debug!("PUT {}", self.item_url(id));
        let resp = self.http.put(self.item_url(id)).json(update).send().await?;
        let ack: Ack = check(resp, Some(id)).await?.json().await?;
        if ack.message == UPDATE_MISSING {
            return Err(StoreError::NotFound(id));
        }

        self.get_by_id(id).await
    }

    async fn delete(&self, id: i64) -> StoreResult<Ack> {
        self.get_by_id(id).await?;

        debug!("DELETE {}", self.item_url(id));
        let resp = self.http.delete(self.item_url(id)).send().await?;
        let resp = check(resp, Some(id)).await?;
        Ok(resp.json().await?)
    }
}
