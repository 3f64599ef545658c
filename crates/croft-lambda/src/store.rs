//! Storage port and the DynamoDB adapter

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One stored item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub item: String,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage failure: {0}")]
    Storage(String),
}

/// Port the handlers talk through; tests plug in an in-memory store.
#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<Item>, StoreError>;
    async fn put(&self, item: Item) -> Result<(), StoreError>;
}

/// DynamoDB-backed store used by the shipped binaries.
pub struct DynamoItemStore {
    table: String,
    client: aws_sdk_dynamodb::Client,
}

impl DynamoItemStore {
    pub fn new(client: aws_sdk_dynamodb::Client, table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            client,
        }
    }
}

#[async_trait]
impl ItemStore for DynamoItemStore {
    async fn get(&self, id: &str) -> Result<Option<Item>, StoreError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table)
            .key("id", AttributeValue::S(id.to_string()))
            .send()
            .await
            .map_err(|e| StoreError::Storage(format!("failed to read item {id}: {e}")))?;

        let Some(attributes) = output.item() else {
            return Ok(None);
        };
        let value = attributes
            .get("item")
            .and_then(|v| v.as_s().ok())
            .cloned()
            .unwrap_or_default();
        Ok(Some(Item {
            id: id.to_string(),
            item: value,
        }))
    }

    async fn put(&self, item: Item) -> Result<(), StoreError> {
        self.client
            .put_item()
            .table_name(&self.table)
            .item("id", AttributeValue::S(item.id.clone()))
            .item("item", AttributeValue::S(item.item))
            .send()
            .await
            .map_err(|e| {
                StoreError::Storage(format!("failed to write item {}: {e}", item.id))
            })?;
        Ok(())
    }
}

#[cfg(test)]
pub mod testing {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// In-memory store for handler tests.
    #[derive(Default)]
    pub struct MemoryStore {
        items: Mutex<HashMap<String, String>>,
    }

    impl MemoryStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn seed(&self, id: &str, value: &str) {
            self.items
                .lock()
                .expect("poisoned mutex")
                .insert(id.to_string(), value.to_string());
        }

        pub fn len(&self) -> usize {
            self.items.lock().expect("poisoned mutex").len()
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }
    }

    #[async_trait]
    impl ItemStore for MemoryStore {
        async fn get(&self, id: &str) -> Result<Option<Item>, StoreError> {
            Ok(self
                .items
                .lock()
                .expect("poisoned mutex")
                .get(id)
                .map(|value| Item {
                    id: id.to_string(),
                    item: value.clone(),
                }))
        }

        async fn put(&self, item: Item) -> Result<(), StoreError> {
            self.items
                .lock()
                .expect("poisoned mutex")
                .insert(item.id, item.item);
            Ok(())
        }
    }

    /// Store whose every call fails, for 500-path tests.
    pub struct FailingStore;

    #[async_trait]
    impl ItemStore for FailingStore {
        async fn get(&self, _id: &str) -> Result<Option<Item>, StoreError> {
            Err(StoreError::Storage("injected read failure".to_string()))
        }

        async fn put(&self, _item: Item) -> Result<(), StoreError> {
            Err(StoreError::Storage("injected write failure".to_string()))
        }
    }
}
