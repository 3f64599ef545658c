//! One-shot seed handler
//!
//! Runs once when the database stack is first deployed and writes the
//! bundled seed records. Puts are keyed on `id`, so a retried
//! invocation converges on the same table contents.

use crate::store::{Item, ItemStore, StoreError};

const SEED_DATA: &str = include_str!("../../data/MOCK_DATA.json");

/// Writes every seed record; returns how many were written.
pub async fn handle(store: &impl ItemStore) -> Result<usize, StoreError> {
    let items: Vec<Item> = serde_json::from_str(SEED_DATA)
        .map_err(|e| StoreError::Storage(format!("invalid seed data: {e}")))?;

    let count = items.len();
    for item in items {
        tracing::debug!(id = %item.id, "seeding item");
        store.put(item).await?;
    }
    tracing::info!(count, "seed data written");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::{FailingStore, MemoryStore};

    #[tokio::test]
    async fn writes_every_seed_record() {
        let store = MemoryStore::new();
        let count = handle(&store).await.unwrap();
        assert!(count > 0);
        assert_eq!(store.len(), count);
    }

    #[tokio::test]
    async fn seeded_items_are_readable_by_id() {
        let store = MemoryStore::new();
        handle(&store).await.unwrap();
        let item = store.get("caesar").await.unwrap().unwrap();
        assert!(!item.item.is_empty());
    }

    #[tokio::test]
    async fn reruns_converge_to_the_same_count() {
        let store = MemoryStore::new();
        let first = handle(&store).await.unwrap();
        let second = handle(&store).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(store.len(), first);
    }

    #[tokio::test]
    async fn storage_failure_propagates() {
        assert!(handle(&FailingStore).await.is_err());
    }
}
