//! In-memory cache store

use super::{CacheStore, StoredResponse};
use crate::error::KitbagResult;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Store backed by process memory. Nothing survives the process; tests
/// and embedders that manage their own persistence use this one.
#[derive(Debug, Default)]
pub struct MemoryStore {
    partitions: RwLock<HashMap<String, HashMap<String, StoredResponse>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, partition: &str, key: &str) -> KitbagResult<Option<StoredResponse>> {
        let partitions = self.partitions.read().await;
        Ok(partitions
            .get(partition)
            .and_then(|entries| entries.get(key))
            .cloned())
    }

    async fn put(
        &self,
        partition: &str,
        key: &str,
        response: StoredResponse,
    ) -> KitbagResult<()> {
        let mut partitions = self.partitions.write().await;
        partitions
            .entry(partition.to_string())
            .or_default()
            .insert(key.to_string(), response);
        Ok(())
    }

    async fn delete(&self, partition: &str, key: &str) -> KitbagResult<()> {
        let mut partitions = self.partitions.write().await;
        if let Some(entries) = partitions.get_mut(partition) {
            entries.remove(key);
        }
        Ok(())
    }

    async fn keys(&self, partition: &str) -> KitbagResult<Vec<String>> {
        let partitions = self.partitions.read().await;
        Ok(partitions
            .get(partition)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn drop_partition(&self, partition: &str) -> KitbagResult<()> {
        let mut partitions = self.partitions.write().await;
        partitions.remove(partition);
        Ok(())
    }

    async fn partition_exists(&self, partition: &str) -> KitbagResult<bool> {
        let partitions = self.partitions.read().await;
        Ok(partitions.contains_key(partition))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_from_absent_partition_is_none() {
        let store = MemoryStore::new();
        assert_eq!(store.get("content", "a").await.unwrap(), None);
        assert!(!store.partition_exists("content").await.unwrap());
    }

    #[tokio::test]
    async fn put_creates_partition() {
        let store = MemoryStore::new();
        store
            .put("content", "a", StoredResponse::new(200, "body"))
            .await
            .unwrap();

        assert!(store.partition_exists("content").await.unwrap());
        let got = store.get("content", "a").await.unwrap().unwrap();
        assert_eq!(got.status, 200);
        assert_eq!(got.body.as_ref(), b"body");
    }

    #[tokio::test]
    async fn put_replaces_existing() {
        let store = MemoryStore::new();
        store
            .put("content", "a", StoredResponse::new(200, "v1"))
            .await
            .unwrap();
        store
            .put("content", "a", StoredResponse::new(200, "v2"))
            .await
            .unwrap();

        let got = store.get("content", "a").await.unwrap().unwrap();
        assert_eq!(got.body.as_ref(), b"v2");
        assert_eq!(store.keys("content").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemoryStore::new();
        store.delete("content", "missing").await.unwrap();

        store
            .put("content", "a", StoredResponse::new(200, ""))
            .await
            .unwrap();
        store.delete("content", "a").await.unwrap();
        store.delete("content", "a").await.unwrap();
        assert_eq!(store.get("content", "a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn drop_partition_removes_everything() {
        let store = MemoryStore::new();
        store
            .put("temp", "a", StoredResponse::new(200, ""))
            .await
            .unwrap();
        store
            .put("temp", "b", StoredResponse::new(200, ""))
            .await
            .unwrap();

        store.drop_partition("temp").await.unwrap();
        assert!(!store.partition_exists("temp").await.unwrap());
        assert!(store.keys("temp").await.unwrap().is_empty());
    }
}
