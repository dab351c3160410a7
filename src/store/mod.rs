//! Cache storage layer
//!
//! Storage is a set of named partitions each mapping string keys to stored
//! responses. The reconciler only ever talks to the [`CacheStore`] trait;
//! backends decide durability.

pub mod disk;
pub mod memory;

pub use disk::DiskStore;
pub use memory::MemoryStore;

use crate::error::KitbagResult;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A cached HTTP response: status, headers, and body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl StoredResponse {
    /// Build a response with no headers
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Whether the status is in the 2xx success range
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Names of the three partitions the reconciler works across
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionNames {
    /// Promoted resources served to requests
    pub content: String,
    /// Staging area filled during install
    pub temp: String,
    /// Single-entry partition holding the manifest baseline
    pub manifest: String,
}

impl Default for PartitionNames {
    fn default() -> Self {
        Self {
            content: "content".to_string(),
            temp: "temp".to_string(),
            manifest: "manifest".to_string(),
        }
    }
}

/// Partitioned key-value storage for cached responses.
///
/// Partitions spring into existence on first write. Reads from absent
/// partitions or keys return `Ok(None)`; deleting an absent key is not an
/// error.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Look up a response by key
    async fn get(&self, partition: &str, key: &str) -> KitbagResult<Option<StoredResponse>>;

    /// Store a response under a key, replacing any previous value
    async fn put(&self, partition: &str, key: &str, response: StoredResponse)
        -> KitbagResult<()>;

    /// Remove a key if present
    async fn delete(&self, partition: &str, key: &str) -> KitbagResult<()>;

    /// All keys currently stored in a partition
    async fn keys(&self, partition: &str) -> KitbagResult<Vec<String>>;

    /// Remove a partition and everything in it
    async fn drop_partition(&self, partition: &str) -> KitbagResult<()>;

    /// Whether a partition currently exists
    async fn partition_exists(&self, partition: &str) -> KitbagResult<bool>;
}
