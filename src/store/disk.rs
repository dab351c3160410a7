//! On-disk cache store
//!
//! Layout: one directory per partition under the store root. Each entry is
//! a pair of files named by a digest of the key: `{stem}.bin` holds the raw
//! body, `{stem}.json` is a sidecar carrying the key, status, and headers.

use super::{CacheStore, StoredResponse};
use crate::error::{KitbagError, KitbagResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Store rooted at a directory, typically under the user cache dir
#[derive(Debug, Clone)]
pub struct DiskStore {
    root: PathBuf,
}

/// Sidecar metadata written next to each body file
#[derive(Debug, Serialize, Deserialize)]
struct EntryMeta {
    key: String,
    status: u16,
    headers: Vec<(String, String)>,
    stored_at: DateTime<Utc>,
}

/// Short filesystem-safe name for a cache key
fn entry_stem(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    let result = hasher.finalize();
    hex::encode(&result[..6])
}

impl DiskStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn partition_dir(&self, partition: &str) -> PathBuf {
        self.root.join(partition)
    }

    fn entry_paths(&self, partition: &str, key: &str) -> (PathBuf, PathBuf) {
        let dir = self.partition_dir(partition);
        let stem = entry_stem(key);
        (dir.join(format!("{stem}.bin")), dir.join(format!("{stem}.json")))
    }
}

#[async_trait]
impl CacheStore for DiskStore {
    async fn get(&self, partition: &str, key: &str) -> KitbagResult<Option<StoredResponse>> {
        let (body_path, meta_path) = self.entry_paths(partition, key);

        let meta_raw = match tokio::fs::read_to_string(&meta_path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(KitbagError::io("reading cache entry metadata", e)),
        };
        let meta: EntryMeta = serde_json::from_str(&meta_raw)?;

        // Digest collisions are improbable but not impossible
        if meta.key != key {
            warn!(
                "cache entry {} holds key {:?}, expected {:?}",
                meta_path.display(),
                meta.key,
                key
            );
            return Ok(None);
        }

        let body = match tokio::fs::read(&body_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(KitbagError::io("reading cache entry body", e)),
        };

        Ok(Some(StoredResponse {
            status: meta.status,
            headers: meta.headers,
            body: body.into(),
        }))
    }

    async fn put(
        &self,
        partition: &str,
        key: &str,
        response: StoredResponse,
    ) -> KitbagResult<()> {
        let dir = self.partition_dir(partition);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| KitbagError::io("creating cache partition", e))?;

        let (body_path, meta_path) = self.entry_paths(partition, key);
        let meta = EntryMeta {
            key: key.to_string(),
            status: response.status,
            headers: response.headers,
            stored_at: Utc::now(),
        };

        // Body first so a sidecar never points at a missing file
        tokio::fs::write(&body_path, &response.body)
            .await
            .map_err(|e| KitbagError::io("writing cache entry body", e))?;
        tokio::fs::write(&meta_path, serde_json::to_string(&meta)?)
            .await
            .map_err(|e| KitbagError::io("writing cache entry metadata", e))?;
        Ok(())
    }

    async fn delete(&self, partition: &str, key: &str) -> KitbagResult<()> {
        let (body_path, meta_path) = self.entry_paths(partition, key);
        for path in [meta_path, body_path] {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(KitbagError::io("removing cache entry", e)),
            }
        }
        Ok(())
    }

    async fn keys(&self, partition: &str) -> KitbagResult<Vec<String>> {
        let dir = self.partition_dir(partition);
        let mut read_dir = match tokio::fs::read_dir(&dir).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(KitbagError::io("listing cache partition", e)),
        };

        let mut keys = Vec::new();
        while let Some(entry) = read_dir
            .next_entry()
            .await
            .map_err(|e| KitbagError::io("listing cache partition", e))?
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let raw = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| KitbagError::io("reading cache entry metadata", e))?;
            let meta: EntryMeta = serde_json::from_str(&raw)?;
            keys.push(meta.key);
        }
        Ok(keys)
    }

    async fn drop_partition(&self, partition: &str) -> KitbagResult<()> {
        match tokio::fs::remove_dir_all(self.partition_dir(partition)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(KitbagError::io("removing cache partition", e)),
        }
    }

    async fn partition_exists(&self, partition: &str) -> KitbagResult<bool> {
        Ok(self.partition_dir(partition).is_dir())
    }
}
