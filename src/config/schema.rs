//! Configuration schema for kitbag
//!
//! Configuration is stored at `~/.config/kitbag/config.toml`, or in a
//! `kitbag.toml` in the working directory.

use crate::error::KitbagResult;
use crate::manifest::normalize_origin;
use crate::reconciler::DEFAULT_CONCURRENCY;
use crate::store::PartitionNames;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// The deployment being mirrored
    pub deployment: DeploymentConfig,

    /// Local cache settings
    pub cache: CacheConfig,

    /// Fetch behavior
    pub fetch: FetchConfig,
}

/// Deployment settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentConfig {
    /// Origin the app is served from, e.g. "https://app.example.com"
    pub origin: String,

    /// Path of the resource manifest relative to the origin
    pub manifest_path: String,

    /// Paths staged eagerly on every sync
    pub core_shell: Vec<String>,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            origin: String::new(),
            manifest_path: "resources.json".to_string(),
            core_shell: vec!["/".to_string(), "index.html".to_string()],
        }
    }
}

impl DeploymentConfig {
    /// Origin validated and stripped of any trailing slash
    pub fn normalized_origin(&self) -> KitbagResult<String> {
        normalize_origin(&self.origin)
    }

    /// Absolute URL of the deployed resource manifest
    pub fn manifest_url(&self) -> KitbagResult<String> {
        Ok(format!(
            "{}/{}",
            self.normalized_origin()?,
            self.manifest_path
        ))
    }
}

/// Local cache settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache directory (default: platform cache dir)
    pub dir: Option<PathBuf>,

    /// Partition names within the cache directory
    pub partitions: PartitionNames,
}

/// Fetch behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Parallel fetches during sync and fill
    pub concurrency: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}
