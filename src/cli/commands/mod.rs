//! CLI command implementations

use crate::config::{Config, ConfigManager};
use crate::store::DiskStore;

pub mod clear;
pub mod config;
pub mod fill;
pub mod get;
pub mod init;
pub mod status;
pub mod sync;

pub use clear::execute as clear;
pub use config::execute as config;
pub use fill::execute as fill;
pub use get::execute as get;
pub use init::execute as init;
pub use status::execute as status;
pub use sync::execute as sync;

/// Open the disk store this invocation is configured for
pub(crate) fn open_store(config: &Config) -> DiskStore {
    let dir = config
        .cache
        .dir
        .clone()
        .unwrap_or_else(ConfigManager::default_cache_dir);
    DiskStore::new(dir)
}
