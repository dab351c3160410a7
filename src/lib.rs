//! Kitbag - Offline mirror and cache reconciler
//!
//! Keeps a local cache of a manifest-versioned web deployment in sync
//! with its origin, serving resources from cache when offline.

pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod manifest;
pub mod reconciler;
pub mod store;
pub mod ui;

pub use error::{KitbagError, KitbagResult};
