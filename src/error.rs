//! Error types for kitbag
//!
//! All modules use `KitbagResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for kitbag operations
pub type KitbagResult<T> = Result<T, KitbagError>;

/// All errors that can occur in kitbag
#[derive(Error, Debug)]
pub enum KitbagError {
    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid deployment origin '{origin}': {reason}")]
    OriginInvalid { origin: String, reason: String },

    // Manifest errors
    #[error("Invalid resource manifest: {reason}")]
    ManifestInvalid { reason: String },

    #[error("No manifest baseline in the cache")]
    ManifestMissing,

    #[error("Core shell path not declared in the manifest: {0}")]
    CoreShellUndeclared(String),

    // Fetch errors
    #[error("Fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Unexpected status {status} fetching {url}")]
    FetchStatus { url: String, status: u16 },

    // Cache store errors
    #[error("Cache store error: {context}: {reason}")]
    Store { context: String, reason: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl KitbagError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a transport-level fetch error
    pub fn fetch(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create a fetch error for an unexpected HTTP status
    pub fn fetch_status(url: impl Into<String>, status: u16) -> Self {
        Self::FetchStatus {
            url: url.into(),
            status,
        }
    }

    /// Create a cache store error with context
    pub fn store(context: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Store {
            context: context.into(),
            reason: reason.into(),
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ManifestMissing => Some("Run: kitbag sync"),
            Self::ConfigNotFound(_) => Some("Run: kitbag init"),
            Self::OriginInvalid { .. } => {
                Some("Set deployment.origin in kitbag.toml, e.g. https://app.example.com")
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = KitbagError::fetch_status("https://app.example.com/main.js", 503);
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("main.js"));
    }

    #[test]
    fn error_hint() {
        let err = KitbagError::ManifestMissing;
        assert_eq!(err.hint(), Some("Run: kitbag sync"));

        let err = KitbagError::fetch("https://app.example.com/", "connection refused");
        assert_eq!(err.hint(), None);
    }

    #[test]
    fn io_helper_keeps_context() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = KitbagError::io("reading sidecar", source);
        assert!(err.to_string().contains("reading sidecar"));
    }
}
