//! Resource fetching
//!
//! The reconciler pulls resources through the [`Fetcher`] trait so tests
//! can substitute canned responses. [`HttpFetcher`] is the real
//! implementation over reqwest.

use crate::error::{KitbagError, KitbagResult};
use crate::store::StoredResponse;
use async_trait::async_trait;
use reqwest::header;
use std::time::Duration;

const USER_AGENT: &str = concat!("kitbag/", env!("CARGO_PKG_VERSION"));

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How a fetch should treat intermediary caches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FetchMode {
    /// Ordinary request
    #[default]
    Normal,
    /// Bypass intermediary caches to get the deployed bytes
    Reload,
}

/// Transport for deployed resources.
///
/// Implementations return `Err` only for transport failures. An HTTP error
/// status is a successful fetch and comes back as a non-ok
/// [`StoredResponse`]; callers decide what a given status means.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str, mode: FetchMode) -> KitbagResult<StoredResponse>;
}

/// Fetcher backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> KitbagResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| KitbagError::Internal(format!("building http client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, mode: FetchMode) -> KitbagResult<StoredResponse> {
        let mut request = self.client.get(url);
        if mode == FetchMode::Reload {
            request = request
                .header(header::CACHE_CONTROL, "no-cache")
                .header(header::PRAGMA, "no-cache");
        }

        let response = request
            .send()
            .await
            .map_err(|e| KitbagError::fetch(url, e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| KitbagError::fetch(url, e.to_string()))?;

        Ok(StoredResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_mode_defaults_to_normal() {
        assert_eq!(FetchMode::default(), FetchMode::Normal);
    }

    #[test]
    fn user_agent_carries_version() {
        assert!(USER_AGENT.starts_with("kitbag/"));
        assert_ne!(USER_AGENT, "kitbag/");
    }

    #[tokio::test]
    async fn refused_connection_is_fetch_error() {
        let fetcher = HttpFetcher::new().unwrap();
        // Port reserved for the test, nothing listens there
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/resources.json", listener.local_addr().unwrap());
        drop(listener);

        let result = fetcher.fetch(&url, FetchMode::Normal).await;
        assert!(matches!(result, Err(KitbagError::Fetch { .. })));
    }
}
