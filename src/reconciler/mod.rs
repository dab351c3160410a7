//! Cache reconciliation engine
//!
//! Drives the versioned resource cache across generations: `install`
//! stages the core shell into a temp partition, `activate` reconciles the
//! content partition against the previous manifest baseline and promotes
//! the staged entries, `serve` answers requests from cache or network
//! according to each path's routing class.
//!
//! Every fetch and store side effect goes through the [`Fetcher`] and
//! [`CacheStore`] traits, so the engine itself never touches the network
//! or the filesystem directly.

pub mod routing;

use crate::error::{KitbagError, KitbagResult};
use crate::fetch::{FetchMode, Fetcher};
use crate::manifest::{Deployment, ResourceManifest, ROOT_PATH};
use crate::store::{CacheStore, PartitionNames, StoredResponse};
use futures_util::{stream, StreamExt, TryStreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Key of the single entry in the manifest partition
pub const MANIFEST_KEY: &str = "manifest";

/// Parallel fetches during install and fill
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Lifecycle states of one reconciler generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Created, core shell not yet staged
    Installing,
    /// Core shell staged, waiting to take over
    Waiting,
    /// Reconciled and serving
    Activated,
}

/// What activation did to the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// No baseline existed; the staged shell became the content wholesale
    ColdStart { promoted: usize },
    /// A baseline existed; unchanged entries survived, the rest were evicted
    Upgraded {
        kept: usize,
        evicted: usize,
        promoted: usize,
    },
    /// Reconciliation failed and every partition was destroyed
    Reset { reason: String },
}

/// Outcome of routing one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServeOutcome {
    /// Not ours to answer; let the request through untouched
    PassThrough,
    /// Answered with a response
    Served {
        response: StoredResponse,
        source: ServedFrom,
    },
}

/// Where a served response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServedFrom {
    Network,
    Cache,
}

/// Counts from a cache fill pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FillReport {
    pub fetched: usize,
    pub already_cached: usize,
}

/// Control messages a page can send to the reconciler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMessage {
    SkipWaiting,
    DownloadOffline,
}

impl ControlMessage {
    /// Parse the wire form. Unknown messages are `None`, never an error.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "skipWaiting" => Some(Self::SkipWaiting),
            "downloadOffline" => Some(Self::DownloadOffline),
            _ => None,
        }
    }
}

/// What handling a control message did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    /// A skip-waiting request; carries the activation if one ran now
    Activation(Option<Activation>),
    /// A fill request and its counts
    Fill(FillReport),
    /// Message not recognized
    Ignored,
}

/// Reconciler for one deployment generation
pub struct Reconciler {
    store: Arc<dyn CacheStore>,
    fetcher: Arc<dyn Fetcher>,
    deployment: Deployment,
    partitions: PartitionNames,
    concurrency: usize,
    lifecycle: Lifecycle,
    eager_activation: bool,
}

impl Reconciler {
    pub fn new(
        store: Arc<dyn CacheStore>,
        fetcher: Arc<dyn Fetcher>,
        deployment: Deployment,
    ) -> Self {
        Self {
            store,
            fetcher,
            deployment,
            partitions: PartitionNames::default(),
            concurrency: DEFAULT_CONCURRENCY,
            lifecycle: Lifecycle::Installing,
            eager_activation: false,
        }
    }

    pub fn with_partitions(mut self, partitions: PartitionNames) -> Self {
        self.partitions = partitions;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn deployment(&self) -> &Deployment {
        &self.deployment
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Whether this generation will activate as soon as it may
    pub fn is_eager(&self) -> bool {
        self.eager_activation
    }

    /// Stage the core shell into the temp partition.
    ///
    /// Every fetch bypasses intermediary caches and must come back 2xx.
    /// On any failure the temp partition is left exactly as it was and the
    /// generation stays in [`Lifecycle::Installing`].
    pub async fn install(&mut self) -> KitbagResult<usize> {
        // A fresh generation always requests eager takeover
        self.eager_activation = true;

        let urls: Vec<String> = self
            .deployment
            .core_shell()
            .iter()
            .map(|path| self.deployment.resource_url(path))
            .collect();
        debug!("staging {} core shell resources", urls.len());

        let fetcher = Arc::clone(&self.fetcher);
        let fetched: Vec<(String, StoredResponse)> = stream::iter(urls)
            .map(|url| {
                let fetcher = Arc::clone(&fetcher);
                async move {
                    let response = fetcher.fetch(&url, FetchMode::Reload).await?;
                    if !response.ok() {
                        return Err(KitbagError::fetch_status(&url, response.status));
                    }
                    Ok((url, response))
                }
            })
            .buffer_unordered(self.concurrency)
            .try_collect()
            .await?;

        // All fetches landed; replace whatever an older install staged
        self.store.drop_partition(&self.partitions.temp).await?;
        let staged = fetched.len();
        for (url, response) in fetched {
            self.store.put(&self.partitions.temp, &url, response).await?;
        }

        self.lifecycle = Lifecycle::Waiting;
        info!("{} core shell resources staged", staged);
        Ok(staged)
    }

    /// Reconcile the content partition and take over serving.
    ///
    /// Failures inside reconciliation do not propagate: the partitions are
    /// destroyed so the next install starts cold, and the result reports
    /// [`Activation::Reset`]. The generation ends up activated either way.
    pub async fn activate(&mut self) -> KitbagResult<Activation> {
        let activation = match self.reconcile().await {
            Ok(activation) => activation,
            Err(e) => {
                warn!("cache reconciliation failed, resetting: {}", e);
                self.destroy_partitions().await?;
                Activation::Reset {
                    reason: e.to_string(),
                }
            }
        };
        self.lifecycle = Lifecycle::Activated;
        Ok(activation)
    }

    async fn reconcile(&self) -> KitbagResult<Activation> {
        let baseline = read_baseline(self.store.as_ref(), &self.partitions).await?;

        let Some(baseline) = baseline else {
            self.store.drop_partition(&self.partitions.content).await?;
            let promoted = self.promote_temp().await?;
            self.persist_baseline().await?;
            info!("cold start: {} resources promoted", promoted);
            return Ok(Activation::ColdStart { promoted });
        };

        // An entry survives only if both generations declare its path with
        // the same digest
        let manifest = self.deployment.manifest();
        let mut kept = 0;
        let mut evicted = 0;
        for key in self.store.keys(&self.partitions.content).await? {
            let keep = match routing::resource_path(self.deployment.origin(), &key) {
                Some(path) => match (manifest.digest(&path), baseline.digest(&path)) {
                    (Some(new), Some(old)) => new == old,
                    _ => false,
                },
                None => false,
            };
            if keep {
                kept += 1;
            } else {
                self.store.delete(&self.partitions.content, &key).await?;
                evicted += 1;
            }
        }

        let promoted = self.promote_temp().await?;
        self.persist_baseline().await?;
        info!(
            "upgrade: {} kept, {} evicted, {} promoted",
            kept, evicted, promoted
        );
        Ok(Activation::Upgraded {
            kept,
            evicted,
            promoted,
        })
    }

    /// Move every staged entry into content, then drop the temp partition
    async fn promote_temp(&self) -> KitbagResult<usize> {
        let keys = self.store.keys(&self.partitions.temp).await?;
        let mut promoted = 0;
        for key in &keys {
            if let Some(response) = self.store.get(&self.partitions.temp, key).await? {
                self.store
                    .put(&self.partitions.content, key, response)
                    .await?;
                promoted += 1;
            }
        }
        self.store.drop_partition(&self.partitions.temp).await?;
        Ok(promoted)
    }

    async fn persist_baseline(&self) -> KitbagResult<()> {
        let json = self.deployment.manifest().to_json()?;
        self.store
            .put(
                &self.partitions.manifest,
                MANIFEST_KEY,
                StoredResponse::new(200, json),
            )
            .await
    }

    async fn destroy_partitions(&self) -> KitbagResult<()> {
        for partition in [
            &self.partitions.content,
            &self.partitions.temp,
            &self.partitions.manifest,
        ] {
            self.store.drop_partition(partition).await?;
        }
        Ok(())
    }

    /// Route one request.
    ///
    /// Non-GET methods, foreign origins, and undeclared paths pass
    /// through. The document entry point is network-first with cached
    /// fallback; every other declared path is cache-first.
    pub async fn serve(&self, method: &str, url: &str) -> KitbagResult<ServeOutcome> {
        if method != "GET" {
            return Ok(ServeOutcome::PassThrough);
        }
        let Some(path) = routing::request_path(self.deployment.origin(), url) else {
            return Ok(ServeOutcome::PassThrough);
        };
        if !self.deployment.manifest().contains(&path) {
            return Ok(ServeOutcome::PassThrough);
        }

        let key = self.deployment.resource_url(&path);
        if path == ROOT_PATH {
            self.network_first(&key).await
        } else {
            self.cache_first(&key).await
        }
    }

    async fn network_first(&self, key: &str) -> KitbagResult<ServeOutcome> {
        match self.fetcher.fetch(key, FetchMode::Normal).await {
            Ok(response) => {
                // Whatever the status, the fresh response replaces the
                // cached copy
                self.store
                    .put(&self.partitions.content, key, response.clone())
                    .await?;
                Ok(ServeOutcome::Served {
                    response,
                    source: ServedFrom::Network,
                })
            }
            Err(e) => {
                debug!("network-first fetch failed for {}: {}", key, e);
                match self.store.get(&self.partitions.content, key).await? {
                    Some(response) => Ok(ServeOutcome::Served {
                        response,
                        source: ServedFrom::Cache,
                    }),
                    None => Err(e),
                }
            }
        }
    }

    async fn cache_first(&self, key: &str) -> KitbagResult<ServeOutcome> {
        if let Some(response) = self.store.get(&self.partitions.content, key).await? {
            return Ok(ServeOutcome::Served {
                response,
                source: ServedFrom::Cache,
            });
        }

        let response = self.fetcher.fetch(key, FetchMode::Normal).await?;
        // Only successful responses populate the cache lazily
        if response.ok() {
            self.store
                .put(&self.partitions.content, key, response.clone())
                .await?;
        }
        Ok(ServeOutcome::Served {
            response,
            source: ServedFrom::Network,
        })
    }

    /// Declared paths with no entry in the content partition
    pub async fn missing_paths(&self) -> KitbagResult<Vec<String>> {
        let mut cached = HashSet::new();
        for key in self.store.keys(&self.partitions.content).await? {
            if let Some(path) = routing::resource_path(self.deployment.origin(), &key) {
                cached.insert(path);
            }
        }

        let mut missing: Vec<String> = self
            .deployment
            .manifest()
            .paths()
            .filter(|path| !cached.contains(*path))
            .map(str::to_string)
            .collect();
        missing.sort();
        Ok(missing)
    }

    /// Fetch every declared resource the content partition is missing.
    ///
    /// Already cached entries are never refetched, so running this twice
    /// in a row fetches nothing the second time.
    pub async fn fill(&self) -> KitbagResult<FillReport> {
        let missing = self.missing_paths().await?;
        let already_cached = self.deployment.manifest().len() - missing.len();
        if missing.is_empty() {
            return Ok(FillReport {
                fetched: 0,
                already_cached,
            });
        }
        debug!("filling {} missing resources", missing.len());

        let urls: Vec<String> = missing
            .iter()
            .map(|path| self.deployment.resource_url(path))
            .collect();

        let fetcher = Arc::clone(&self.fetcher);
        let mut fetches = stream::iter(urls)
            .map(|url| {
                let fetcher = Arc::clone(&fetcher);
                async move {
                    let response = fetcher.fetch(&url, FetchMode::Normal).await?;
                    if !response.ok() {
                        return Err(KitbagError::fetch_status(&url, response.status));
                    }
                    Ok::<_, KitbagError>((url, response))
                }
            })
            .buffer_unordered(self.concurrency);

        let mut fetched = 0;
        while let Some(result) = fetches.next().await {
            let (url, response) = result?;
            self.store
                .put(&self.partitions.content, &url, response)
                .await?;
            fetched += 1;
        }

        info!("{} resources fetched, {} already cached", fetched, already_cached);
        Ok(FillReport {
            fetched,
            already_cached,
        })
    }

    /// Request eager takeover.
    ///
    /// A waiting generation activates immediately and returns its
    /// activation. Otherwise the wish is recorded and honored once the
    /// generation reaches the waiting state.
    pub async fn skip_waiting(&mut self) -> KitbagResult<Option<Activation>> {
        if self.lifecycle == Lifecycle::Waiting {
            let activation = self.activate().await?;
            Ok(Some(activation))
        } else {
            self.eager_activation = true;
            Ok(None)
        }
    }

    /// Handle a raw control message from a page
    pub async fn handle_message(&mut self, raw: &str) -> KitbagResult<MessageOutcome> {
        match ControlMessage::parse(raw) {
            Some(ControlMessage::SkipWaiting) => {
                Ok(MessageOutcome::Activation(self.skip_waiting().await?))
            }
            Some(ControlMessage::DownloadOffline) => Ok(MessageOutcome::Fill(self.fill().await?)),
            None => {
                debug!("ignoring unknown control message {:?}", raw);
                Ok(MessageOutcome::Ignored)
            }
        }
    }
}

/// Read and parse the persisted manifest baseline, if any.
///
/// A present but unparseable baseline is an error; activation turns that
/// into a destructive reset rather than serving stale entries.
pub async fn read_baseline(
    store: &dyn CacheStore,
    partitions: &PartitionNames,
) -> KitbagResult<Option<ResourceManifest>> {
    let Some(stored) = store.get(&partitions.manifest, MANIFEST_KEY).await? else {
        return Ok(None);
    };
    let text = std::str::from_utf8(&stored.body).map_err(|e| KitbagError::ManifestInvalid {
        reason: format!("baseline is not utf-8: {e}"),
    })?;
    ResourceManifest::parse(text).map(Some)
}
