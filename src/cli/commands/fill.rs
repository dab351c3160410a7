//! Fill command - download every declared resource missing from the cache

use crate::config::Config;
use crate::error::{KitbagError, KitbagResult};
use crate::fetch::HttpFetcher;
use crate::manifest::Deployment;
use crate::reconciler::{self, Reconciler};
use crate::ui::{self, DownloadProgress, ProgressFetcher, UiContext};
use std::sync::Arc;

/// Execute the fill command
pub async fn execute(config: &Config) -> KitbagResult<()> {
    let ctx = UiContext::detect();

    let origin = config.deployment.normalized_origin()?;
    let store = Arc::new(super::open_store(config));
    let partitions = config.cache.partitions.clone();

    // Fill works against the last synced manifest, not the deployed one
    let baseline = reconciler::read_baseline(store.as_ref(), &partitions)
        .await?
        .ok_or(KitbagError::ManifestMissing)?;
    let deployment = Deployment::new(origin, baseline, Vec::new())?;

    let fetcher = Arc::new(HttpFetcher::new()?);
    let reconciler = Reconciler::new(store, fetcher.clone(), deployment)
        .with_partitions(partitions)
        .with_concurrency(config.fetch.concurrency);

    let missing = reconciler.missing_paths().await?;
    if missing.is_empty() {
        ui::step_ok(&ctx, "Cache already complete");
        return Ok(());
    }

    let progress = DownloadProgress::new(&ctx, "Downloading", missing.len() as u64);
    let reconciler =
        reconciler.with_fetcher(Arc::new(ProgressFetcher::new(fetcher, progress.clone())));

    let report = reconciler.fill().await;
    progress.finish();
    let report = report?;

    ui::step_ok_detail(
        &ctx,
        "Cache filled",
        &format!(
            "{} fetched, {} already cached",
            report.fetched, report.already_cached
        ),
    );

    Ok(())
}
