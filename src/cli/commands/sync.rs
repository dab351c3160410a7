//! Sync command - fetch the deployed manifest and reconcile the cache

use crate::cli::args::SyncArgs;
use crate::config::Config;
use crate::error::{KitbagError, KitbagResult};
use crate::fetch::{FetchMode, Fetcher, HttpFetcher};
use crate::manifest::{Deployment, ResourceManifest};
use crate::reconciler::{self, Activation, Reconciler};
use crate::ui::{self, DownloadProgress, ProgressFetcher, TaskSpinner, UiContext};
use std::sync::Arc;

/// Execute the sync command
pub async fn execute(args: SyncArgs, config: &Config) -> KitbagResult<()> {
    let ctx = UiContext::detect();

    let origin = config.deployment.normalized_origin()?;
    let manifest_url = config.deployment.manifest_url()?;

    let fetcher = Arc::new(HttpFetcher::new()?);
    let store = Arc::new(super::open_store(config));
    let partitions = config.cache.partitions.clone();

    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start("Fetching deployed manifest...");
    let manifest = match fetch_manifest(fetcher.as_ref(), &manifest_url).await {
        Ok(manifest) => {
            spinner.stop(&format!(
                "Manifest fetched ({} resources declared)",
                manifest.len()
            ));
            manifest
        }
        Err(e) => {
            spinner.stop_error("Could not fetch the deployed manifest");
            return Err(e);
        }
    };

    // A corrupt baseline must not short-circuit; activation will reset it
    let baseline = reconciler::read_baseline(store.as_ref(), &partitions)
        .await
        .unwrap_or(None);
    if !args.force {
        if let Some(baseline) = &baseline {
            if baseline.diff(&manifest).is_unchanged() {
                ui::step_ok_detail(
                    &ctx,
                    "Cache already up to date",
                    &format!("{} resources", manifest.len()),
                );
                return Ok(());
            }
        }
    }

    let deployment = Deployment::new(origin, manifest, config.deployment.core_shell.clone())?;

    let progress = DownloadProgress::new(
        &ctx,
        "Staging core shell",
        deployment.core_shell().len() as u64,
    );
    let progress_fetcher = Arc::new(ProgressFetcher::new(fetcher.clone(), progress.clone()));

    let mut reconciler = Reconciler::new(store, progress_fetcher, deployment)
        .with_partitions(partitions)
        .with_concurrency(config.fetch.concurrency);

    let staged = reconciler.install().await;
    progress.finish();
    let staged = staged?;

    match reconciler.activate().await? {
        Activation::ColdStart { promoted } => {
            ui::step_ok_detail(
                &ctx,
                "Cache initialized",
                &format!("{} staged, {} promoted", staged, promoted),
            );
        }
        Activation::Upgraded {
            kept,
            evicted,
            promoted,
        } => {
            ui::step_ok_detail(
                &ctx,
                "Cache upgraded",
                &format!("{} kept, {} evicted, {} promoted", kept, evicted, promoted),
            );
        }
        Activation::Reset { reason } => {
            ui::step_error_detail(&ctx, "Cache was reset", &reason);
            return Err(KitbagError::User(
                "The cache could not be reconciled and was reset. Run kitbag sync again to rebuild it.".to_string(),
            ));
        }
    }

    let missing = reconciler.missing_paths().await?.len();
    if missing > 0 {
        ui::remark(
            &ctx,
            &format!("{} resources not yet cached. Run: kitbag fill", missing),
        );
    }

    Ok(())
}

/// Fetch and parse the deployed manifest, bypassing intermediary caches
async fn fetch_manifest(fetcher: &dyn Fetcher, url: &str) -> KitbagResult<ResourceManifest> {
    let response = fetcher.fetch(url, FetchMode::Reload).await?;
    if !response.ok() {
        return Err(KitbagError::fetch_status(url, response.status));
    }

    let text = std::str::from_utf8(&response.body).map_err(|e| KitbagError::ManifestInvalid {
        reason: format!("manifest is not utf-8: {e}"),
    })?;
    let manifest = ResourceManifest::parse(text)?;
    manifest.validate()?;
    Ok(manifest)
}
