//! Status command - report cache health and coverage

use crate::cli::args::StatusArgs;
use crate::config::Config;
use crate::error::KitbagResult;
use crate::fetch::{FetchMode, Fetcher, HttpFetcher};
use crate::manifest::{Deployment, ResourceManifest};
use crate::reconciler::{self, Reconciler};
use console::{style, Emoji};
use std::sync::Arc;

static CHECK: Emoji<'_, '_> = Emoji("✓ ", "[OK] ");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "[FAIL] ");
static WARN: Emoji<'_, '_> = Emoji("⚠ ", "[WARN] ");

/// Execute the status command
pub async fn execute(args: StatusArgs, config: &Config) -> KitbagResult<()> {
    println!("{}", style("Kitbag Cache Status").bold().cyan());
    println!();

    let mut all_ok = true;

    println!("{}", style("Deployment:").bold());
    let origin = config.deployment.normalized_origin();
    match &origin {
        Ok(origin) => {
            println!("  {} Origin: {}", CHECK, origin);
            if let Ok(url) = config.deployment.manifest_url() {
                println!("  {} Manifest: {}", CHECK, url);
            }
        }
        Err(_) => {
            println!(
                "  {} {} - Set deployment.origin in kitbag.toml",
                CROSS,
                style("Origin not set").red()
            );
            all_ok = false;
        }
    }

    let store = super::open_store(config);
    let partitions = config.cache.partitions.clone();

    println!();
    println!("{}", style("Cache:").bold());
    println!("  {} Directory: {}", CHECK, store.root().display());

    let baseline = match reconciler::read_baseline(&store, &partitions).await {
        Ok(Some(baseline)) => baseline,
        Ok(None) => {
            println!(
                "  {} {} - Run: kitbag sync",
                WARN,
                style("No manifest baseline cached").yellow()
            );
            return Ok(());
        }
        Err(e) => {
            println!(
                "  {} {} - {}. Run: kitbag sync",
                CROSS,
                style("Baseline corrupt").red(),
                e
            );
            return Ok(());
        }
    };
    println!("  {} Resources declared: {}", CHECK, baseline.len());

    if let Ok(origin) = &origin {
        all_ok &= report_coverage(origin, config, &baseline).await?;
    }

    if !args.offline && origin.is_ok() {
        all_ok &= check_deployed(config, &baseline).await;
    }

    println!();
    if all_ok {
        println!("{}", style("Cache is complete and current").green().bold());
    } else {
        println!(
            "{}",
            style("Cache needs attention - see above for details")
                .yellow()
                .bold()
        );
    }

    Ok(())
}

/// Count cached resources against the baseline manifest.
async fn report_coverage(
    origin: &str,
    config: &Config,
    baseline: &ResourceManifest,
) -> KitbagResult<bool> {
    let store = super::open_store(config);
    let fetcher = Arc::new(HttpFetcher::new()?);
    let deployment = Deployment::new(origin.to_string(), baseline.clone(), Vec::new())?;
    let reconciler = Reconciler::new(Arc::new(store), fetcher, deployment)
        .with_partitions(config.cache.partitions.clone());

    let missing = reconciler.missing_paths().await?;
    let cached = baseline.len() - missing.len();

    if missing.is_empty() {
        println!(
            "  {} Coverage: {}",
            CHECK,
            style(format!("{}/{} resources cached", cached, baseline.len())).green()
        );
        Ok(true)
    } else {
        println!(
            "  {} Coverage: {} - Run: kitbag fill",
            WARN,
            style(format!("{}/{} resources cached", cached, baseline.len())).yellow()
        );
        Ok(false)
    }
}

/// Compare the cached baseline against the manifest currently deployed.
async fn check_deployed(config: &Config, baseline: &ResourceManifest) -> bool {
    println!();
    println!("{}", style("Deployed manifest:").bold());

    let Ok(url) = config.deployment.manifest_url() else {
        return true;
    };
    let Ok(fetcher) = HttpFetcher::new() else {
        return true;
    };

    let deployed = match fetcher.fetch(&url, FetchMode::Reload).await {
        Ok(response) if response.ok() => std::str::from_utf8(&response.body)
            .ok()
            .and_then(|text| ResourceManifest::parse(text).ok()),
        _ => None,
    };

    match deployed {
        Some(deployed) => {
            let diff = baseline.diff(&deployed);
            if diff.is_unchanged() {
                println!("  {} {}", CHECK, style("Cache matches the deployment").green());
                true
            } else {
                println!(
                    "  {} {} - {} added, {} changed, {} removed. Run: kitbag sync",
                    WARN,
                    style("Deployment changed").yellow(),
                    diff.added.len(),
                    diff.changed.len(),
                    diff.removed.len()
                );
                false
            }
        }
        None => {
            println!(
                "  {} {} - Could not fetch {}",
                CROSS,
                style("Unreachable").red(),
                url
            );
            false
        }
    }
}
