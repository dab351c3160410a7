//! Get command - fetch one resource through the cache routing rules

use crate::cli::args::GetArgs;
use crate::config::Config;
use crate::error::{KitbagError, KitbagResult};
use crate::fetch::HttpFetcher;
use crate::manifest::{Deployment, ROOT_PATH};
use crate::reconciler::{self, Reconciler, ServeOutcome, ServedFrom};
use crate::ui::{self, UiContext};
use std::sync::Arc;

/// Execute the get command
pub async fn execute(args: GetArgs, config: &Config) -> KitbagResult<()> {
    let ctx = UiContext::detect();

    let origin = config.deployment.normalized_origin()?;
    let store = Arc::new(super::open_store(config));
    let partitions = config.cache.partitions.clone();

    let baseline = reconciler::read_baseline(store.as_ref(), &partitions)
        .await?
        .ok_or(KitbagError::ManifestMissing)?;
    let deployment = Deployment::new(origin, baseline, Vec::new())?;

    let url = request_url(&deployment, &args.path);

    let fetcher = Arc::new(HttpFetcher::new()?);
    let reconciler = Reconciler::new(store, fetcher, deployment).with_partitions(partitions);

    match reconciler.serve("GET", &url).await? {
        ServeOutcome::PassThrough => {
            ui::step_warn_hint(
                &ctx,
                &format!("{} is not a declared resource", args.path),
                "only paths listed in the synced manifest are served",
            );
        }
        ServeOutcome::Served { response, source } => {
            let source_label = match source {
                ServedFrom::Cache => "cache",
                ServedFrom::Network => "network",
            };

            match args.out {
                Some(out) => {
                    tokio::fs::write(&out, &response.body)
                        .await
                        .map_err(|e| KitbagError::io(format!("writing {}", out.display()), e))?;
                    ui::step_ok_detail(
                        &ctx,
                        "Resource written",
                        &format!(
                            "{}, {} bytes from {}",
                            out.display(),
                            response.body.len(),
                            source_label
                        ),
                    );
                }
                None => {
                    ui::key_value(&ctx, "Source", source_label);
                    ui::key_value(&ctx, "Status", &response.status.to_string());
                    ui::key_value(&ctx, "Size", &format!("{} bytes", response.body.len()));
                }
            }
        }
    }

    Ok(())
}

/// Turn the positional argument into an absolute URL. Accepts a manifest
/// path, "/", or a full URL.
fn request_url(deployment: &Deployment, arg: &str) -> String {
    if arg.starts_with("http://") || arg.starts_with("https://") {
        return arg.to_string();
    }
    let path = arg.trim_start_matches('/');
    if path.is_empty() {
        deployment.resource_url(ROOT_PATH)
    } else {
        deployment.resource_url(path)
    }
}
