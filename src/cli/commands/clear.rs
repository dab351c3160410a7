//! Clear command - remove all cached data

use crate::cli::args::ClearArgs;
use crate::config::Config;
use crate::error::KitbagResult;
use crate::store::CacheStore;
use crate::ui::{self, UiContext};
use tracing::info;

/// Execute the clear command
pub async fn execute(args: ClearArgs, config: &Config) -> KitbagResult<()> {
    let ctx = UiContext::detect().with_auto_yes(args.yes);
    let store = super::open_store(config);
    let names = &config.cache.partitions;

    let mut existing = Vec::new();
    for partition in [&names.content, &names.temp, &names.manifest] {
        if store.partition_exists(partition).await? {
            existing.push(partition.clone());
        }
    }

    if existing.is_empty() {
        ui::step_info(&ctx, "Nothing to clear");
        return Ok(());
    }

    let message = format!("Remove all cached data in {}?", store.root().display());
    if !ui::confirm(&ctx, &message, false).await? {
        ui::step_info(&ctx, "Aborted");
        return Ok(());
    }

    for partition in &existing {
        store.drop_partition(partition).await?;
        info!("dropped partition {}", partition);
    }

    ui::step_ok_detail(
        &ctx,
        "Cache cleared",
        &format!("{} partitions removed", existing.len()),
    );
    Ok(())
}
