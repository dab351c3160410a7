//! Config command - show or edit configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager};
use crate::error::{KitbagError, KitbagResult};
use crate::ui::{self, UiContext};
use std::path::PathBuf;

/// Execute the config command
pub async fn execute(args: ConfigArgs, manager: &ConfigManager, config: &Config) -> KitbagResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config),
        Some(ConfigAction::Path) => show_path(manager),
        Some(ConfigAction::Set { key, value }) => set_value(manager, config, &key, &value).await?,
    }

    Ok(())
}

fn show_config(config: &Config) {
    let toml =
        toml::to_string_pretty(config).unwrap_or_else(|_| "Error serializing config".to_string());
    println!("{}", toml);
}

fn show_path(manager: &ConfigManager) {
    println!("{}", manager.path().display());
}

async fn set_value(
    manager: &ConfigManager,
    config: &Config,
    key: &str,
    value: &str,
) -> KitbagResult<()> {
    let ctx = UiContext::detect();
    let mut config = config.clone();

    // Parse dot-separated key path
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["deployment", "origin"] => config.deployment.origin = value.to_string(),
        ["deployment", "manifest_path"] => config.deployment.manifest_path = value.to_string(),
        ["deployment", "core_shell"] => {
            config.deployment.core_shell = value
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        ["cache", "dir"] => config.cache.dir = Some(PathBuf::from(value)),
        ["cache", "partitions", "content"] => config.cache.partitions.content = value.to_string(),
        ["cache", "partitions", "temp"] => config.cache.partitions.temp = value.to_string(),
        ["cache", "partitions", "manifest"] => {
            config.cache.partitions.manifest = value.to_string()
        }

        ["fetch", "concurrency"] => config.fetch.concurrency = parse_usize(value)?,

        _ => {
            ui::step_error_detail(&ctx, "Unknown config key", key);
            ui::remark(&ctx, "Valid keys:");
            print_valid_keys();
            return Ok(());
        }
    }

    manager.save(&config).await?;
    ui::step_ok(&ctx, &format!("Set {} = {}", key, value));

    Ok(())
}

fn parse_usize(value: &str) -> KitbagResult<usize> {
    value
        .parse()
        .map_err(|_| KitbagError::User(format!("Invalid number: {}", value)))
}

fn print_valid_keys() {
    let keys = [
        "deployment.origin",
        "deployment.manifest_path",
        "deployment.core_shell",
        "cache.dir",
        "cache.partitions.content",
        "cache.partitions.temp",
        "cache.partitions.manifest",
        "fetch.concurrency",
    ];

    for key in keys {
        eprintln!("  {}", key);
    }
}
