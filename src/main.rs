//! Kitbag - Offline mirror and cache reconciler
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use kitbag::cli::{Cli, Commands};
use kitbag::config::ConfigManager;
use kitbag::error::KitbagResult;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> KitbagResult<()> {
    let cli = Cli::parse();

    // Initialize logging: 0 = warn (spinners only), 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("kitbag=warn"),
        1 => EnvFilter::new("kitbag=info"),
        _ => EnvFilter::new("kitbag=debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    // Init command doesn't need config loading
    if let Commands::Init(args) = cli.command {
        return kitbag::cli::commands::init(args).await;
    }

    let manager = ConfigManager::resolve(cli.config.clone());
    debug!("Using config at {}", manager.path().display());
    let config = manager.load().await?;

    // Dispatch to command
    match cli.command {
        Commands::Init(_) => unreachable!("Init handled above"),
        Commands::Sync(args) => kitbag::cli::commands::sync(args, &config).await,
        Commands::Fill => kitbag::cli::commands::fill(&config).await,
        Commands::Get(args) => kitbag::cli::commands::get(args, &config).await,
        Commands::Status(args) => kitbag::cli::commands::status(args, &config).await,
        Commands::Clear(args) => kitbag::cli::commands::clear(args, &config).await,
        Commands::Config(args) => kitbag::cli::commands::config(args, &manager, &config).await,
    }
}
