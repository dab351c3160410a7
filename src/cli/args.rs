//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Kitbag - Offline mirror for manifest-versioned web apps
///
/// Mirrors a deployed app into a local cache and reconciles it across
/// releases, refetching only resources whose content digest changed.
#[derive(Parser, Debug)]
#[command(name = "kitbag")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "KITBAG_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a project-local kitbag.toml config
    Init(InitArgs),

    /// Fetch the deployed manifest and reconcile the cache against it
    Sync(SyncArgs),

    /// Download every declared resource missing from the cache
    Fill,

    /// Fetch one resource through the cache routing rules
    Get(GetArgs),

    /// Show cache state and coverage
    Status(StatusArgs),

    /// Remove all cached data
    Clear(ClearArgs),

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Arguments for the init command
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Overwrite existing kitbag.toml
    #[arg(short, long)]
    pub force: bool,

    /// Target directory (defaults to current directory)
    #[arg(short, long)]
    pub path: Option<PathBuf>,
}

/// Arguments for the sync command
#[derive(Parser, Debug)]
pub struct SyncArgs {
    /// Reconcile even if the deployed manifest matches the cached one
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments for the get command
#[derive(Parser, Debug)]
pub struct GetArgs {
    /// Resource path (e.g. "main.js" or "/") or an absolute URL
    pub path: String,

    /// Write the response body to a file instead of describing it
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

/// Arguments for the status command
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Skip the network check against the deployed manifest
    #[arg(long)]
    pub offline: bool,
}

/// Arguments for the clear command
#[derive(Parser, Debug)]
pub struct ClearArgs {
    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., deployment.origin)
        key: String,
        /// Value to set
        value: String,
    },
}
