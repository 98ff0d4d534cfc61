//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// swcache - offline asset cache for progressive web apps
///
/// Runs the install and activate phases of a caching service worker against
/// a deployed app, and serves requests from the versioned cache stores.
#[derive(Parser, Debug)]
#[command(name = "swcache")]
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
    #[arg(short, long, global = true, env = "SWCACHE_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Pre-fetch the application shell into the staging store
    Install,

    /// Reconcile the staging store into the versioned content store
    Activate,

    /// Install then activate in one go
    Update,

    /// Route one request through the worker
    Fetch(FetchArgs),

    /// Deliver a control message to the worker
    Message(MessageArgs),

    /// List persisted cache stores
    Stores(StoresArgs),

    /// Show the active version and store health
    Status,

    /// Delete the content, staging and manifest stores
    Clear(ClearArgs),

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Arguments for the fetch command
#[derive(Parser, Debug)]
pub struct FetchArgs {
    /// URL, or path relative to the app origin
    pub target: String,

    /// Treat the request as a page navigation
    #[arg(short, long)]
    pub navigate: bool,

    /// HTTP method
    #[arg(short, long, default_value = "GET")]
    pub method: String,

    /// Write the response body to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the message command
#[derive(Parser, Debug)]
pub struct MessageArgs {
    /// Message token (e.g. skipWaiting)
    pub token: String,
}

/// Arguments for the stores command
#[derive(Parser, Debug)]
pub struct StoresArgs {
    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the clear command
#[derive(Parser, Debug)]
pub struct ClearArgs {
    /// Skip the confirmation prompt
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

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., app.origin)
        key: String,
        /// Value to set
        value: String,
    },
}

/// Output format for the stores command
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Store names only, one per line
    Plain,
}
