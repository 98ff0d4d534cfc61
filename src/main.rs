//! swcache - offline asset cache for progressive web apps
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use std::process::ExitCode;
use swcache::cli::{commands, Cli, Commands};
use swcache::config::{Config, ConfigManager};
use swcache::error::SwCacheResult;
use swcache::ui::{self, UiContext};
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

async fn run() -> SwCacheResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = config_manager.load().await?;

    init_logging(cli.verbose, &config);
    debug!("Loaded configuration from {}", config_manager.path().display());

    if UiContext::detect().use_fancy_output() {
        ui::init_theme();
    }

    match cli.command {
        Commands::Install => commands::install(&config).await,
        Commands::Activate => commands::activate(&config).await,
        Commands::Update => commands::update(&config).await,
        Commands::Fetch(args) => commands::fetch(args, &config).await,
        Commands::Message(args) => commands::message(args, &config).await,
        Commands::Stores(args) => commands::stores(args, &config).await,
        Commands::Status => commands::status(&config).await,
        Commands::Clear(args) => commands::clear(args, &config).await,
        Commands::Config(args) => commands::config(args, &config, &config_manager).await,
    }
}

/// 0 = warn (spinners only), 1 = info, 2+ = debug
fn init_logging(verbose: u8, config: &Config) {
    let filter = match verbose {
        0 => EnvFilter::new("swcache=warn"),
        1 => EnvFilter::new("swcache=info"),
        _ => EnvFilter::new("swcache=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if config.general.log_format == "json" {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}
