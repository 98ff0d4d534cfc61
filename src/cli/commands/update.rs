//! Update command - install then activate in one process

use super::activate::run_activate;
use super::install::run_install;
use crate::cli::factory;
use crate::config::Config;
use crate::error::SwCacheResult;
use crate::ui::UiContext;

/// Execute the update command
pub async fn execute(config: &Config) -> SwCacheResult<()> {
    let ctx = UiContext::detect();
    let worker = factory::new_worker(config)?;

    run_install(&ctx, &worker).await?;
    run_activate(&ctx, &worker).await?;
    Ok(())
}
