//! Install command - pre-fetch the application shell

use crate::cli::factory;
use crate::config::Config;
use crate::error::SwCacheResult;
use crate::lifecycle::Installation;
use crate::ui::{self, PrefetchProgress, UiContext};
use crate::worker::ServiceWorker;

/// Execute the install command
pub async fn execute(config: &Config) -> SwCacheResult<()> {
    let ctx = UiContext::detect();
    let worker = factory::new_worker(config)?;
    run_install(&ctx, &worker).await?;
    ui::remark(&ctx, "Run `swcache activate` to start serving this build");
    Ok(())
}

/// Install with a progress bar over the core assets
pub(crate) async fn run_install(
    ctx: &UiContext,
    worker: &ServiceWorker,
) -> SwCacheResult<Installation> {
    let progress = PrefetchProgress::new(ctx, worker.settings().core_assets.len());
    let result = worker.install(&|url| progress.on_asset(url)).await;
    progress.finish();

    let installation = result?;
    ui::step_ok_detail(
        ctx,
        &format!("Staged {} assets", installation.staged),
        &installation.staging_store,
    );
    Ok(installation)
}
