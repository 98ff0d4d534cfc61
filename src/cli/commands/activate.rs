//! Activate command - reconcile staging into the versioned content store

use crate::cli::factory;
use crate::config::Config;
use crate::error::SwCacheResult;
use crate::lifecycle::Activation;
use crate::ui::{self, TaskSpinner, UiContext};
use crate::worker::ServiceWorker;

/// Execute the activate command
pub async fn execute(config: &Config) -> SwCacheResult<()> {
    let ctx = UiContext::detect();
    let worker = factory::resume_worker(config).await?;
    run_activate(&ctx, &worker).await?;
    Ok(())
}

/// Activate behind a spinner and summarize the outcome
pub(crate) async fn run_activate(
    ctx: &UiContext,
    worker: &ServiceWorker,
) -> SwCacheResult<Activation> {
    let mut spinner = TaskSpinner::new(ctx);
    spinner.start("Resolving published version...");

    let activation = match worker.activate().await {
        Ok(activation) => activation,
        Err(e) => {
            spinner.stop_error("Activation failed; cache stores discarded");
            return Err(e);
        }
    };

    spinner.stop(&format!("Activated version {}", activation.version));
    ui::key_value(ctx, "Content store", &activation.content_store);
    ui::key_value(ctx, "Outcome", &activation.outcome.to_string());
    ui::key_value(ctx, "Migrated", &activation.migrated.to_string());
    if !activation.evicted.is_empty() {
        ui::key_value(ctx, "Evicted", &activation.evicted.join(", "));
    }
    Ok(activation)
}
