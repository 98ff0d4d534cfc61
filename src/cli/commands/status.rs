//! Status command - active version and store health

use crate::cli::factory;
use crate::config::Config;
use crate::error::SwCacheResult;
use crate::ui::{self, UiContext};

/// Execute the status command
pub async fn execute(config: &Config) -> SwCacheResult<()> {
    let ctx = UiContext::detect();
    let worker = factory::resume_worker(config).await?;
    let status = worker.status().await?;

    ui::section(&ctx, "Application");
    ui::key_value(&ctx, "Origin", &config.app.origin);
    ui::key_value(&ctx, "Version descriptor", &worker.settings().version_url);

    ui::section(&ctx, "Cache");
    match &status.manifest_version {
        Some(version) => ui::key_value_status(&ctx, "Manifest version", version, true),
        None => ui::key_value_status(&ctx, "Manifest version", "none (never activated)", false),
    }
    match (&status.manifest_version, &status.active_store) {
        _ if status.degraded => ui::key_value_status(
            &ctx,
            "Active store",
            "none (degraded, run: swcache update)",
            false,
        ),
        (Some(_), Some(store)) => ui::key_value(&ctx, "Active store", store),
        _ => ui::key_value(&ctx, "Active store", "none"),
    }
    if status.staging_present {
        ui::key_value_status(
            &ctx,
            "Staging",
            "present (run: swcache activate)",
            false,
        );
    } else {
        ui::key_value_status(&ctx, "Staging", "empty", true);
    }
    ui::key_value(&ctx, "Stores", &status.stores.len().to_string());
    ui::key_value(&ctx, "Storage", &config.storage_dir().display().to_string());

    Ok(())
}
