//! Message command - deliver a control message to the worker

use crate::cli::args::MessageArgs;
use crate::cli::factory;
use crate::config::Config;
use crate::error::SwCacheResult;
use crate::lifecycle::{ControlMessage, SKIP_WAITING};
use crate::ui::{self, UiContext};
use crate::worker::WorkerHooks;

/// Execute the message command
pub async fn execute(args: MessageArgs, config: &Config) -> SwCacheResult<()> {
    let ctx = UiContext::detect();
    let worker = factory::resume_worker(config).await?;

    match worker.on_message(&args.token).await {
        Some(ControlMessage::SkipWaiting) => {
            ui::step_ok(&ctx, "skipWaiting delivered: the waiting worker takes over now");
        }
        None => {
            ui::step_warn_hint(
                &ctx,
                &format!("Ignored message '{}'", args.token),
                &format!("Only '{}' is recognized", SKIP_WAITING),
            );
        }
    }
    Ok(())
}
