//! Confirmation prompt with CI/non-interactive fallback

use super::context::UiContext;
use crate::error::{SwCacheError, SwCacheResult};

/// Ask for confirmation
///
/// `--yes` approves; without a terminal the default is returned unasked.
pub async fn confirm(ctx: &UiContext, message: &str, default: bool) -> SwCacheResult<bool> {
    if ctx.auto_yes() {
        return Ok(true);
    }
    if !ctx.is_interactive() {
        return Ok(default);
    }

    // cliclack blocks on stdin
    let message = message.to_string();
    let answer = tokio::task::spawn_blocking(move || {
        cliclack::confirm(&message)
            .initial_value(default)
            .interact()
    })
    .await
    .map_err(|e| SwCacheError::Internal(format!("Prompt task failed: {}", e)))?;

    answer.map_err(|e| SwCacheError::User(format!("Prompt failed: {}", e)))
}
