//! Terminal output for the CLI
//!
//! Uses `cliclack` for spinners and framed log lines in interactive
//! terminals, falling back to tagged plain lines (`[OK]`, `[WARN]`, ...)
//! in CI or when output is piped.
//!
//! ```rust,ignore
//! use swcache::ui::{self, UiContext, PrefetchProgress};
//!
//! let ctx = UiContext::detect();
//! let progress = PrefetchProgress::new(&ctx, settings.core_assets.len());
//! let installation = worker.install(&|url| progress.on_asset(url)).await?;
//! progress.finish();
//! ui::step_ok_detail(&ctx, "Installed", &installation.staging_store);
//! ```

mod context;
mod output;
mod progress;
mod prompts;
mod theme;

pub use context::UiContext;
pub use output::{
    key_value, key_value_status, remark, section, step_error_detail, step_info, step_ok,
    step_ok_detail, step_warn, step_warn_hint,
};
pub use progress::{PrefetchProgress, TaskSpinner};
pub use prompts::confirm;
pub use theme::{init_theme, SwCacheTheme};
