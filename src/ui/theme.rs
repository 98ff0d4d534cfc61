//! Custom theme for cliclack prompts

use cliclack::ThemeState;
use console::Style;

/// swcache theme: blue while working, green once committed
#[derive(Debug, Clone, Default)]
pub struct SwCacheTheme;

impl cliclack::Theme for SwCacheTheme {
    fn bar_color(&self, state: &ThemeState) -> Style {
        match state {
            ThemeState::Active => Style::new().blue(),
            ThemeState::Error(_) => Style::new().red(),
            ThemeState::Cancel => Style::new().dim(),
            ThemeState::Submit => Style::new().blue().dim(),
        }
    }

    fn state_symbol_color(&self, state: &ThemeState) -> Style {
        match state {
            ThemeState::Active => Style::new().blue(),
            ThemeState::Error(_) => Style::new().red(),
            ThemeState::Cancel => Style::new().dim(),
            ThemeState::Submit => Style::new().green(),
        }
    }
}

/// Install the theme for every cliclack widget
pub fn init_theme() {
    cliclack::set_theme(SwCacheTheme);
}
