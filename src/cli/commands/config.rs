//! Config command - show or edit configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager};
use crate::error::{SwCacheError, SwCacheResult};
use crate::ui::{self, UiContext};
use std::path::PathBuf;

/// Keys accepted by `config set`
const VALID_KEYS: &[&str] = &[
    "general.log_format",
    "general.journal",
    "app.origin",
    "cache.base_name",
    "cache.staging_name",
    "cache.manifest_name",
    "cache.manifest_key",
    "version.url",
    "version.include_build_number",
    "assets.core",
    "network.timeout_secs",
    "network.max_body_mb",
    "storage.dir",
];

/// Execute the config command
pub async fn execute(args: ConfigArgs, config: &Config, manager: &ConfigManager) -> SwCacheResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
        Some(ConfigAction::Init { force }) => init_config(manager, force).await?,
        Some(ConfigAction::Set { key, value }) => set_value(manager, config, &key, &value).await?,
    }

    Ok(())
}

fn show_config(config: &Config) -> SwCacheResult<()> {
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

async fn init_config(manager: &ConfigManager, force: bool) -> SwCacheResult<()> {
    let ctx = UiContext::detect();
    let path = manager.path();

    if path.exists() && !force {
        ui::step_warn_hint(
            &ctx,
            &format!("Config already exists at {}", path.display()),
            "Use --force to overwrite",
        );
        return Ok(());
    }

    manager.save(&Config::default()).await?;
    ui::step_ok_detail(&ctx, "Configuration initialized", &path.display().to_string());
    Ok(())
}

async fn set_value(
    manager: &ConfigManager,
    config: &Config,
    key: &str,
    value: &str,
) -> SwCacheResult<()> {
    let ctx = UiContext::detect();
    let mut config = config.clone();

    if let Err(e) = apply(&mut config, key, value) {
        if matches!(e, SwCacheError::User(_)) && !VALID_KEYS.contains(&key) {
            ui::step_error_detail(&ctx, "Unknown config key", key);
            ui::remark(&ctx, &format!("Valid keys: {}", VALID_KEYS.join(", ")));
        }
        return Err(e);
    }

    // Refuse to persist settings the lifecycle would reject
    config.validate()?;
    manager.save(&config).await?;
    ui::step_ok(&ctx, &format!("Set {} = {}", key, value));
    Ok(())
}

/// Apply a dot-separated key to the config
fn apply(config: &mut Config, key: &str, value: &str) -> SwCacheResult<()> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["general", "log_format"] => config.general.log_format = value.to_string(),
        ["general", "journal"] => config.general.journal = parse_bool(value)?,

        ["app", "origin"] => config.app.origin = value.to_string(),

        ["cache", "base_name"] => config.cache.base_name = value.to_string(),
        ["cache", "staging_name"] => config.cache.staging_name = value.to_string(),
        ["cache", "manifest_name"] => config.cache.manifest_name = value.to_string(),
        ["cache", "manifest_key"] => config.cache.manifest_key = value.to_string(),

        ["version", "url"] => config.version.url = value.to_string(),
        ["version", "include_build_number"] => {
            config.version.include_build_number = parse_bool(value)?
        }

        ["assets", "core"] => {
            config.assets.core = value
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        ["network", "timeout_secs"] => config.network.timeout_secs = parse_number(value)?,
        ["network", "max_body_mb"] => config.network.max_body_mb = parse_number(value)?,

        ["storage", "dir"] => {
            config.storage.dir = if value.is_empty() {
                None
            } else {
                Some(PathBuf::from(value))
            }
        }

        _ => return Err(SwCacheError::User(format!("Unknown config key: {}", key))),
    }
    Ok(())
}

fn parse_bool(value: &str) -> SwCacheResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(SwCacheError::User(format!(
            "Invalid boolean value: {}. Use true/false",
            value
        ))),
    }
}

fn parse_number<T: std::str::FromStr>(value: &str) -> SwCacheResult<T> {
    value
        .parse()
        .map_err(|_| SwCacheError::User(format!("Invalid number: {}", value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_known_keys() {
        let mut config = Config::default();
        apply(&mut config, "app.origin", "https://pwa.example.org/").unwrap();
        apply(&mut config, "version.include_build_number", "yes").unwrap();
        apply(&mut config, "assets.core", "index.html, main.dart.js,").unwrap();
        apply(&mut config, "network.timeout_secs", "5").unwrap();

        assert_eq!(config.app.origin, "https://pwa.example.org/");
        assert!(config.version.include_build_number);
        assert_eq!(config.assets.core, vec!["index.html", "main.dart.js"]);
        assert_eq!(config.network.timeout_secs, 5);
    }

    #[test]
    fn apply_rejects_unknown_key_and_bad_values() {
        let mut config = Config::default();
        assert!(apply(&mut config, "cache.size", "10").is_err());
        assert!(apply(&mut config, "general.journal", "maybe").is_err());
        assert!(apply(&mut config, "network.max_body_mb", "-1").is_err());
    }

    #[test]
    fn valid_keys_all_apply() {
        for key in VALID_KEYS {
            let mut config = Config::default();
            let value = match *key {
                "general.journal" | "version.include_build_number" => "true",
                "network.timeout_secs" | "network.max_body_mb" => "10",
                _ => "x",
            };
            assert!(apply(&mut config, key, value).is_ok(), "{} rejected", key);
        }
    }

    #[tokio::test]
    async fn set_refuses_invalid_settings() {
        let temp = tempfile::TempDir::new().unwrap();
        let manager = ConfigManager::with_path(temp.path().join("config.toml"));

        let result = set_value(
            &manager,
            &Config::default(),
            "cache.staging_name",
            "flutter-app-cache-tmp",
        )
        .await;

        assert!(matches!(result, Err(SwCacheError::SettingsInvalid(_))));
        assert!(!manager.path().exists());
    }
}
