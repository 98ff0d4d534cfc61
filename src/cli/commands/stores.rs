//! Stores command - list persisted cache stores

use crate::cli::args::{OutputFormat, StoresArgs};
use crate::cli::factory;
use crate::config::Config;
use crate::error::SwCacheResult;
use crate::store::{CacheStorage, ManifestEntry, StoreNames};
use crate::ui::{self, UiContext};
use console::style;
use serde::Serialize;

/// What a store is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreRole {
    /// Content store the manifest points at
    Active,
    /// Content store of another version
    Content,
    Staging,
    Manifest,
    Other,
}

impl StoreRole {
    fn label(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Content => "content",
            Self::Staging => "staging",
            Self::Manifest => "manifest",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Serialize)]
struct StoreRow {
    name: String,
    role: StoreRole,
    entries: usize,
}

/// Execute the stores command
pub async fn execute(args: StoresArgs, config: &Config) -> SwCacheResult<()> {
    let settings = config.worker_settings()?;
    let storage = factory::create_storage(config);
    let rows = collect_rows(&*storage, &settings.names).await?;

    if rows.is_empty() {
        match args.format {
            OutputFormat::Json => println!("[]"),
            OutputFormat::Plain => {}
            OutputFormat::Table => ui::step_info(&UiContext::detect(), "No cache stores"),
        }
        return Ok(());
    }

    match args.format {
        OutputFormat::Table => print_table(&rows),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Plain => {
            for row in &rows {
                println!("{}", row.name);
            }
        }
    }
    Ok(())
}

async fn collect_rows(storage: &dyn CacheStorage, names: &StoreNames) -> SwCacheResult<Vec<StoreRow>> {
    let active = ManifestEntry::load(storage, names)
        .await?
        .map(|entry| names.content(&entry.version));

    let mut rows = Vec::new();
    for name in storage.names().await? {
        let role = classify(&name, names, active.as_deref());
        let entries = storage.keys(&name).await?.len();
        rows.push(StoreRow { name, role, entries });
    }
    Ok(rows)
}

fn classify(name: &str, names: &StoreNames, active: Option<&str>) -> StoreRole {
    if Some(name) == active {
        StoreRole::Active
    } else if name == names.staging {
        StoreRole::Staging
    } else if name == names.manifest {
        StoreRole::Manifest
    } else if names.is_content_store(name) {
        StoreRole::Content
    } else {
        StoreRole::Other
    }
}

fn print_table(rows: &[StoreRow]) {
    println!(
        "{:<40} {:<10} {:>8}",
        style("STORE").bold(),
        style("ROLE").bold(),
        style("ENTRIES").bold()
    );
    println!("{}", "-".repeat(60));

    for row in rows {
        let role = match row.role {
            StoreRole::Active => style(row.role.label()).green(),
            StoreRole::Staging => style(row.role.label()).yellow(),
            StoreRole::Content => style(row.role.label()).red(),
            StoreRole::Manifest | StoreRole::Other => style(row.role.label()).dim(),
        };
        println!("{:<40} {:<10} {:>8}", row.name, role, row.entries);
    }

    println!();
    println!("{} store(s)", rows.len());
}
