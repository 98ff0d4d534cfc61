//! Clear command - delete every store swcache manages

use crate::cli::args::ClearArgs;
use crate::cli::factory;
use crate::config::Config;
use crate::error::SwCacheResult;
use crate::journal::{self, Journal};
use crate::store::{CacheStorage, StoreNames};
use crate::ui::{self, UiContext};

/// Execute the clear command
pub async fn execute(args: ClearArgs, config: &Config) -> SwCacheResult<()> {
    let ctx = UiContext::detect().with_auto_yes(args.yes);
    let settings = config.worker_settings()?;
    let storage = factory::create_storage(config);

    if !ui::confirm(&ctx, "Delete the content, staging and manifest stores?", false).await? {
        ui::step_warn_hint(&ctx, "Nothing deleted", "Pass --yes to confirm");
        return Ok(());
    }

    let deleted = clear_stores(&*storage, &settings.names).await?;
    if deleted.is_empty() {
        ui::step_info(&ctx, "No stores to delete");
        return Ok(());
    }

    Journal::new(config)
        .record(
            journal::STORES_CLEARED,
            &serde_json::json!({ "stores": deleted }),
        )
        .await;
    ui::step_ok(&ctx, &format!("Deleted {} store(s)", deleted.len()));
    for name in &deleted {
        ui::remark(&ctx, name);
    }
    Ok(())
}

/// Delete the content family, staging and manifest stores
async fn clear_stores(storage: &dyn CacheStorage, names: &StoreNames) -> SwCacheResult<Vec<String>> {
    let mut deleted = Vec::new();
    for name in storage.names().await? {
        let managed = names.is_content_store(&name) || name == names.staging || name == names.manifest;
        if managed && storage.delete(&name).await? {
            deleted.push(name);
        }
    }
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::{RequestKey, Response};
    use crate::store::MemoryStorage;

    #[tokio::test]
    async fn clears_managed_stores_only() {
        let storage = MemoryStorage::new();
        let names = StoreNames {
            base: "flutter-app-cache".to_string(),
            staging: "flutter-temp-cache".to_string(),
            manifest: "flutter-app-manifest".to_string(),
            manifest_key: RequestKey::new("http://localhost:8080/manifest"),
        };
        for store in [
            "flutter-app-cache-1.0.0",
            "flutter-temp-cache",
            "flutter-app-manifest",
            "third-party",
        ] {
            storage.open(store).await.unwrap();
        }
        let key = RequestKey::new("http://localhost:8080/flutter.js");
        storage
            .put("third-party", &key, &Response::new(key.url(), 200, "x"))
            .await
            .unwrap();

        let deleted = clear_stores(&storage, &names).await.unwrap();

        assert_eq!(deleted.len(), 3);
        assert_eq!(storage.names().await.unwrap(), vec!["third-party".to_string()]);
    }
}
