//! Opening the configured cache store

use crate::config::AppConfig;
use anyhow::{Context, Result};
use gallery_cache_core::{CacheStore, CacheStoreBuilder, StorageFactory};

/// Build the store described by `config`
///
/// Opening runs the version check, so a stale store is flushed here.
pub fn open_store(config: &AppConfig) -> Result<CacheStore> {
    let backend = StorageFactory::create(&config.storage).with_context(|| {
        format!(
            "Failed to open {} storage at {}",
            config.storage.backend,
            config.storage.resolved_path().display()
        )
    })?;

    CacheStoreBuilder::from_config(&config.store)
        .context("Invalid store configuration")?
        .backend(backend)
        .build()
        .context("Failed to build cache store")
}

#[cfg(test)]
mod tests {
    use super::*;
    use gallery_cache_core::StorageKind;
    use tempfile::TempDir;

    #[test]
    fn test_open_file_store() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.apply_cli_overrides(Some(temp_dir.path().join("store.json")));
        config.store.version = Some("1".to_string());

        let store = open_store(&config).unwrap();
        assert!(store.put("brands", &1, ""));

        let reopened = open_store(&config).unwrap();
        assert_eq!(reopened.get::<i32>("brands", ""), Some(1));
    }

    #[test]
    fn test_open_memory_store() {
        let mut config = AppConfig::default();
        config.storage.backend = StorageKind::Memory;

        let store = open_store(&config).unwrap();
        assert_eq!(store.backend().name(), "memory");
    }

    #[test]
    fn test_corrupted_store_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");
        std::fs::write(&path, "[oops").unwrap();

        let mut config = AppConfig::default();
        config.apply_cli_overrides(Some(path));
        assert!(open_store(&config).is_err());
    }
}
