//! Storage factory for building backends from configuration

use crate::config::{StorageConfig, StorageKind};
use crate::error::Result;
use crate::storage::{FileStorage, MemoryStorage, NoopStorage, StorageBackend};
use std::sync::Arc;

/// Factory for creating storage backends
pub struct StorageFactory;

impl StorageFactory {
    /// Create a backend based on configuration
    pub fn create(config: &StorageConfig) -> Result<Arc<dyn StorageBackend>> {
        let backend: Arc<dyn StorageBackend> = match config.backend {
            StorageKind::File => {
                let path = config.resolved_path();
                let storage = match config.quota_bytes {
                    Some(quota) => FileStorage::open_with_quota(path, quota)?,
                    None => FileStorage::open(path)?,
                };
                Arc::new(storage)
            }
            StorageKind::Memory => match config.quota_bytes {
                Some(quota) => Arc::new(MemoryStorage::with_quota(quota)),
                None => Arc::new(MemoryStorage::new()),
            },
            StorageKind::None => Arc::new(NoopStorage::new()),
        };

        log::debug!("Created {} storage backend", backend.name());
        Ok(backend)
    }

    /// Unbounded memory backend
    pub fn memory() -> Arc<dyn StorageBackend> {
        Arc::new(MemoryStorage::new())
    }

    /// Backend that stores nothing
    pub fn noop() -> Arc<dyn StorageBackend> {
        Arc::new(NoopStorage::new())
    }
}
