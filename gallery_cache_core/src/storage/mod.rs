//! Host persistent store abstraction
//!
//! The cache store sits on top of a synchronous, string-keyed store in the
//! spirit of browser `localStorage`. Implementations must be safe to share
//! between tasks; each individual key operation is atomic, nothing more.

use crate::error::{Result, StorageError};
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub mod factory;
pub mod file;
pub mod memory;
pub mod noop;

pub use factory::StorageFactory;
pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use noop::NoopStorage;

/// Trait for host store implementations
pub trait StorageBackend: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// Read a value, `Ok(None)` when the key is absent
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    ///
    /// Fails with [`StorageError::QuotaExceeded`] when the store is full.
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key; removing an absent key is not an error
    fn remove_item(&self, key: &str) -> Result<()>;

    /// Snapshot of every key currently stored
    fn keys(&self) -> Result<Vec<String>>;
}

/// Bytes an item occupies for quota accounting
pub(crate) fn item_size(key: &str, value: &str) -> usize {
    key.len() + value.len()
}

/// Reject a write that would push `items` past `quota`
pub(crate) fn check_quota(
    items: &BTreeMap<String, String>,
    key: &str,
    value: &str,
    quota: Option<usize>,
) -> Result<()> {
    let Some(limit) = quota else {
        return Ok(());
    };

    let current: usize = items.iter().map(|(k, v)| item_size(k, v)).sum();
    let replaced = items.get(key).map_or(0, |old| item_size(key, old));
    let required = current - replaced + item_size(key, value);

    if required > limit {
        return Err(StorageError::quota_exceeded(key, required, limit).into());
    }
    Ok(())
}

pub(crate) fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
