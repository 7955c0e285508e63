//! Storage backend with scripted failures

use gallery_cache_core::storage::{MemoryStorage, StorageBackend};
use gallery_cache_core::{Result, StorageError};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Memory-backed storage that fails on demand
///
/// Lets tests drive the store's quota and fault handling without filling a
/// real quota.
///
/// # Examples
///
/// ```rust
/// use gallery_cache_test_utils::FlakyStorage;
/// use gallery_cache_core::StorageBackend;
///
/// let storage = FlakyStorage::new();
/// storage.fail_next_writes(1);
///
/// assert!(storage.set_item("k", "v").unwrap_err().is_quota_exceeded());
/// assert!(storage.set_item("k", "v").is_ok());
/// ```
#[derive(Debug, Default)]
pub struct FlakyStorage {
    inner: MemoryStorage,
    failing_writes: AtomicUsize,
    fail_all_writes: AtomicBool,
    fail_reads: AtomicBool,
    write_attempts: AtomicUsize,
}

impl FlakyStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the next `count` writes with a quota error
    pub fn fail_next_writes(&self, count: usize) {
        self.failing_writes.store(count, Ordering::SeqCst);
    }

    /// Reject every write with a quota error until switched off
    pub fn set_fail_all_writes(&self, fail: bool) {
        self.fail_all_writes.store(fail, Ordering::SeqCst);
    }

    /// Make reads fail with an unavailable error
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Number of `set_item` calls, failed ones included
    pub fn write_attempts(&self) -> usize {
        self.write_attempts.load(Ordering::SeqCst)
    }

    /// The wrapped store, bypassing any scripted failure
    pub fn inner(&self) -> &MemoryStorage {
        &self.inner
    }

    fn take_write_failure(&self) -> bool {
        if self.fail_all_writes.load(Ordering::SeqCst) {
            return true;
        }
        self.failing_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl StorageBackend for FlakyStorage {
    fn name(&self) -> &'static str {
        "flaky"
    }

    fn get_item(&self, key: &str) -> Result<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::unavailable("scripted read failure").into());
        }
        self.inner.get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        if self.take_write_failure() {
            return Err(StorageError::quota_exceeded(key, key.len() + value.len(), 0).into());
        }
        self.inner.set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.inner.remove_item(key)
    }

    fn keys(&self) -> Result<Vec<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::unavailable("scripted read failure").into());
        }
        self.inner.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_write_failures_run_out() {
        let storage = FlakyStorage::new();
        storage.fail_next_writes(2);

        assert!(storage.set_item("a", "1").is_err());
        assert!(storage.set_item("a", "1").is_err());
        assert!(storage.set_item("a", "1").is_ok());
        assert_eq!(storage.write_attempts(), 3);
    }

    #[test]
    fn test_fail_all_writes() {
        let storage = FlakyStorage::new();
        storage.set_fail_all_writes(true);
        assert!(storage.set_item("a", "1").is_err());

        storage.set_fail_all_writes(false);
        assert!(storage.set_item("a", "1").is_ok());
    }

    #[test]
    fn test_read_failures() {
        let storage = FlakyStorage::new();
        storage.set_item("a", "1").unwrap();
        storage.set_fail_reads(true);

        assert!(storage.get_item("a").is_err());
        assert!(storage.keys().is_err());
        assert_eq!(storage.inner().get_item("a").unwrap().as_deref(), Some("1"));
    }
}
