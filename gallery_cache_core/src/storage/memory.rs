//! In-memory host store
//!
//! Keeps items in an ordered map. An optional byte quota mimics the fixed
//! per-origin budget of browser storage so quota handling can be exercised
//! without a browser.

use crate::error::Result;
use crate::storage::{StorageBackend, check_quota, item_size, read_lock, write_lock};
use std::collections::BTreeMap;
use std::sync::RwLock;

/// In-memory store with an optional quota
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RwLock<BTreeMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryStorage {
    /// Create an unbounded memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a memory store that rejects writes beyond `quota_bytes`
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            items: RwLock::new(BTreeMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Bytes currently used (keys plus values)
    pub fn used_bytes(&self) -> usize {
        read_lock(&self.items)
            .iter()
            .map(|(k, v)| item_size(k, v))
            .sum()
    }

    pub fn len(&self) -> usize {
        read_lock(&self.items).len()
    }

    pub fn is_empty(&self) -> bool {
        read_lock(&self.items).is_empty()
    }
}

impl StorageBackend for MemoryStorage {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(read_lock(&self.items).get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut items = write_lock(&self.items);
        check_quota(&items, key, value, self.quota_bytes)?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        write_lock(&self.items).remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(read_lock(&self.items).keys().cloned().collect())
    }
}
