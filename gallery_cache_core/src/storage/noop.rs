//! No-operation host store
//!
//! Accepts every write and forgets it immediately; every read misses. Used
//! when caching is disabled.

use crate::error::Result;
use crate::storage::StorageBackend;

/// A store that doesn't store anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStorage;

impl NoopStorage {
    pub fn new() -> Self {
        Self
    }
}

impl StorageBackend for NoopStorage {
    fn name(&self) -> &'static str {
        "none"
    }

    fn get_item(&self, _key: &str) -> Result<Option<String>> {
        Ok(None)
    }

    fn set_item(&self, _key: &str, _value: &str) -> Result<()> {
        Ok(())
    }

    fn remove_item(&self, _key: &str) -> Result<()> {
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}
