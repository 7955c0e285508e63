//! File-backed host store
//!
//! All items live in one JSON object on disk. The file is read once at open
//! time and rewritten after every mutation through a temporary file and a
//! rename, so a crash leaves either the old or the new contents.

use crate::error::{Result, StorageError};
use crate::storage::{StorageBackend, check_quota, read_lock, write_lock};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Persistent store backed by a single JSON file
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    items: RwLock<BTreeMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl FileStorage {
    /// Open (or lazily create) the store at `path`
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let items = Self::load_from_disk(&path)?;
        log::debug!("Opened file storage at {} ({} items)", path.display(), items.len());

        Ok(Self {
            path,
            items: RwLock::new(items),
            quota_bytes: None,
        })
    }

    /// Open with a byte quota
    pub fn open_with_quota(path: impl Into<PathBuf>, quota_bytes: usize) -> Result<Self> {
        let mut storage = Self::open(path)?;
        storage.quota_bytes = Some(quota_bytes);
        Ok(storage)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_from_disk(path: &Path) -> Result<BTreeMap<String, String>> {
        if !path.exists() {
            return Ok(BTreeMap::new());
        }

        let data = fs::read_to_string(path).map_err(|e| StorageError::io(path, e))?;
        if data.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&data).map_err(|e| {
            StorageError::corrupted(path.display().to_string(), e.to_string()).into()
        })
    }

    fn save_to_disk(&self, items: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }

        let data = serde_json::to_string(items)?;
        let tmp_path = self.path.with_extension("json.tmp");

        fs::write(&tmp_path, data).map_err(|e| StorageError::io(&tmp_path, e))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| StorageError::io(&self.path, e))?;
        Ok(())
    }
}

impl StorageBackend for FileStorage {
    fn name(&self) -> &'static str {
        "file"
    }

    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(read_lock(&self.items).get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut items = write_lock(&self.items);
        check_quota(&items, key, value, self.quota_bytes)?;

        let previous = items.insert(key.to_string(), value.to_string());
        if let Err(e) = self.save_to_disk(&items) {
            // Keep memory in line with what is on disk
            match previous {
                Some(old) => items.insert(key.to_string(), old),
                None => items.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let mut items = write_lock(&self.items);
        if let Some(previous) = items.remove(key)
            && let Err(e) = self.save_to_disk(&items)
        {
            items.insert(key.to_string(), previous);
            return Err(e);
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(read_lock(&self.items).keys().cloned().collect())
    }
}
