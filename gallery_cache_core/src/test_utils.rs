//! Test utilities shared by unit tests and downstream crates
//!
//! Enabled for this crate's own tests and, through the `test-utils` feature,
//! for the workspace test-utils crate.

#![cfg(any(test, feature = "test-utils"))]

use crate::clock::Clock;
use crate::storage::FileStorage;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tempfile::TempDir;

/// Clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start_millis: u64) -> Self {
        Self {
            now: AtomicU64::new(start_millis),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.advance_millis(by.as_millis() as u64);
    }

    pub fn advance_millis(&self, millis: u64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }

    pub fn set(&self, millis: u64) {
        self.now.store(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// A file store inside a fresh temporary directory
///
/// Keep the returned `TempDir` alive for as long as the store is used.
pub fn temp_file_storage() -> std::io::Result<(TempDir, PathBuf, FileStorage)> {
    let dir = TempDir::new()?;
    let path = dir.path().join("store.json");
    let storage = FileStorage::open(&path).map_err(std::io::Error::other)?;
    Ok((dir, path, storage))
}
