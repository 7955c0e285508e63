//! Builders for test stores

use gallery_cache_core::storage::{MemoryStorage, StorageBackend};
use gallery_cache_core::test_utils::ManualClock;
use gallery_cache_core::{CacheStore, PolicyTable};
use std::sync::Arc;
use std::time::Duration;

/// Start time used by test stores, an arbitrary instant in 2023
pub const TEST_START_MILLIS: u64 = 1_700_000_000_000;

/// A store wired to a manual clock and an inspectable backend
pub struct TestStore<B: StorageBackend + 'static = MemoryStorage> {
    pub store: CacheStore,
    pub clock: Arc<ManualClock>,
    pub storage: Arc<B>,
}

impl<B: StorageBackend + 'static> TestStore<B> {
    /// Move the store's clock forward
    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }

    /// Raw value under a namespaced key
    pub fn raw(&self, cache_type: &str, identifier: &str) -> Option<String> {
        let key = format!("{}{cache_type}_{identifier}", self.store.namespace());
        self.storage.get_item(&key).ok().flatten()
    }
}

/// Builder for [`TestStore`]
pub struct TestStoreBuilder {
    start_millis: u64,
    policies: PolicyTable,
    quota_bytes: Option<usize>,
    fixed_version: Option<String>,
    refresh_throttle: Option<Duration>,
}

impl Default for TestStoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestStoreBuilder {
    pub fn new() -> Self {
        Self {
            start_millis: TEST_START_MILLIS,
            policies: PolicyTable::default(),
            quota_bytes: None,
            fixed_version: None,
            refresh_throttle: None,
        }
    }

    pub fn start_at(mut self, millis: u64) -> Self {
        self.start_millis = millis;
        self
    }

    pub fn with_policies(mut self, policies: PolicyTable) -> Self {
        self.policies = policies;
        self
    }

    pub fn with_quota(mut self, quota_bytes: usize) -> Self {
        self.quota_bytes = Some(quota_bytes);
        self
    }

    pub fn with_version(mut self, version: &str) -> Self {
        self.fixed_version = Some(version.to_string());
        self
    }

    pub fn with_refresh_throttle(mut self, throttle: Duration) -> Self {
        self.refresh_throttle = Some(throttle);
        self
    }

    /// Build over a fresh memory store
    pub fn build(self) -> TestStore<MemoryStorage> {
        let storage = Arc::new(match self.quota_bytes {
            Some(quota) => MemoryStorage::with_quota(quota),
            None => MemoryStorage::new(),
        });
        self.build_with(storage)
    }

    /// Build over a caller-supplied backend
    pub fn build_with<B: StorageBackend + 'static>(self, storage: Arc<B>) -> TestStore<B> {
        let clock = Arc::new(ManualClock::new(self.start_millis));

        let mut builder = CacheStore::builder()
            .backend(storage.clone())
            .clock(clock.clone())
            .policies(self.policies);
        if let Some(version) = self.fixed_version {
            builder = builder.fixed_version(version);
        }
        if let Some(throttle) = self.refresh_throttle {
            builder = builder.refresh_throttle(throttle);
        }

        let store = match builder.build() {
            Ok(store) => store,
            Err(e) => panic!("test store configuration is invalid: {e}"),
        };

        TestStore {
            store,
            clock,
            storage,
        }
    }
}
