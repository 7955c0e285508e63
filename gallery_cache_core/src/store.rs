//! The cache store
//!
//! [`CacheStore`] is a TTL-bounded key-value layer over a [`StorageBackend`].
//! Entries are JSON documents stored under `{namespace}{type}_{identifier}`;
//! each carries its own deadline, priority and payload fingerprint.
//!
//! Storage faults never escape `get`, `put`, the clears or the sweeps. A
//! failed read is a miss, a corrupted entry is deleted and reported as a
//! miss, and a write that hits the quota triggers one round of priority
//! eviction and one retry before it is dropped.
//!
//! The store is cheap to clone; clones share the backend, counters and
//! notification channel.

use crate::clock::{Clock, HOUR_MILLIS, SystemClock};
use crate::config::{DEFAULT_NAMESPACE, DEFAULT_VERSION_KEY, StoreConfig};
use crate::entry::{CacheEntry, CacheKey, EntrySummary, type_prefix};
use crate::error::{Result, ValidationError};
use crate::notify::{DEFAULT_CHANNEL_CAPACITY, DataUpdate, UpdateNotifier};
use crate::policy::{CachePolicy, PolicyTable};
use crate::stats::{CORRUPTED_LABEL, CacheStats};
use crate::storage::{MemoryStorage, StorageBackend};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;

/// Share of entries dropped when a write hits the storage quota
pub const QUOTA_EVICTION_FRACTION: f64 = 1.0 / 3.0;

/// Cache store handle
#[derive(Clone)]
pub struct CacheStore {
    pub(crate) inner: Arc<StoreInner>,
}

pub(crate) struct StoreInner {
    pub(crate) backend: Arc<dyn StorageBackend>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) policies: PolicyTable,
    pub(crate) namespace: String,
    pub(crate) version_key: String,
    pub(crate) fixed_version: Option<String>,
    pub(crate) refresh_throttle: Option<Duration>,
    /// Last successful background refresh per storage key
    pub(crate) last_refresh: Mutex<HashMap<String, u64>>,
    pub(crate) notifier: UpdateNotifier,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
}

/// A namespace key and its parsed entry, `None` when unparseable
type ScannedEntry = (String, Option<CacheEntry>);

/// Builder for [`CacheStore`]
pub struct CacheStoreBuilder {
    backend: Option<Arc<dyn StorageBackend>>,
    clock: Option<Arc<dyn Clock>>,
    policies: PolicyTable,
    namespace: String,
    version_key: String,
    fixed_version: Option<String>,
    refresh_throttle: Option<Duration>,
    channel_capacity: usize,
}

impl Default for CacheStoreBuilder {
    fn default() -> Self {
        Self {
            backend: None,
            clock: None,
            policies: PolicyTable::default(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            version_key: DEFAULT_VERSION_KEY.to_string(),
            fixed_version: None,
            refresh_throttle: None,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl CacheStoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a store configuration
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        Ok(Self {
            policies: config.policy_table()?,
            namespace: config.namespace.clone(),
            version_key: config.version_key.clone(),
            fixed_version: config.version.clone(),
            refresh_throttle: config.refresh_throttle(),
            ..Self::default()
        })
    }

    pub fn backend(mut self, backend: Arc<dyn StorageBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn policies(mut self, policies: PolicyTable) -> Self {
        self.policies = policies;
        self
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn version_key(mut self, version_key: impl Into<String>) -> Self {
        self.version_key = version_key.into();
        self
    }

    /// Pin the version instead of bucketing by hour
    pub fn fixed_version(mut self, version: impl Into<String>) -> Self {
        self.fixed_version = Some(version.into());
        self
    }

    pub fn refresh_throttle(mut self, throttle: Duration) -> Self {
        self.refresh_throttle = Some(throttle);
        self
    }

    pub fn notification_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Build the store and run the version check before handing it out
    pub fn build(self) -> Result<CacheStore> {
        if self.namespace.is_empty() {
            return Err(ValidationError::invalid_policy(
                "namespace",
                "namespace prefix must not be empty",
            )
            .into());
        }

        let store = CacheStore {
            inner: Arc::new(StoreInner {
                backend: self
                    .backend
                    .unwrap_or_else(|| Arc::new(MemoryStorage::new())),
                clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
                policies: self.policies,
                namespace: self.namespace,
                version_key: self.version_key,
                fixed_version: self.fixed_version,
                refresh_throttle: self.refresh_throttle,
                last_refresh: Mutex::new(HashMap::new()),
                notifier: UpdateNotifier::new(self.channel_capacity),
                hit_count: AtomicU64::new(0),
                miss_count: AtomicU64::new(0),
            }),
        };

        store.check_version();
        Ok(store)
    }
}

impl CacheStore {
    pub fn builder() -> CacheStoreBuilder {
        CacheStoreBuilder::new()
    }

    pub fn namespace(&self) -> &str {
        &self.inner.namespace
    }

    pub fn policies(&self) -> &PolicyTable {
        &self.inner.policies
    }

    pub fn policy_for(&self, cache_type: &str) -> CachePolicy {
        self.inner.policies.policy_for(cache_type)
    }

    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.inner.backend
    }

    pub(crate) fn now(&self) -> u64 {
        self.inner.clock.now_millis()
    }

    pub(crate) fn storage_key(&self, cache_type: &str, identifier: &str) -> String {
        CacheKey::new(cache_type, identifier).storage_key(&self.inner.namespace)
    }

    /// Version the store expects to find persisted
    pub fn current_version(&self) -> String {
        match &self.inner.fixed_version {
            Some(version) => version.clone(),
            None => (self.now() / HOUR_MILLIS).to_string(),
        }
    }

    /// Flush every entry if the persisted version differs from the current one
    ///
    /// Returns whether a flush happened. Runs during [`CacheStoreBuilder::build`].
    pub fn check_version(&self) -> bool {
        let current = self.current_version();
        let persisted = match self.inner.backend.get_item(&self.inner.version_key) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Failed to read cache version marker: {e}");
                None
            }
        };

        let flushed = match persisted {
            Some(previous) if previous != current => {
                log::info!("Cache version changed ({previous} -> {current}), clearing cache");
                self.clear_all();
                true
            }
            _ => false,
        };

        if let Err(e) = self
            .inner
            .backend
            .set_item(&self.inner.version_key, &current)
        {
            log::warn!("Failed to persist cache version marker: {e}");
        }
        flushed
    }

    /// Store `payload` under `(cache_type, identifier)`
    ///
    /// Returns whether the entry reached storage. Failures are logged, never
    /// returned.
    pub fn put<T: Serialize + ?Sized>(&self, cache_type: &str, payload: &T, identifier: &str) -> bool {
        match serde_json::to_value(payload) {
            Ok(value) => self.put_value(cache_type, value, identifier),
            Err(e) => {
                log::warn!("Failed to serialize {cache_type} ({identifier}) for caching: {e}");
                false
            }
        }
    }

    /// Store an already-serialized payload
    pub fn put_value(&self, cache_type: &str, payload: Value, identifier: &str) -> bool {
        let policy = self.policy_for(cache_type);
        let entry = CacheEntry::new(cache_type, payload, self.now(), &policy);
        let key = self.storage_key(cache_type, identifier);

        let raw = match entry.to_json() {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("Failed to encode cache entry {key}: {e}");
                return false;
            }
        };

        let stored = self.write_with_retry(&key, &raw);
        if stored {
            log::debug!(
                "Cached {cache_type} ({identifier}), ttl {}s, priority {}",
                policy.ttl.as_secs(),
                policy.priority
            );
        }
        stored
    }

    fn write_with_retry(&self, key: &str, raw: &str) -> bool {
        let first = match self.inner.backend.set_item(key, raw) {
            Ok(()) => return true,
            Err(e) => e,
        };

        if !first.is_quota_exceeded() {
            log::warn!("Failed to write cache entry {key}: {first}");
            return false;
        }

        log::warn!("Storage full writing {key}, evicting low priority entries");
        self.evict_fraction(QUOTA_EVICTION_FRACTION);

        match self.inner.backend.set_item(key, raw) {
            Ok(()) => true,
            Err(e) => {
                log::error!("Failed to write cache entry {key} after eviction: {e}");
                false
            }
        }
    }

    /// Read and deserialize a live payload
    ///
    /// Expired and corrupted entries are deleted and reported as misses. A
    /// payload that does not fit `T` is a miss but stays in storage.
    pub fn get<T: DeserializeOwned>(&self, cache_type: &str, identifier: &str) -> Option<T> {
        let key = self.storage_key(cache_type, identifier);

        let Some(entry) = self.read_live(&key) else {
            self.inner.miss_count.fetch_add(1, Ordering::Relaxed);
            return None;
        };

        match serde_json::from_value(entry.payload) {
            Ok(value) => {
                self.inner.hit_count.fetch_add(1, Ordering::Relaxed);
                log::debug!(
                    "Cache hit: {cache_type} ({identifier}), {}s remaining",
                    entry.expires_at.saturating_sub(self.now()) / 1000
                );
                Some(value)
            }
            Err(e) => {
                self.inner.miss_count.fetch_add(1, Ordering::Relaxed);
                log::warn!("Cached {cache_type} ({identifier}) has an unexpected shape: {e}");
                None
            }
        }
    }

    /// Full live entry including metadata, without touching hit counters
    pub fn get_entry(&self, cache_type: &str, identifier: &str) -> Option<CacheEntry> {
        self.read_live(&self.storage_key(cache_type, identifier))
    }

    /// Whether a live entry exists
    pub fn contains(&self, cache_type: &str, identifier: &str) -> bool {
        self.get_entry(cache_type, identifier).is_some()
    }

    /// Lazy expiry: the only read path to stored entries
    pub(crate) fn read_live(&self, key: &str) -> Option<CacheEntry> {
        let raw = match self.inner.backend.get_item(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("Failed to read cache entry {key}: {e}");
                return None;
            }
        };

        let entry = match CacheEntry::from_json(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Dropping corrupted cache entry {key}: {e}");
                self.remove_key(key);
                return None;
            }
        };

        if entry.is_expired(self.now()) {
            log::debug!("Cache entry expired: {key}");
            self.remove_key(key);
            return None;
        }
        Some(entry)
    }

    fn remove_key(&self, key: &str) -> bool {
        match self.inner.backend.remove_item(key) {
            Ok(()) => {
                if self.inner.refresh_throttle.is_some() {
                    self.last_refresh_lock().remove(key);
                }
                true
            }
            Err(e) => {
                log::warn!("Failed to remove cache entry {key}: {e}");
                false
            }
        }
    }

    /// Keys owned by this store
    fn namespace_keys(&self) -> Vec<String> {
        match self.inner.backend.keys() {
            Ok(keys) => keys
                .into_iter()
                .filter(|k| k.starts_with(&self.inner.namespace) && *k != self.inner.version_key)
                .collect(),
            Err(e) => {
                log::warn!("Failed to list cache keys: {e}");
                Vec::new()
            }
        }
    }

    fn scan(&self) -> Vec<ScannedEntry> {
        self.namespace_keys()
            .into_iter()
            .filter_map(|key| match self.inner.backend.get_item(&key) {
                Ok(Some(raw)) => {
                    let entry = CacheEntry::from_json(&raw).ok();
                    Some((key, entry))
                }
                Ok(None) => None,
                Err(e) => {
                    log::warn!("Failed to read cache entry {key}: {e}");
                    None
                }
            })
            .collect()
    }

    /// Remove expired and corrupted entries; returns how many were removed
    pub fn evict_expired(&self) -> usize {
        let now = self.now();
        let removed = self
            .scan()
            .into_iter()
            .filter(|(_, entry)| entry.as_ref().is_none_or(|e| e.is_expired(now)))
            .filter(|(key, _)| self.remove_key(key))
            .count();

        if removed > 0 {
            log::info!("Removed {removed} expired cache entries");
        }
        removed
    }

    /// Remove the lowest ranked `fraction` of entries
    ///
    /// Entries rank by priority, then age, lowest first. Corrupted entries
    /// are deleted during the scan and don't count. Returns the number of
    /// entries evicted.
    pub fn evict_by_priority(&self, fraction: f64) -> Result<usize> {
        if !fraction.is_finite() || !(0.0..=1.0).contains(&fraction) {
            return Err(ValidationError::invalid_fraction(fraction).into());
        }
        Ok(self.evict_fraction(fraction))
    }

    fn evict_fraction(&self, fraction: f64) -> usize {
        let mut ranked: Vec<(String, CacheEntry)> = Vec::new();
        for (key, entry) in self.scan() {
            match entry {
                Some(entry) => ranked.push((key, entry)),
                None => {
                    self.remove_key(&key);
                }
            }
        }

        ranked.sort_by_key(|(_, entry)| (entry.priority.rank(), entry.stored_at));

        let count = (ranked.len() as f64 * fraction).floor() as usize;
        let evicted = ranked
            .iter()
            .take(count)
            .filter(|(key, _)| self.remove_key(key))
            .count();

        log::info!("Evicted {evicted} low priority cache entries");
        evicted
    }

    /// Clear one entry, or every entry of a type when `identifier` is `None`
    ///
    /// Type-wide clears also match on the stored type so that clearing
    /// `brand` leaves `brand_detail` alone.
    pub fn clear_type(&self, cache_type: &str, identifier: Option<&str>) -> usize {
        if let Some(identifier) = identifier {
            let key = self.storage_key(cache_type, identifier);
            let existed = matches!(self.inner.backend.get_item(&key), Ok(Some(_)));
            let removed = usize::from(existed && self.remove_key(&key));
            log::debug!("Cleared {cache_type} ({identifier})");
            return removed;
        }

        let prefix = type_prefix(&self.inner.namespace, cache_type);
        let removed = self
            .scan()
            .into_iter()
            .filter(|(key, entry)| {
                key.starts_with(&prefix)
                    && entry.as_ref().is_none_or(|e| e.cache_type == cache_type)
            })
            .filter(|(key, _)| self.remove_key(key))
            .count();

        log::info!("Cleared {removed} {cache_type} cache entries");
        removed
    }

    /// Remove every entry under the namespace
    pub fn clear_all(&self) -> usize {
        let removed = self
            .namespace_keys()
            .iter()
            .filter(|key| self.remove_key(key))
            .count();

        log::info!("Cleared all cache entries ({removed})");
        removed
    }

    /// Parseable entries under the namespace, expired ones included
    pub fn entries(&self) -> Vec<EntrySummary> {
        self.scan()
            .into_iter()
            .filter_map(|(key, entry)| {
                let entry = entry?;
                let prefix = type_prefix(&self.inner.namespace, &entry.cache_type);
                let identifier = key.strip_prefix(&prefix).unwrap_or_default().to_string();
                let size_bytes = self
                    .inner
                    .backend
                    .get_item(&key)
                    .ok()
                    .flatten()
                    .map_or(0, |raw| key.len() + raw.len());

                Some(EntrySummary {
                    identifier,
                    cache_type: entry.cache_type,
                    priority: entry.priority,
                    stored_at: entry.stored_at,
                    expires_at: entry.expires_at,
                    fingerprint: entry.fingerprint,
                    size_bytes,
                    key,
                })
            })
            .collect()
    }

    /// Footprint and per-type counts of the namespace
    pub fn stats(&self) -> CacheStats {
        let mut stats = CacheStats {
            hit_count: self.inner.hit_count.load(Ordering::Relaxed),
            miss_count: self.inner.miss_count.load(Ordering::Relaxed),
            ..CacheStats::default()
        };

        for key in self.namespace_keys() {
            let Ok(Some(raw)) = self.inner.backend.get_item(&key) else {
                continue;
            };

            stats.total_size_bytes += (key.len() + raw.len()) as u64;
            stats.item_count += 1;

            let label = CacheEntry::from_json(&raw)
                .map(|entry| entry.cache_type)
                .unwrap_or_else(|_| CORRUPTED_LABEL.to_string());
            *stats.type_counts.entry(label).or_default() += 1;
        }
        stats
    }

    /// Subscribe to background refresh notifications
    pub fn subscribe(&self) -> broadcast::Receiver<DataUpdate> {
        self.inner.notifier.subscribe()
    }

    pub(crate) fn last_refresh_lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, u64>> {
        self.inner
            .last_refresh
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Priority;
    use crate::test_utils::ManualClock;
    use serde_json::json;

    const START: u64 = 1_700_000_000_000;

    fn store_with(
        storage: Arc<MemoryStorage>,
        clock: Arc<ManualClock>,
        policies: PolicyTable,
    ) -> CacheStore {
        CacheStore::builder()
            .backend(storage)
            .clock(clock)
            .policies(policies)
            .build()
            .unwrap()
    }

    fn minute_policies() -> PolicyTable {
        PolicyTable::optimized()
    }

    #[test]
    fn test_put_then_get_round_trip() {
        let storage = Arc::new(MemoryStorage::new());
        let clock = Arc::new(ManualClock::new(START));
        let store = store_with(storage, clock, minute_policies());

        let payload = json!({"images": ["img1", "img2"], "count": 2});
        assert!(store.put("images", &payload, "brandA"));

        let cached: Option<Value> = store.get("images", "brandA");
        assert_eq!(cached, Some(payload));
    }

    #[test]
    fn test_typed_round_trip() {
        #[derive(Debug, PartialEq, Serialize, serde::Deserialize)]
        struct Brand {
            name: String,
            likes: u32,
        }

        let store = CacheStore::builder().build().unwrap();
        let brand = Brand {
            name: "Nanyi".to_string(),
            likes: 7,
        };
        store.put("brand_detail", &brand, "42");

        assert_eq!(store.get::<Brand>("brand_detail", "42"), Some(brand));
    }

    #[test]
    fn test_expired_entry_is_purged_on_read() {
        let storage = Arc::new(MemoryStorage::new());
        let clock = Arc::new(ManualClock::new(START));
        let store = store_with(storage.clone(), clock.clone(), minute_policies());

        store.put("images", &json!(["img1"]), "brandA");
        assert_eq!(
            store.get::<Value>("images", "brandA"),
            Some(json!(["img1"]))
        );

        clock.advance_millis(61_000);
        assert_eq!(store.get::<Value>("images", "brandA"), None);
        assert_eq!(
            storage.get_item("nanyi_cache_images_brandA").unwrap(),
            None
        );
    }

    #[test]
    fn test_entry_is_live_at_exact_deadline() {
        let clock = Arc::new(ManualClock::new(START));
        let store = store_with(Arc::new(MemoryStorage::new()), clock.clone(), minute_policies());

        store.put("images", &1, "");
        clock.advance_millis(60_000);
        assert_eq!(store.get::<i32>("images", ""), Some(1));
        clock.advance_millis(1);
        assert_eq!(store.get::<i32>("images", ""), None);
    }

    #[test]
    fn test_unknown_type_uses_default_ttl() {
        let clock = Arc::new(ManualClock::new(START));
        let store = store_with(
            Arc::new(MemoryStorage::new()),
            clock.clone(),
            PolicyTable::standard(),
        );

        store.put("avatars", &"x", "u1");
        let entry = store.get_entry("avatars", "u1").unwrap();
        assert_eq!(entry.expires_at - entry.stored_at, 5 * 60 * 1000);
        assert_eq!(entry.priority, Priority::Medium);
    }

    #[test]
    fn test_corrupted_entry_reads_as_miss_and_is_deleted() {
        let storage = Arc::new(MemoryStorage::new());
        let store = store_with(
            storage.clone(),
            Arc::new(ManualClock::new(START)),
            minute_policies(),
        );

        storage
            .set_item("nanyi_cache_brands_", "{not json")
            .unwrap();
        assert_eq!(store.get::<Value>("brands", ""), None);
        assert_eq!(storage.get_item("nanyi_cache_brands_").unwrap(), None);
    }

    #[test]
    fn test_shape_mismatch_is_miss_but_kept() {
        let storage = Arc::new(MemoryStorage::new());
        let store = store_with(
            storage.clone(),
            Arc::new(ManualClock::new(START)),
            minute_policies(),
        );

        store.put("filters", &json!({"a": 1}), "");
        assert_eq!(store.get::<Vec<String>>("filters", ""), None);
        assert!(storage.get_item("nanyi_cache_filters_").unwrap().is_some());
    }

    #[test]
    fn test_overwrite_replaces_in_place() {
        let storage = Arc::new(MemoryStorage::new());
        let clock = Arc::new(ManualClock::new(START));
        let store = store_with(storage.clone(), clock.clone(), minute_policies());

        store.put("brands", &1, "");
        clock.advance_millis(50_000);
        store.put("brands", &2, "");
        clock.advance_millis(50_000);

        assert_eq!(store.get::<i32>("brands", ""), Some(2));
        assert_eq!(store.stats().item_count, 1);
    }

    #[test]
    fn test_evict_expired_removes_expired_and_corrupted() {
        let storage = Arc::new(MemoryStorage::new());
        let clock = Arc::new(ManualClock::new(START));
        let policies = minute_policies().with_policy(
            "filters",
            CachePolicy::new(Duration::from_secs(600), false, Priority::Medium),
        );
        let store = store_with(storage.clone(), clock.clone(), policies);

        store.put("images", &1, "a");
        store.put("filters", &2, "");
        storage.set_item("nanyi_cache_junk_", "???").unwrap();
        storage.set_item("unrelated", "keep").unwrap();

        clock.advance_millis(120_000);
        assert_eq!(store.evict_expired(), 2);

        assert_eq!(store.get::<i32>("filters", ""), Some(2));
        assert_eq!(storage.get_item("unrelated").unwrap().as_deref(), Some("keep"));
        assert!(storage.get_item("nanyi_version").unwrap().is_some());
    }

    #[test]
    fn test_evict_by_priority_removes_lowest_third() {
        let storage = Arc::new(MemoryStorage::new());
        let clock = Arc::new(ManualClock::new(START));
        let policies = PolicyTable::new(Duration::from_secs(3600))
            .with_policy("low", CachePolicy::new(Duration::from_secs(3600), false, Priority::Low))
            .with_policy("high", CachePolicy::new(Duration::from_secs(3600), false, Priority::High));
        let store = store_with(storage, clock.clone(), policies);

        // Older high priority entries, newer low priority ones
        store.put("high", &1, "h1");
        clock.advance_millis(10);
        store.put("high", &2, "h2");
        clock.advance_millis(10);
        store.put("medium", &3, "m1");
        clock.advance_millis(10);
        store.put("low", &4, "l2");
        clock.advance_millis(10);
        store.put("low", &5, "l1");
        clock.advance_millis(10);
        store.put("medium", &6, "m2");

        assert_eq!(store.evict_by_priority(1.0 / 3.0).unwrap(), 2);

        assert!(!store.contains("low", "l2"));
        assert!(!store.contains("low", "l1"));
        assert!(store.contains("medium", "m1"));
        assert!(store.contains("medium", "m2"));
        assert!(store.contains("high", "h1"));
        assert!(store.contains("high", "h2"));
    }

    #[test]
    fn test_evict_by_priority_uses_age_within_priority() {
        let clock = Arc::new(ManualClock::new(START));
        let store = store_with(Arc::new(MemoryStorage::new()), clock.clone(), minute_policies());

        store.put("filters", &1, "old");
        clock.advance_millis(5);
        store.put("filters", &2, "new");

        assert_eq!(store.evict_by_priority(0.5).unwrap(), 1);
        assert!(!store.contains("filters", "old"));
        assert!(store.contains("filters", "new"));
    }

    #[test]
    fn test_evict_by_priority_rejects_bad_fraction() {
        let store = CacheStore::builder().build().unwrap();
        assert!(store.evict_by_priority(1.5).is_err());
        assert!(store.evict_by_priority(-0.1).is_err());
        assert!(store.evict_by_priority(f64::NAN).is_err());
        assert_eq!(store.evict_by_priority(0.0).unwrap(), 0);
    }

    #[test]
    fn test_quota_failure_evicts_and_retries() {
        let clock = Arc::new(ManualClock::new(START));
        let filler = "x".repeat(60);

        // Measure one entry against an unbounded store
        let probe = Arc::new(MemoryStorage::new());
        let probe_store = store_with(probe.clone(), clock.clone(), minute_policies());
        let marker_size = probe.used_bytes();
        probe_store.put("filters", &filler, "0");
        let entry_size = probe.used_bytes() - marker_size;

        let storage = Arc::new(MemoryStorage::with_quota(marker_size + 3 * entry_size + 5));
        let store = store_with(storage.clone(), clock.clone(), minute_policies());
        for id in ["0", "1", "2"] {
            assert!(store.put("filters", &filler, id));
            clock.advance_millis(10);
        }

        assert!(store.put("filters", &filler, "3"));
        assert!(!store.contains("filters", "0"));
        assert!(store.contains("filters", "1"));
        assert!(store.contains("filters", "2"));
        assert!(store.contains("filters", "3"));
    }

    #[test]
    fn test_oversized_write_is_dropped_silently() {
        let storage = Arc::new(MemoryStorage::with_quota(400));
        let store = store_with(
            storage.clone(),
            Arc::new(ManualClock::new(START)),
            minute_policies(),
        );

        store.put("filters", &"small", "a");
        let huge = "x".repeat(1_000);
        assert!(!store.put("images", &huge, "big"));
        assert_eq!(store.get::<String>("images", "big"), None);
    }

    #[test]
    fn test_clear_type_with_identifier() {
        let store = CacheStore::builder().build().unwrap();
        store.put("images", &1, "a");
        store.put("images", &2, "b");

        assert_eq!(store.clear_type("images", Some("a")), 1);
        assert_eq!(store.clear_type("images", Some("a")), 0);
        assert!(store.contains("images", "b"));
    }

    #[test]
    fn test_clear_type_does_not_touch_overlapping_types() {
        let store = CacheStore::builder().build().unwrap();
        store.put("brand", &1, "x");
        store.put("brand_detail", &2, "x");
        store.put("brand", &3, "");

        assert_eq!(store.clear_type("brand", None), 2);
        assert!(!store.contains("brand", "x"));
        assert!(store.contains("brand_detail", "x"));
    }

    #[test]
    fn test_clear_all_keeps_unrelated_keys() {
        let storage = Arc::new(MemoryStorage::new());
        let store = store_with(
            storage.clone(),
            Arc::new(ManualClock::new(START)),
            minute_policies(),
        );
        storage.set_item("theme", "dark").unwrap();
        store.put("brands", &1, "");
        store.put("images", &2, "a");

        assert_eq!(store.clear_all(), 2);
        assert_eq!(storage.get_item("theme").unwrap().as_deref(), Some("dark"));
        assert!(storage.get_item("nanyi_version").unwrap().is_some());
    }

    #[test]
    fn test_version_change_flushes_entries() {
        let storage = Arc::new(MemoryStorage::new());
        let clock = Arc::new(ManualClock::new(START));

        let store = store_with(storage.clone(), clock.clone(), minute_policies());
        store.put("brands", &1, "");
        drop(store);

        clock.advance_millis(HOUR_MILLIS);
        let store = store_with(storage.clone(), clock.clone(), minute_policies());

        assert!(storage.get_item("nanyi_cache_brands_").unwrap().is_none());
        assert_eq!(
            storage.get_item("nanyi_version").unwrap(),
            Some(store.current_version())
        );
    }

    #[test]
    fn test_same_version_keeps_entries() {
        let storage = Arc::new(MemoryStorage::new());
        let store = CacheStore::builder()
            .backend(storage.clone())
            .fixed_version("2.1.0")
            .build()
            .unwrap();
        store.put("brands", &1, "");

        let reopened = CacheStore::builder()
            .backend(storage.clone())
            .fixed_version("2.1.0")
            .build()
            .unwrap();
        assert_eq!(reopened.get::<i32>("brands", ""), Some(1));
        assert!(!reopened.check_version());

        let upgraded = CacheStore::builder()
            .backend(storage)
            .fixed_version("2.2.0")
            .build()
            .unwrap();
        assert_eq!(upgraded.get::<i32>("brands", ""), None);
    }

    #[test]
    fn test_first_run_without_marker_does_not_flush() {
        let storage = Arc::new(MemoryStorage::new());
        let clock = Arc::new(ManualClock::new(START));
        let policies = minute_policies();
        // Entries written by an older process that never persisted a marker
        let entry = CacheEntry::new("brands", json!(1), START, &policies.policy_for("brands"));
        storage
            .set_item("nanyi_cache_brands_", &entry.to_json().unwrap())
            .unwrap();

        let store = store_with(storage, clock, policies);
        assert_eq!(store.get::<i32>("brands", ""), Some(1));
    }

    #[test]
    fn test_stats_counts_types_and_corruption() {
        let storage = Arc::new(MemoryStorage::new());
        let store = store_with(
            storage.clone(),
            Arc::new(ManualClock::new(START)),
            minute_policies(),
        );
        store.put("images", &1, "a");
        store.put("images", &2, "b");
        store.put("brands", &3, "");
        storage.set_item("nanyi_cache_bad_", "nope").unwrap();

        store.get::<i32>("images", "a");
        store.get::<i32>("images", "zzz");

        let stats = store.stats();
        assert_eq!(stats.item_count, 4);
        assert_eq!(stats.type_counts.get("images"), Some(&2));
        assert_eq!(stats.type_counts.get("brands"), Some(&1));
        assert_eq!(stats.type_counts.get("corrupted"), Some(&1));
        assert_eq!(stats.hit_count, 1);
        assert_eq!(stats.miss_count, 1);
        assert!(stats.total_size_bytes > 0);
    }

    #[test]
    fn test_entries_lists_identifiers() {
        let store = CacheStore::builder().build().unwrap();
        store.put("brand_detail", &1, "7");
        store.put("brands", &2, "");

        let mut entries = store.entries();
        entries.sort_by(|a, b| a.key.cmp(&b.key));

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].cache_type, "brand_detail");
        assert_eq!(entries[0].identifier, "7");
        assert_eq!(entries[1].cache_type, "brands");
        assert_eq!(entries[1].identifier, "");
        assert!(entries[0].size_bytes > entries[0].key.len());
    }

    #[test]
    fn test_empty_namespace_is_rejected() {
        assert!(CacheStore::builder().namespace("").build().is_err());
    }

    #[test]
    fn test_builder_from_config() {
        let config = StoreConfig {
            namespace: "app_".to_string(),
            version: Some("1".to_string()),
            ..StoreConfig::default()
        };
        let storage = Arc::new(MemoryStorage::new());
        let store = CacheStoreBuilder::from_config(&config)
            .unwrap()
            .backend(storage.clone())
            .build()
            .unwrap();

        store.put("brands", &1, "");
        assert!(storage.get_item("app_brands_").unwrap().is_some());
        assert_eq!(store.current_version(), "1");
    }
}
