//! Cache-aside reads with background refresh
//!
//! `get_or_fetch` answers from the cache whenever it can. For types whose
//! policy enables update checks, a hit also schedules a background task that
//! refetches the value once it is close to expiry (or the origin's freshness
//! token no longer matches) and broadcasts the new payload as a
//! [`DataUpdate`].

use crate::notify::DataUpdate;
use crate::store::CacheStore;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Display;
use std::future::Future;
use tokio::runtime::Handle;

/// Remaining lifetime below `ttl / STALE_DIVISOR` counts as stale (20%)
const STALE_DIVISOR: u64 = 5;

impl CacheStore {
    /// Return the cached value or fetch, store and return a fresh one
    ///
    /// A cold miss awaits `fetch` and propagates its error unchanged. A hit
    /// never waits on `fetch`; see [`CacheStore::get_or_fetch_with_etag`].
    pub async fn get_or_fetch<T, E, F, Fut>(
        &self,
        cache_type: &str,
        identifier: &str,
        fetch: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        E: Display + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        self.get_or_fetch_with_etag(cache_type, identifier, None, fetch)
            .await
    }

    /// [`get_or_fetch`](CacheStore::get_or_fetch) with the origin's current
    /// freshness token, compared against the stored fingerprint
    pub async fn get_or_fetch_with_etag<T, E, F, Fut>(
        &self,
        cache_type: &str,
        identifier: &str,
        server_etag: Option<&str>,
        fetch: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        E: Display + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        if let Some(cached) = self.get::<T>(cache_type, identifier) {
            if self.policy_for(cache_type).check_update {
                self.spawn_refresh(
                    cache_type.to_string(),
                    identifier.to_string(),
                    server_etag.map(str::to_string),
                    fetch,
                );
            }
            return Ok(cached);
        }

        log::debug!("Cache miss: {cache_type} ({identifier}), fetching");
        let fresh = fetch().await?;
        self.store_fetched(cache_type, identifier, &fresh);
        Ok(fresh)
    }

    /// Whether the entry should be refetched
    ///
    /// False when the type's policy disables update checks. Otherwise true
    /// when no live entry exists, when `server_etag` differs from the stored
    /// fingerprint, or when less than 20% of the ttl remains.
    pub fn should_update(
        &self,
        cache_type: &str,
        identifier: &str,
        server_etag: Option<&str>,
    ) -> bool {
        let policy = self.policy_for(cache_type);
        if !policy.check_update {
            return false;
        }

        let Some(entry) = self.get_entry(cache_type, identifier) else {
            return true;
        };

        if let Some(etag) = server_etag
            && etag != entry.fingerprint
        {
            log::debug!("Fingerprint mismatch for {cache_type} ({identifier})");
            return true;
        }

        let ttl_millis = policy.ttl.as_millis() as u64;
        entry.remaining_millis(self.now()).saturating_mul(STALE_DIVISOR) < ttl_millis
    }

    /// Store a fetched value unless it serializes to JSON `null`
    fn store_fetched<T: Serialize>(&self, cache_type: &str, identifier: &str, value: &T) -> bool {
        match serde_json::to_value(value) {
            Ok(serde_json::Value::Null) => {
                log::debug!("Fetched {cache_type} ({identifier}) is empty, not caching");
                false
            }
            Ok(payload) => self.put_value(cache_type, payload, identifier),
            Err(e) => {
                log::warn!("Failed to serialize fetched {cache_type} ({identifier}): {e}");
                false
            }
        }
    }

    fn spawn_refresh<T, E, F, Fut>(
        &self,
        cache_type: String,
        identifier: String,
        server_etag: Option<String>,
        fetch: F,
    ) where
        T: Serialize + Send + 'static,
        E: Display + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let Ok(handle) = Handle::try_current() else {
            log::warn!("No async runtime, skipping background refresh of {cache_type} ({identifier})");
            return;
        };

        let store = self.clone();
        handle.spawn(async move {
            if !store.should_update(&cache_type, &identifier, server_etag.as_deref()) {
                return;
            }

            let key = store.storage_key(&cache_type, &identifier);
            if !store.refresh_allowed(&key) {
                log::debug!("Refresh of {key} throttled");
                return;
            }

            match fetch().await {
                Ok(fresh) => {
                    let payload = match serde_json::to_value(&fresh) {
                        Ok(payload) => payload,
                        Err(e) => {
                            log::warn!("Failed to serialize refreshed {cache_type} ({identifier}): {e}");
                            return;
                        }
                    };

                    store.mark_refreshed(key);
                    if !payload.is_null() {
                        store.put_value(&cache_type, payload.clone(), &identifier);
                    }
                    log::debug!("Background refresh of {cache_type} ({identifier}) complete");
                    store.inner.notifier.publish(DataUpdate {
                        cache_type,
                        identifier,
                        payload,
                    });
                }
                Err(e) => {
                    log::warn!("Background refresh of {cache_type} ({identifier}) failed: {e}");
                }
            }
        });
    }

    fn refresh_allowed(&self, key: &str) -> bool {
        let Some(throttle) = self.inner.refresh_throttle else {
            return true;
        };

        let now = self.now();
        let last = self.last_refresh_lock().get(key).copied();
        last.is_none_or(|at| now.saturating_sub(at) >= throttle.as_millis() as u64)
    }

    /// Record a refresh of `key`, dropping marks that no longer throttle
    fn mark_refreshed(&self, key: String) {
        let Some(throttle) = self.inner.refresh_throttle else {
            return;
        };

        let now = self.now();
        let window = throttle.as_millis() as u64;
        let mut marks = self.last_refresh_lock();
        marks.retain(|_, at| now.saturating_sub(*at) < window);
        marks.insert(key, now);
    }
}
