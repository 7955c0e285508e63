//! Cache warm-up

use crate::store::CacheStore;
use serde::Serialize;
use std::fmt::Display;
use std::future::Future;

/// Fetch and store a value unless a live entry already exists
///
/// Fetch failures are logged and swallowed. Returns whether a value was
/// loaded into the cache.
pub async fn preload<T, E, F, Fut>(
    store: &CacheStore,
    cache_type: &str,
    identifier: &str,
    fetch: F,
) -> bool
where
    T: Serialize,
    E: Display,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    if store.contains(cache_type, identifier) {
        log::debug!("Preload skipped, {cache_type} ({identifier}) already cached");
        return false;
    }

    match fetch().await {
        Ok(value) => store.put(cache_type, &value, identifier),
        Err(e) => {
            log::warn!("Preload of {cache_type} ({identifier}) failed: {e}");
            false
        }
    }
}
