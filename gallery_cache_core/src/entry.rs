//! Cache keys and stored entries

use crate::fingerprint::fingerprint_str;
use crate::policy::{CachePolicy, Priority};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Logical address of an entry: a cache type plus an optional identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub cache_type: String,
    pub identifier: String,
}

impl CacheKey {
    /// Create a new cache key
    pub fn new(cache_type: &str, identifier: &str) -> Self {
        Self {
            cache_type: cache_type.to_string(),
            identifier: identifier.to_string(),
        }
    }

    /// Key under which the entry lives in the host store
    pub fn storage_key(&self, namespace: &str) -> String {
        format!("{}{}", type_prefix(namespace, &self.cache_type), self.identifier)
    }
}

/// Prefix shared by every storage key of one type
pub fn type_prefix(namespace: &str, cache_type: &str) -> String {
    format!("{namespace}{cache_type}_")
}

/// The unit of storage, persisted as JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// Opaque payload
    pub payload: Value,
    /// Write time, Unix milliseconds
    pub stored_at: u64,
    /// `stored_at + ttl`
    pub expires_at: u64,
    /// Weak hash of the serialized payload
    pub fingerprint: String,
    #[serde(rename = "type")]
    pub cache_type: String,
    #[serde(default)]
    pub priority: Priority,
}

impl CacheEntry {
    /// Build an entry for `payload` written at `now` under `policy`
    ///
    /// Object keys keep their insertion order (`preserve_order`), so the
    /// fingerprint matches [`fingerprint`](crate::fingerprint::fingerprint) of the value
    /// the payload was converted from.
    pub fn new(cache_type: &str, payload: Value, now: u64, policy: &CachePolicy) -> Self {
        let fingerprint = fingerprint_str(&payload.to_string());
        let ttl = u64::try_from(policy.ttl.as_millis()).unwrap_or(u64::MAX);

        Self {
            payload,
            stored_at: now,
            expires_at: now.saturating_add(ttl),
            fingerprint,
            cache_type: cache_type.to_string(),
            priority: policy.priority,
        }
    }

    /// Expired strictly after the deadline; `now == expires_at` is still live
    pub fn is_expired(&self, now: u64) -> bool {
        now > self.expires_at
    }

    /// Milliseconds until expiry, zero once expired
    pub fn remaining_millis(&self, now: u64) -> u64 {
        self.expires_at.saturating_sub(now)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

/// Inspection view of a stored entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntrySummary {
    pub key: String,
    pub cache_type: String,
    pub identifier: String,
    pub priority: Priority,
    pub stored_at: u64,
    pub expires_at: u64,
    pub fingerprint: String,
    pub size_bytes: usize,
}
