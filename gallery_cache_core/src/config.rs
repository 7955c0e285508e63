//! Serializable configuration for the cache store and its storage backend
//!
//! These types are what the CLI layers from defaults, a TOML file and the
//! environment. They convert into the runtime [`PolicyTable`] and feed the
//! [`StorageFactory`](crate::storage::StorageFactory).

use crate::error::ValidationError;
use crate::policy::{CachePolicy, PolicyPreset, PolicyTable, Priority};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default key prefix owned by the store
pub const DEFAULT_NAMESPACE: &str = "nanyi_cache_";

/// Default key of the persisted version marker
pub const DEFAULT_VERSION_KEY: &str = "nanyi_version";

/// Default byte quota for bounded backends (5 MiB, a typical browser budget)
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

/// Cache store configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub namespace: String,
    pub version_key: String,
    /// Pinned version; when unset the current hour number is used
    pub version: Option<String>,
    pub preset: PolicyPreset,
    /// TTL for types without a policy; falls back to the preset's default
    pub default_ttl_seconds: Option<u64>,
    pub sweep_interval_seconds: u64,
    /// Minimum spacing between background refreshes of one key
    pub refresh_throttle_seconds: Option<u64>,
    pub policies: BTreeMap<String, PolicyConfig>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            version_key: DEFAULT_VERSION_KEY.to_string(),
            version: None,
            preset: PolicyPreset::default(),
            default_ttl_seconds: None,
            sweep_interval_seconds: 300,
            refresh_throttle_seconds: None,
            policies: BTreeMap::new(),
        }
    }
}

impl StoreConfig {
    /// Interval between background sweeps
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds)
    }

    pub fn refresh_throttle(&self) -> Option<Duration> {
        self.refresh_throttle_seconds.map(Duration::from_secs)
    }

    /// Resolve the preset plus overrides into a policy table
    pub fn policy_table(&self) -> Result<PolicyTable, ValidationError> {
        let mut table = PolicyTable::preset(self.preset);

        if let Some(seconds) = self.default_ttl_seconds {
            if seconds == 0 {
                return Err(ValidationError::invalid_policy(
                    "default",
                    "ttl must be greater than zero",
                ));
            }
            table = table.with_default_ttl(Duration::from_secs(seconds));
        }

        for (cache_type, overrides) in &self.policies {
            let base = table.policy_for(cache_type);
            table.set_policy(cache_type.clone(), overrides.apply(cache_type, base)?);
        }
        Ok(table)
    }
}

/// Per-type policy override; unset fields keep the preset's value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub ttl_seconds: Option<u64>,
    pub check_update: Option<bool>,
    pub priority: Option<Priority>,
}

impl PolicyConfig {
    fn apply(&self, cache_type: &str, base: CachePolicy) -> Result<CachePolicy, ValidationError> {
        let ttl = match self.ttl_seconds {
            Some(0) => {
                return Err(ValidationError::invalid_policy(
                    cache_type,
                    "ttl must be greater than zero",
                ));
            }
            Some(seconds) => Duration::from_secs(seconds),
            None => base.ttl,
        };

        Ok(CachePolicy::new(
            ttl,
            self.check_update.unwrap_or(base.check_update),
            self.priority.unwrap_or(base.priority),
        ))
    }
}

/// Which storage backend to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    #[default]
    File,
    Memory,
    None,
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::File => "file",
            Self::Memory => "memory",
            Self::None => "none",
        })
    }
}

impl FromStr for StorageKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File),
            "memory" => Ok(Self::Memory),
            "none" | "noop" => Ok(Self::None),
            other => Err(ValidationError::unknown_backend(other)),
        }
    }
}

/// Storage backend configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageKind,
    /// File path for the file backend; platform data dir when unset
    pub path: Option<PathBuf>,
    pub quota_bytes: Option<usize>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageKind::File,
            path: None,
            quota_bytes: Some(DEFAULT_QUOTA_BYTES),
        }
    }
}

impl StorageConfig {
    /// Path the file backend will use
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(default_store_path)
    }
}

/// `<data dir>/gallery-cache/store.json`, or a relative fallback
pub fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("gallery-cache"))
        .unwrap_or_else(|| PathBuf::from(".gallery-cache"))
        .join("store.json")
}
