//! Per-type cache policies
//!
//! Every cache type maps to a [`CachePolicy`] describing how long entries
//! live, whether reads trigger background update checks and how readily the
//! entries are sacrificed when storage fills up.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Eviction priority. Lower priorities are evicted first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Eviction rank, `low < medium < high`
    pub fn rank(self) -> u8 {
        match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::High => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!("unknown priority '{other}'")),
        }
    }
}

/// Policy applied to every entry of one cache type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// Time-to-live from the moment of the write
    pub ttl: Duration,
    /// Whether warm reads schedule a background staleness check
    pub check_update: bool,
    /// Eviction priority stamped on written entries
    pub priority: Priority,
}

impl CachePolicy {
    pub fn new(ttl: Duration, check_update: bool, priority: Priority) -> Self {
        Self {
            ttl,
            check_update,
            priority,
        }
    }

    /// Fallback policy for unrecognised types
    pub fn fallback(default_ttl: Duration) -> Self {
        Self::new(default_ttl, false, Priority::Medium)
    }
}

/// Built-in policy presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyPreset {
    /// Long-lived entries, brands checked for updates in the background
    Standard,
    /// One-minute entries everywhere, no background checks
    #[default]
    Optimized,
}

impl FromStr for PolicyPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "optimized" => Ok(Self::Optimized),
            other => Err(format!("unknown policy preset '{other}'")),
        }
    }
}

/// Mapping from cache type to policy, with a default for unknown types
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyTable {
    default_ttl: Duration,
    policies: HashMap<String, CachePolicy>,
}

const MINUTE: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(60 * 60);

impl PolicyTable {
    /// Empty table; every type gets the fallback policy
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            default_ttl,
            policies: HashMap::new(),
        }
    }

    /// Build a table from a preset
    pub fn preset(preset: PolicyPreset) -> Self {
        match preset {
            PolicyPreset::Standard => Self::standard(),
            PolicyPreset::Optimized => Self::optimized(),
        }
    }

    /// Long-lived policies for stable gallery data
    ///
    /// Every type keeps the medium priority, so eviction is purely by age.
    pub fn standard() -> Self {
        Self::new(5 * MINUTE)
            .with_policy("brands", CachePolicy::new(HOUR, true, Priority::Medium))
            .with_policy("images", CachePolicy::new(2 * HOUR, false, Priority::Medium))
            .with_policy("filters", CachePolicy::new(4 * HOUR, false, Priority::Medium))
            .with_policy(
                "brand_detail",
                CachePolicy::new(2 * HOUR, false, Priority::Medium),
            )
    }

    /// Short uniform policies that never poll the origin in the background
    pub fn optimized() -> Self {
        Self::new(MINUTE)
            .with_policy("brands", CachePolicy::new(MINUTE, false, Priority::High))
            .with_policy("images", CachePolicy::new(MINUTE, false, Priority::High))
            .with_policy("filters", CachePolicy::new(MINUTE, false, Priority::Medium))
            .with_policy(
                "brand_detail",
                CachePolicy::new(MINUTE, false, Priority::High),
            )
    }

    /// Add or replace the policy for a type
    pub fn with_policy(mut self, cache_type: impl Into<String>, policy: CachePolicy) -> Self {
        self.policies.insert(cache_type.into(), policy);
        self
    }

    /// Add or replace the policy for a type in place
    pub fn set_policy(&mut self, cache_type: impl Into<String>, policy: CachePolicy) {
        self.policies.insert(cache_type.into(), policy);
    }

    /// Replace the TTL applied to unknown types
    pub fn with_default_ttl(mut self, default_ttl: Duration) -> Self {
        self.default_ttl = default_ttl;
        self
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Policy for a type, falling back for unknown types
    pub fn policy_for(&self, cache_type: &str) -> CachePolicy {
        self.policies
            .get(cache_type)
            .copied()
            .unwrap_or_else(|| CachePolicy::fallback(self.default_ttl))
    }

    /// Whether the type has an explicit policy
    pub fn is_known(&self, cache_type: &str) -> bool {
        self.policies.contains_key(cache_type)
    }

    /// Known types in alphabetical order
    pub fn types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.policies.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self::optimized()
    }
}
