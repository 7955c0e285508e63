//! Cache statistics

use serde::Serialize;
use std::collections::BTreeMap;

/// Label used for entries that fail to parse
pub const CORRUPTED_LABEL: &str = "corrupted";

/// Snapshot of the store's namespace plus in-process counters
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Sum of key and value lengths under the namespace
    pub total_size_bytes: u64,
    pub item_count: usize,
    /// Entries per cache type; unparseable entries are counted as `corrupted`
    pub type_counts: BTreeMap<String, usize>,
    pub hit_count: u64,
    pub miss_count: u64,
}

impl CacheStats {
    pub fn size_formatted(&self) -> String {
        format_bytes(self.total_size_bytes)
    }

    /// Hits over lookups, zero before the first lookup
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hit_count + self.miss_count;
        if lookups == 0 {
            0.0
        } else {
            self.hit_count as f64 / lookups as f64
        }
    }
}

/// Human readable size, e.g. `1.5 KB`
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    let mut scaled = bytes as f64;
    while scaled >= 1024.0 && unit < UNITS.len() - 1 {
        scaled /= 1024.0;
        unit += 1;
    }

    let rounded = (scaled * 100.0).round() / 100.0;
    format!("{rounded} {}", UNITS[unit])
}
