use super::OutputFormatter;
use anyhow::Result;
use colored::*;
use gallery_cache_core::stats::format_bytes;
use gallery_cache_core::{CacheStats, EntrySummary};
use serde_json::json;

/// Text formatter for human-readable output
pub struct TextFormatter {
    use_color: bool,
}

impl TextFormatter {
    pub fn new(use_color: bool) -> Self {
        Self { use_color }
    }

    fn colorize(&self, text: &str, color: fn(&str) -> ColoredString) -> String {
        if self.use_color {
            color(text).to_string()
        } else {
            text.to_string()
        }
    }
}

impl OutputFormatter for TextFormatter {
    fn format_entries(&self, entries: &[EntrySummary], now: u64) -> Result<String> {
        if entries.is_empty() {
            return Ok("No cache entries.\n".to_string());
        }

        let mut output = String::new();
        for entry in entries {
            let identifier = if entry.identifier.is_empty() {
                "-"
            } else {
                entry.identifier.as_str()
            };
            let lifetime = if now > entry.expires_at {
                self.colorize("expired", |s| s.red())
            } else {
                format!("{}s left", (entry.expires_at - now) / 1000)
            };

            output.push_str(&format!(
                "{} {} [{}] {} {}\n",
                self.colorize(&entry.cache_type, |s| s.yellow()),
                self.colorize(identifier, |s| s.cyan()),
                entry.priority,
                lifetime,
                format_bytes(entry.size_bytes as u64),
            ));
        }
        Ok(output)
    }

    fn format_stats(&self, stats: &CacheStats) -> Result<String> {
        let mut output = String::new();

        output.push_str(&format!("Entries: {}\n", stats.item_count));
        output.push_str(&format!("Size: {}\n", stats.size_formatted()));

        if !stats.type_counts.is_empty() {
            output.push_str("\nBy type:\n");
            for (cache_type, count) in &stats.type_counts {
                let name = self.colorize(cache_type, |s| s.yellow());
                output.push_str(&format!("  {name}: {count}\n"));
            }
        }
        Ok(output)
    }
}

/// JSON formatter for machine-readable output
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn render(&self, value: &serde_json::Value) -> Result<String> {
        let mut text = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        text.push('\n');
        Ok(text)
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_entries(&self, entries: &[EntrySummary], now: u64) -> Result<String> {
        let rows: Vec<_> = entries
            .iter()
            .map(|entry| {
                json!({
                    "key": entry.key,
                    "type": entry.cache_type,
                    "identifier": entry.identifier,
                    "priority": entry.priority,
                    "storedAt": entry.stored_at,
                    "expiresAt": entry.expires_at,
                    "expired": now > entry.expires_at,
                    "fingerprint": entry.fingerprint,
                    "sizeBytes": entry.size_bytes,
                })
            })
            .collect();
        self.render(&json!(rows))
    }

    fn format_stats(&self, stats: &CacheStats) -> Result<String> {
        self.render(&json!({
            "totalSizeBytes": stats.total_size_bytes,
            "totalSize": stats.size_formatted(),
            "itemCount": stats.item_count,
            "typeCounts": stats.type_counts,
        }))
    }
}
