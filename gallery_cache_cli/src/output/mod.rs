//! Rendering of entries and statistics

mod formatters;

pub use formatters::{JsonFormatter, TextFormatter};

use anyhow::Result;
use gallery_cache_core::{CacheStats, EntrySummary};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Output format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::Json => "json",
        })
    }
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => anyhow::bail!("Unknown output format: {}", s),
        }
    }
}

/// Trait for output formatters
pub trait OutputFormatter {
    /// Format the entry listing; `now` is used for remaining lifetimes
    fn format_entries(&self, entries: &[EntrySummary], now: u64) -> Result<String>;

    fn format_stats(&self, stats: &CacheStats) -> Result<String>;
}

/// Pick the formatter for `format`
pub fn formatter_for(format: OutputFormat, use_color: bool) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter::new(use_color)),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
    }
}
