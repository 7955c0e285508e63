//! Time source abstraction
//!
//! Expiry, staleness and version bucketing all read the time through
//! [`Clock`] so tests can move time by hand.

use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds in one hour, the default version bucket width
pub const HOUR_MILLIS: u64 = 60 * 60 * 1000;

/// Source of wall-clock time in Unix milliseconds
pub trait Clock: Send + Sync {
    /// Current time in milliseconds since the Unix epoch
    fn now_millis(&self) -> u64;
}

/// Clock backed by [`SystemTime`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(d) => d.as_millis() as u64,
            Err(_) => {
                log::warn!("System time is before the Unix epoch; using 0");
                0
            }
        }
    }
}
