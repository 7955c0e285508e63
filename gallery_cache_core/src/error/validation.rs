//! Validation related error types

use thiserror::Error;

/// Validation and configuration errors
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Eviction fraction outside `0.0..=1.0`
    #[error("Invalid eviction fraction {fraction}: must be between 0 and 1")]
    InvalidFraction { fraction: f64 },

    /// Storage backend name not recognised
    #[error("Unknown storage backend '{name}' (expected file, memory or none)")]
    UnknownBackend { name: String },

    /// Policy table entry rejected
    #[error("Invalid policy for type '{cache_type}': {reason}")]
    InvalidPolicy { cache_type: String, reason: String },
}

impl ValidationError {
    /// Create an invalid fraction error
    pub fn invalid_fraction(fraction: f64) -> Self {
        Self::InvalidFraction { fraction }
    }

    /// Create an unknown backend error
    pub fn unknown_backend(name: &str) -> Self {
        Self::UnknownBackend {
            name: name.to_string(),
        }
    }

    /// Create an invalid policy error
    pub fn invalid_policy(cache_type: &str, reason: &str) -> Self {
        Self::InvalidPolicy {
            cache_type: cache_type.to_string(),
            reason: reason.to_string(),
        }
    }
}
