//! Error types for the gallery cache core library
//!
//! Errors are grouped by the layer that produced them. Most of them never
//! leave the crate: the cache store degrades storage faults to misses and
//! dropped writes. They surface from constructors, backends and operator
//! entry points such as `evict_by_priority`.

use thiserror::Error;

pub mod storage;
pub mod validation;

pub use self::storage::StorageError;
pub use self::validation::ValidationError;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the gallery cache core library
///
/// - Storage errors: the host store rejected or lost data
/// - Validation errors: bad arguments or configuration
/// - Serialization errors: a payload or entry could not be (de)serialized
#[derive(Error, Debug)]
pub enum Error {
    /// Storage backend errors
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Validation related errors
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// JSON (de)serialization failures
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// True when the host store refused a write because it is full
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::Storage(StorageError::QuotaExceeded { .. }))
    }
}
