//! Storage backend error types

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised by a [`StorageBackend`](crate::storage::StorageBackend)
#[derive(Error, Debug)]
pub enum StorageError {
    /// The write would push the store past its quota
    #[error("Storage quota exceeded writing '{key}': {required} bytes required, limit is {limit}")]
    QuotaExceeded {
        key: String,
        required: usize,
        limit: usize,
    },

    /// Filesystem failure in a persistent backend
    #[error("Storage I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Persisted data could not be decoded
    #[error("Corrupted storage at {location}: {message}")]
    Corrupted { location: String, message: String },

    /// Backend cannot serve requests
    #[error("Storage unavailable: {message}")]
    Unavailable { message: String },
}

impl StorageError {
    /// Create a quota exceeded error
    pub fn quota_exceeded(key: &str, required: usize, limit: usize) -> Self {
        Self::QuotaExceeded {
            key: key.to_string(),
            required,
            limit,
        }
    }

    /// Create an I/O error bound to a path
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Create a corrupted storage error
    pub fn corrupted(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Corrupted {
            location: location.into(),
            message: message.into(),
        }
    }

    /// Create an unavailable backend error
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_quota_exceeded_message() {
        let error = StorageError::quota_exceeded("nanyi_cache_images_a", 6_000_000, 5_242_880);
        let message = error.to_string();

        assert!(message.contains("nanyi_cache_images_a"));
        assert!(message.contains("6000000"));
        assert!(message.contains("5242880"));
    }

    #[test]
    fn test_io_error_keeps_source() {
        let error = StorageError::io(
            Path::new("/tmp/cache.json"),
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );

        assert!(error.to_string().contains("/tmp/cache.json"));
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn test_corrupted_message() {
        let error = StorageError::corrupted("store.json", "expected object");
        assert!(error.to_string().contains("Corrupted storage at store.json"));
        assert!(error.to_string().contains("expected object"));
    }
}
