//! Gallery Cache Core Library
//!
//! A namespaced, TTL-bounded key-value cache over a synchronous string store.
//! Per-type policies decide how long entries live, whether a hit should be
//! checked for freshness in the background, and which entries go first when
//! the store runs out of room.
//!
//! ```no_run
//! use gallery_cache_core::{CacheStore, PolicyTable};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let store = CacheStore::builder()
//!     .policies(PolicyTable::standard())
//!     .build()?;
//!
//! let brands: Vec<String> = store
//!     .get_or_fetch("brands", "", || async { Ok::<_, std::io::Error>(vec!["Nanyi".to_string()]) })
//!     .await?;
//! # let _ = brands;
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod config;
pub mod entry;
pub mod error;
pub mod fingerprint;
pub mod notify;
pub mod policy;
pub mod preload;
mod read_through;
pub mod stats;
pub mod storage;
pub mod store;
pub mod sweeper;

// Test utilities module (available for tests)
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export main types
pub use clock::{Clock, SystemClock};
pub use config::{PolicyConfig, StorageConfig, StorageKind, StoreConfig};
pub use entry::{CacheEntry, CacheKey, EntrySummary};
pub use error::{Error, Result, StorageError, ValidationError};
pub use fingerprint::fingerprint;
pub use notify::DataUpdate;
pub use policy::{CachePolicy, PolicyPreset, PolicyTable, Priority};
pub use preload::preload;
pub use stats::CacheStats;
pub use storage::{FileStorage, MemoryStorage, NoopStorage, StorageBackend, StorageFactory};
pub use store::{CacheStore, CacheStoreBuilder};
pub use sweeper::SweeperHandle;
