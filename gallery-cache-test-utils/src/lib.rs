//! Test utilities for the gallery cache
//!
//! This crate provides mock storage backends, scripted fetchers and store
//! builders for testing the cache store from the outside.

pub mod builders;
pub mod mocks;

// Re-export commonly used types
pub use builders::{TestStore, TestStoreBuilder};
pub use gallery_cache_core::test_utils::ManualClock;
pub use mocks::{CountingFetcher, FetchError, FlakyStorage};
