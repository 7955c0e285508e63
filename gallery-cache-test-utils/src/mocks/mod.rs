//! Mock implementations for testing

mod fetcher;
mod storage;

pub use fetcher::{CountingFetcher, FetchError};
pub use storage::FlakyStorage;
