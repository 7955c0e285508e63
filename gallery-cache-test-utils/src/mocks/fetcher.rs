//! Scripted origin fetches

use std::future::{Ready, ready};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

/// Error returned by a failing [`CountingFetcher`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("fetch failed: {0}")]
pub struct FetchError(pub String);

/// Fetch closure factory that counts invocations
///
/// Each call to [`fetch`](CountingFetcher::fetch) yields a one-shot closure
/// suitable for `get_or_fetch` and `preload`. Clones share the counter and
/// the scripted response.
#[derive(Debug)]
pub struct CountingFetcher<T> {
    state: Arc<FetcherState<T>>,
}

#[derive(Debug)]
struct FetcherState<T> {
    calls: AtomicUsize,
    response: Mutex<Result<T, FetchError>>,
}

impl<T> Clone for CountingFetcher<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T: Clone + Send + 'static> CountingFetcher<T> {
    /// Fetcher that always succeeds with `value`
    pub fn ok(value: T) -> Self {
        Self::with_response(Ok(value))
    }

    /// Fetcher that always fails with `message`
    pub fn failing(message: &str) -> Self {
        Self::with_response(Err(FetchError(message.to_string())))
    }

    fn with_response(response: Result<T, FetchError>) -> Self {
        Self {
            state: Arc::new(FetcherState {
                calls: AtomicUsize::new(0),
                response: Mutex::new(response),
            }),
        }
    }

    /// Change what subsequent fetches return
    pub fn respond_with(&self, response: Result<T, FetchError>) {
        *self
            .state
            .response
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = response;
    }

    /// How many fetch closures have been invoked
    pub fn calls(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }

    /// A fetch closure bound to this fetcher
    pub fn fetch(&self) -> impl FnOnce() -> Ready<Result<T, FetchError>> + Send + use<T> {
        let state = Arc::clone(&self.state);
        move || {
            state.calls.fetch_add(1, Ordering::SeqCst);
            let response = state
                .response
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone();
            ready(response)
        }
    }
}
