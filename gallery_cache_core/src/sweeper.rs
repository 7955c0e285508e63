//! Periodic expiry sweep

use crate::store::CacheStore;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Shortest interval the sweeper accepts
const MIN_INTERVAL: Duration = Duration::from_millis(10);

/// Handle to a running sweeper; the task stops when this is dropped
#[derive(Debug)]
pub struct SweeperHandle {
    task: Option<JoinHandle<()>>,
}

impl SweeperHandle {
    /// Stop the sweeper and wait for the task to wind down
    pub async fn shutdown(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            // Cancelled is the expected outcome here
            let _ = task.await;
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

impl CacheStore {
    /// Run [`evict_expired`](CacheStore::evict_expired) every `interval`
    ///
    /// The first sweep happens one interval after the call. Must be called
    /// from within a tokio runtime.
    pub fn spawn_sweeper(&self, interval: Duration) -> SweeperHandle {
        let interval = interval.max(MIN_INTERVAL);
        let store = self.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let removed = store.evict_expired();
                log::debug!("Sweep removed {removed} entries");
            }
        });

        log::debug!("Started cache sweeper every {}ms", interval.as_millis());
        SweeperHandle { task: Some(task) }
    }
}
