//! Data update notifications
//!
//! A successful background refresh is announced on a broadcast channel.
//! Delivery is best effort: with no subscribers the event is dropped, and a
//! subscriber that falls behind sees `RecvError::Lagged`.

use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;

/// Default number of buffered notifications per subscriber
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Emitted after a background refresh stored new data
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataUpdate {
    pub cache_type: String,
    pub identifier: String,
    pub payload: Value,
}

#[derive(Debug)]
pub(crate) struct UpdateNotifier {
    tx: broadcast::Sender<DataUpdate>,
}

impl UpdateNotifier {
    pub(crate) fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<DataUpdate> {
        self.tx.subscribe()
    }

    /// Returns the number of subscribers reached
    pub(crate) fn publish(&self, update: DataUpdate) -> usize {
        let cache_type = update.cache_type.clone();
        match self.tx.send(update) {
            Ok(receivers) => {
                log::debug!("Data update for {cache_type} sent to {receivers} subscriber(s)");
                receivers
            }
            Err(_) => {
                log::debug!("No subscribers for {cache_type} data update");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn update() -> DataUpdate {
        DataUpdate {
            cache_type: "brands".to_string(),
            identifier: String::new(),
            payload: json!(["a"]),
        }
    }

    #[test]
    fn test_publish_without_subscribers() {
        let notifier = UpdateNotifier::new(4);
        assert_eq!(notifier.publish(update()), 0);
    }

    #[tokio::test]
    async fn test_publish_reaches_every_subscriber() {
        let notifier = UpdateNotifier::new(4);
        let mut first = notifier.subscribe();
        let mut second = notifier.subscribe();

        assert_eq!(notifier.publish(update()), 2);
        assert_eq!(first.recv().await.unwrap(), update());
        assert_eq!(second.recv().await.unwrap(), update());
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let notifier = UpdateNotifier::new(0);
        let _rx = notifier.subscribe();
        assert_eq!(notifier.publish(update()), 1);
    }
}
