use std::sync::Arc;

use alpen_rollup_common::BatchNotification;
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Fans batch notifications out to any number of subscribers.
///
/// Subscribers never block the sequencer. One that falls more than the
/// channel capacity behind sees `RecvError::Lagged` and skips ahead.
#[derive(Debug)]
pub(crate) struct BatchNotifier {
    tx: broadcast::Sender<Arc<BatchNotification>>,
}

impl BatchNotifier {
    pub(crate) fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<Arc<BatchNotification>> {
        self.tx.subscribe()
    }

    /// Returns the number of subscribers the notification reached.
    pub(crate) fn publish(&self, notification: Arc<BatchNotification>) -> usize {
        let batch_idx = notification.batch_idx;
        match self.tx.send(notification) {
            Ok(n) => {
                trace!(batch_idx, subscribers = n, "published batch notification");
                n
            }
            Err(_) => {
                debug!(batch_idx, "no subscribers for batch notification");
                0
            }
        }
    }
}
