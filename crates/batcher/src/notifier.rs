//! Size-threshold trigger for the batching loop.

use tokio::sync::mpsc;

/// Fires the early-batch trigger when pending encoded bytes cross the
/// configured threshold.
///
/// Wraps the send half of a capacity-1 channel: a notification arriving
/// while one is still pending is coalesced, never queued, so at most one
/// early attempt is ever scheduled ahead of the loop.
#[derive(Debug, Clone)]
pub struct EncodedSizeNotifier {
    notify_tx: mpsc::Sender<()>,
    threshold_bytes: u64,
}

impl EncodedSizeNotifier {
    pub(crate) fn new(notify_tx: mpsc::Sender<()>, threshold_bytes: u64) -> Self {
        Self {
            notify_tx,
            threshold_bytes,
        }
    }

    /// Threshold in bytes above which a notification fires.
    pub fn threshold_bytes(&self) -> u64 {
        self.threshold_bytes
    }

    /// Called by the encoding pipeline as pending encoded bytes accumulate.
    ///
    /// Fires when `pending_encoded_bytes` reaches the threshold. Returns
    /// whether a notification was actually delivered; `false` means the
    /// total is below the threshold or a notification is already pending.
    pub fn maybe_notify(&self, pending_encoded_bytes: u64) -> bool {
        if pending_encoded_bytes < self.threshold_bytes {
            return false;
        }
        self.notify_tx.try_send(()).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notifier(threshold: u64) -> (EncodedSizeNotifier, mpsc::Receiver<()>) {
        let (tx, rx) = mpsc::channel(1);
        (EncodedSizeNotifier::new(tx, threshold), rx)
    }

    #[tokio::test]
    async fn test_below_threshold_does_not_fire() {
        let (notifier, mut rx) = notifier(1_048_576);
        assert!(!notifier.maybe_notify(1_048_575));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_fires_at_threshold() {
        let (notifier, mut rx) = notifier(1_048_576);
        assert!(notifier.maybe_notify(1_048_576));
        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_pending_notification_is_coalesced() {
        let (notifier, mut rx) = notifier(100);
        assert!(notifier.maybe_notify(200));
        // Second notification while one is pending is dropped, not queued.
        assert!(!notifier.maybe_notify(300));

        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err(), "coalesced notification must not queue");

        // Once drained, the trigger can fire again.
        assert!(notifier.maybe_notify(400));
    }
}
