// Latest-value-wins channels connecting the pipeline stages.
//
// Each channel is a single slot: a publish that lands while the previous
// value is unconsumed overwrites it. Producers never stall on slow
// consumers; consumers only ever see the newest value. Superseded values
// are dropped silently; that is the backpressure policy, not an error.

use thiserror::Error;
use tokio::sync::watch;

/// The other side of a latest-value channel is gone.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("channel closed")]
pub struct Closed;

/// Create a single-slot conflating channel.
pub fn latest<T: Clone>() -> (LatestSender<T>, LatestReceiver<T>) {
    let (tx, rx) = watch::channel(None);
    (LatestSender { tx }, LatestReceiver { rx })
}

pub struct LatestSender<T> {
    tx: watch::Sender<Option<T>>,
}

impl<T: Clone> LatestSender<T> {
    /// Publish a value, overwriting any unconsumed predecessor.
    pub fn publish(&self, value: T) -> Result<(), Closed> {
        self.tx.send(Some(value)).map_err(|_| Closed)
    }
}

pub struct LatestReceiver<T> {
    rx: watch::Receiver<Option<T>>,
}

impl<T: Clone> LatestReceiver<T> {
    /// Wait for a value newer than the last one consumed.
    ///
    /// Cancel-safe: dropping the future (e.g. losing a `select!` race) never
    /// consumes a value, and a value published meanwhile is picked up by the
    /// next call.
    pub async fn recv(&mut self) -> Result<T, Closed> {
        loop {
            self.rx.changed().await.map_err(|_| Closed)?;
            if let Some(value) = self.rx.borrow_and_update().clone() {
                return Ok(value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_delivers_published_value() {
        let (tx, mut rx) = latest::<u32>();
        tx.publish(7).unwrap();
        assert_eq!(rx.recv().await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_conflation_keeps_only_newest() {
        let (tx, mut rx) = latest::<u32>();
        tx.publish(1).unwrap();
        tx.publish(2).unwrap();
        assert_eq!(rx.recv().await.unwrap(), 2);

        // The overwritten value never shows up later either.
        tx.publish(3).unwrap();
        assert_eq!(rx.recv().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_recv_waits_for_publish() {
        let (tx, mut rx) = latest::<u32>();
        let waiter = tokio::spawn(async move { rx.recv().await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        tx.publish(42).unwrap();
        assert_eq!(waiter.await.unwrap().unwrap(), 42);
    }

    #[tokio::test]
    async fn test_recv_errors_after_sender_dropped() {
        let (tx, mut rx) = latest::<u32>();
        drop(tx);
        assert_eq!(rx.recv().await, Err(Closed));
    }

    #[tokio::test]
    async fn test_publish_errors_after_receiver_dropped() {
        let (tx, rx) = latest::<u32>();
        drop(rx);
        assert_eq!(tx.publish(1), Err(Closed));
    }
}
