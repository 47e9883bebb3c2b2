//! Bounded single-consumer queue used for the dispatcher inlet and outlets.
//!
//! A capacity of `n > 0` behaves like a bounded tokio mpsc channel. A capacity
//! of `0` is a rendezvous: `send` completes only once the receiver has taken
//! the item out of the queue.

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

/// The receiving side of a queue is gone; the item was not taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("queue receiver is gone")]
pub struct QueueClosed;

struct Slot<T> {
    item: T,
    taken: Option<oneshot::Sender<()>>,
}

/// Create a queue holding at most `capacity` undelivered items.
pub fn bounded<T>(capacity: usize) -> (QueueSender<T>, QueueReceiver<T>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        QueueSender {
            tx,
            rendezvous: capacity == 0,
        },
        QueueReceiver { rx },
    )
}

pub struct QueueSender<T> {
    tx: mpsc::Sender<Slot<T>>,
    rendezvous: bool,
}

impl<T> Clone for QueueSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            rendezvous: self.rendezvous,
        }
    }
}

impl<T> QueueSender<T> {
    /// Push an item, waiting for room (or for the receiver, on a rendezvous queue).
    pub async fn send(&self, item: T) -> Result<(), QueueClosed> {
        if !self.rendezvous {
            return self
                .tx
                .send(Slot { item, taken: None })
                .await
                .map_err(|_| QueueClosed);
        }

        let (taken_tx, taken_rx) = oneshot::channel();
        self.tx
            .send(Slot {
                item,
                taken: Some(taken_tx),
            })
            .await
            .map_err(|_| QueueClosed)?;
        // A receiver dropped with the slot still buffered drops `taken_tx`.
        taken_rx.await.map_err(|_| QueueClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub fn is_rendezvous(&self) -> bool {
        self.rendezvous
    }
}

pub struct QueueReceiver<T> {
    rx: mpsc::Receiver<Slot<T>>,
}

impl<T> QueueReceiver<T> {
    /// Wait for the next item. `None` once every sender is gone and the queue is drained.
    pub async fn recv(&mut self) -> Option<T> {
        let slot = self.rx.recv().await?;
        Some(Self::take(slot))
    }

    /// Take an item if one is immediately available.
    pub fn try_recv(&mut self) -> Option<T> {
        self.rx.try_recv().ok().map(Self::take)
    }

    /// Stop accepting new items. Buffered items can still be received.
    pub fn close(&mut self) {
        self.rx.close();
    }

    fn take(slot: Slot<T>) -> T {
        if let Some(taken) = slot.taken {
            let _ = taken.send(());
        }
        slot.item
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn buffered_queue_accepts_up_to_capacity() {
        let (tx, mut rx) = bounded::<u32>(2);
        tx.send(1).await.unwrap();
        tx.send(2).await.unwrap();

        let third = timeout(Duration::from_millis(50), tx.send(3)).await;
        assert!(third.is_err(), "third send should wait for room");

        assert_eq!(rx.recv().await, Some(1));
        assert_eq!(rx.recv().await, Some(2));
    }

    #[tokio::test]
    async fn rendezvous_send_waits_for_receiver() {
        let (tx, mut rx) = bounded::<&str>(0);
        assert!(tx.is_rendezvous());

        let pending = timeout(Duration::from_millis(50), tx.send("early")).await;
        assert!(pending.is_err(), "rendezvous send must not complete alone");

        let sender = tokio::spawn({
            let tx = tx.clone();
            async move { tx.send("handoff").await }
        });
        // The abandoned "early" slot is still first in line.
        assert_eq!(rx.recv().await, Some("early"));
        assert_eq!(rx.recv().await, Some("handoff"));
        assert_eq!(sender.await.unwrap(), Ok(()));
    }

    #[tokio::test]
    async fn send_to_dropped_receiver_fails() {
        let (tx, rx) = bounded::<u8>(4);
        drop(rx);
        assert!(tx.is_closed());
        assert_eq!(tx.send(7).await, Err(QueueClosed));
    }

    #[tokio::test]
    async fn rendezvous_item_dropped_unread_reports_closed() {
        let (tx, rx) = bounded::<u8>(0);
        let sender = tokio::spawn(async move { tx.send(9).await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(rx);
        assert_eq!(sender.await.unwrap(), Err(QueueClosed));
    }

    #[tokio::test]
    async fn recv_ends_when_senders_are_gone() {
        let (tx, mut rx) = bounded::<u8>(1);
        tx.send(1).await.unwrap();
        drop(tx);
        assert_eq!(rx.recv().await, Some(1));
        assert_eq!(rx.recv().await, None);
        assert_eq!(rx.try_recv(), None);
    }
}
