//! Bounded hand-off queue shared by the background writers.

use tokio::sync::mpsc::{self, Receiver, Sender, error::TrySendError};
use tracing::warn;

/// Sending half of a background writer's queue.
///
/// Offering never blocks: when the queue is full or the writer is gone
/// the item is dropped with a warning.
#[derive(Debug)]
pub(crate) struct Sink<T> {
    tx: Sender<T>,
    name: &'static str,
}

impl<T> Clone for Sink<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            name: self.name,
        }
    }
}

impl<T> Sink<T> {
    pub(crate) fn channel(name: &'static str, capacity: usize) -> (Self, Receiver<T>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx, name }, rx)
    }

    pub(crate) fn offer(&self, item: T) {
        match self.tx.try_send(item) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!(sink = self.name, "queue full; event dropped");
            }
            Err(TrySendError::Closed(_)) => {
                warn!(sink = self.name, "writer stopped; event dropped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn full_queue_drops_instead_of_blocking() {
        let (sink, mut rx) = Sink::channel("test", 1);
        sink.offer(1);
        sink.offer(2);
        drop(sink);

        assert_eq!(rx.recv().await, Some(1));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn closed_queue_drops_silently() {
        let (sink, rx) = Sink::channel("test", 4);
        drop(rx);
        sink.offer(1);
    }
}
