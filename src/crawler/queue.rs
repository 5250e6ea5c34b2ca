//! Bounded, closeable FIFO shared by many producers and many consumers

use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

/// Returned by `push` once the queue has been closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueClosed;

/// A bounded queue that can be closed from any handle
///
/// Pushes wait while the queue is full. After `close`, new and waiting
/// pushes fail, while `pop` keeps returning buffered items until the
/// queue is empty and then returns `None`.
pub struct WorkQueue<T> {
    tx: mpsc::Sender<T>,
    rx: Mutex<mpsc::Receiver<T>>,
    closed: CancellationToken,
}

impl<T: Send> WorkQueue<T> {
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Self {
            tx,
            rx: Mutex::new(rx),
            closed: CancellationToken::new(),
        }
    }

    /// Appends an item, waiting for room if the queue is full
    pub async fn push(&self, item: T) -> Result<(), QueueClosed> {
        if self.closed.is_cancelled() {
            return Err(QueueClosed);
        }

        tokio::select! {
            biased;
            _ = self.closed.cancelled() => Err(QueueClosed),
            sent = self.tx.send(item) => sent.map_err(|_| QueueClosed),
        }
    }

    /// Takes the next item, or `None` once the queue is closed and drained
    pub async fn pop(&self) -> Option<T> {
        let mut rx = self.rx.lock().await;

        tokio::select! {
            biased;
            item = rx.recv() => item,
            _ = self.closed.cancelled() => {
                rx.close();
                rx.recv().await
            }
        }
    }

    /// Rejects further pushes and releases pushers that are waiting for room
    pub fn close(&self) {
        self.closed.cancel();
    }
}
