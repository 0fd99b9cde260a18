//! Bounded FIFO mailbox with purge-on-stop.
//!
//! A [`Queue`] is the only synchronized boundary between a sequent's
//! producers and its worker. Every enqueued [`Message`] meets exactly one
//! of two fates: it is delivered to the consumer, or it is purged when the
//! queue is stopped. Never both, never neither.
//!
//! ```text
//! producer ──enqueue()──►┌────────────────┐──dequeue()──► consumer
//!                        │ [m1][m2][m3]   │
//! stop() ───────────────►│ purge in FIFO, │──────► None (end of stream)
//!                        │ then close     │
//!                        └────────────────┘
//! ```
//!
//! Both directions suspend instead of spinning: `enqueue` waits for space
//! when the queue is full (backpressure), `dequeue` waits for an item when
//! it is empty.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tracing::debug;

/// A queued item.
///
/// The single capability is [`purged`](Self::purged): called exactly once,
/// consuming the message, when the queue is stopped before the message was
/// delivered. It runs on the task that called [`Queue::stop`], not on the
/// consumer, and must not assume the consumer is still alive.
pub trait Message: Send + 'static {
    /// Notifies the message that it will never be delivered.
    fn purged(self);
}

/// Error returned by [`Queue::enqueue`] on a stopped queue.
///
/// Carries the rejected message back to the producer; it was never
/// resident in the queue and is therefore not purged.
pub struct EnqueueError<M>(pub M);

impl<M> std::fmt::Debug for EnqueueError<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EnqueueError(..)")
    }
}

impl<M> std::fmt::Display for EnqueueError<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("queue stopped")
    }
}

impl<M> std::error::Error for EnqueueError<M> {}

struct QueueState<M> {
    items: VecDeque<M>,
    stopped: bool,
}

struct QueueShared<M> {
    capacity: usize,
    state: Mutex<QueueState<M>>,
    /// Permits for free slots; producers acquire, consumers release.
    space: Semaphore,
    /// Permits for resident items; consumers acquire, producers release.
    ready: Semaphore,
}

/// Bounded FIFO of [`Message`]s.
///
/// Cheaply cloneable; clones share the same queue. Capacity is fixed at
/// construction and must be at least one.
///
/// # Example
///
/// ```
/// use sequent_core::Queue;
///
/// struct Item;
/// impl sequent_core::Message for Item {
///     fn purged(self) {}
/// }
///
/// assert!(Queue::<Item>::new(0).is_none());
/// let queue = Queue::<Item>::new(3).unwrap();
/// assert_eq!(queue.capacity(), 3);
/// assert_eq!(queue.len(), 0);
/// ```
pub struct Queue<M: Message> {
    shared: Arc<QueueShared<M>>,
}

impl<M: Message> Clone for Queue<M> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<M: Message> Queue<M> {
    /// Creates a queue with the given capacity.
    ///
    /// Returns `None` when `capacity` is zero; a mailbox that can never
    /// hold a message is unusable.
    #[must_use]
    pub fn new(capacity: usize) -> Option<Self> {
        if capacity == 0 {
            return None;
        }
        Some(Self {
            shared: Arc::new(QueueShared {
                capacity,
                state: Mutex::new(QueueState {
                    items: VecDeque::with_capacity(capacity),
                    stopped: false,
                }),
                space: Semaphore::new(capacity),
                ready: Semaphore::new(0),
            }),
        })
    }

    /// Appends a message, suspending while the queue is full.
    ///
    /// # Errors
    ///
    /// Returns [`EnqueueError`] holding the rejected message when the
    /// queue has been stopped.
    pub async fn enqueue(&self, message: M) -> Result<(), EnqueueError<M>> {
        let Ok(permit) = self.shared.space.acquire().await else {
            return Err(EnqueueError(message));
        };
        permit.forget();
        {
            let mut state = self.shared.state.lock().expect("queue state poisoned");
            if state.stopped {
                return Err(EnqueueError(message));
            }
            state.items.push_back(message);
        }
        self.shared.ready.add_permits(1);
        Ok(())
    }

    /// Removes the oldest message, suspending while the queue is empty.
    ///
    /// Returns `None` once the queue has been stopped and nothing remains
    /// to deliver (end of stream).
    pub async fn dequeue(&self) -> Option<M> {
        let Ok(permit) = self.shared.ready.acquire().await else {
            return None;
        };
        permit.forget();
        let message = {
            let mut state = self.shared.state.lock().expect("queue state poisoned");
            state.items.pop_front()
        };
        if message.is_some() {
            self.shared.space.add_permits(1);
        }
        message
    }

    /// Current number of resident messages.
    ///
    /// Informational: the value may be stale by the time it is read.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared
            .state
            .lock()
            .expect("queue state poisoned")
            .items
            .len()
    }

    /// Returns `true` when no messages are resident.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The fixed capacity this queue was created with.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Stops the queue: purges every resident message in FIFO order, then
    /// closes both directions so producers fail and consumers observe end
    /// of stream.
    ///
    /// Idempotent; a second stop finds nothing to purge. `purged` runs on
    /// the calling task.
    pub fn stop(&self) {
        let drained: Vec<M> = {
            let mut state = self.shared.state.lock().expect("queue state poisoned");
            if state.stopped {
                return;
            }
            state.stopped = true;
            state.items.drain(..).collect()
        };
        if !drained.is_empty() {
            debug!(purged = drained.len(), "queue stopped with resident messages");
        }
        for message in drained {
            message.purged();
        }
        self.shared.space.close();
        self.shared.ready.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::timeout;

    /// Message that records the order in which it was purged.
    struct Tracked {
        label: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Message for Tracked {
        fn purged(self) {
            self.log.lock().unwrap().push(self.label);
        }
    }

    struct Plain(u32);

    impl Message for Plain {
        fn purged(self) {}
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(Queue::<Plain>::new(0).is_none());
        assert!(Queue::<Plain>::new(1).is_some());
    }

    #[tokio::test]
    async fn fifo_delivery() {
        let queue = Queue::new(3).unwrap();
        for n in 0..3 {
            queue.enqueue(Plain(n)).await.unwrap();
        }
        for n in 0..3 {
            assert_eq!(queue.dequeue().await.unwrap().0, n);
        }
    }

    #[tokio::test]
    async fn len_tracks_residency() {
        let queue = Queue::new(2).unwrap();
        assert!(queue.is_empty());
        queue.enqueue(Plain(1)).await.unwrap();
        assert_eq!(queue.len(), 1);
        queue.enqueue(Plain(2)).await.unwrap();
        assert_eq!(queue.len(), 2);
        queue.dequeue().await.unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.capacity(), 2);
    }

    #[tokio::test]
    async fn full_queue_applies_backpressure() {
        let queue = Queue::new(2).unwrap();
        queue.enqueue(Plain(1)).await.unwrap();
        queue.enqueue(Plain(2)).await.unwrap();

        // The third enqueue must suspend until a slot frees up.
        let blocked = timeout(Duration::from_millis(50), queue.enqueue(Plain(3))).await;
        assert!(blocked.is_err());

        queue.dequeue().await.unwrap();
        timeout(Duration::from_millis(50), queue.enqueue(Plain(3)))
            .await
            .expect("slot freed")
            .unwrap();
    }

    #[tokio::test]
    async fn empty_queue_blocks_consumer() {
        let queue = Queue::<Plain>::new(1).unwrap();
        let blocked = timeout(Duration::from_millis(50), queue.dequeue()).await;
        assert!(blocked.is_err());
    }

    #[tokio::test]
    async fn stop_purges_in_fifo_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let queue = Queue::new(3).unwrap();
        for label in ["first", "second", "third"] {
            queue
                .enqueue(Tracked {
                    label,
                    log: Arc::clone(&log),
                })
                .await
                .unwrap();
        }

        queue.stop();

        assert_eq!(*log.lock().unwrap(), vec!["first", "second", "third"]);
        assert!(queue.dequeue().await.is_none());
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let queue = Queue::new(1).unwrap();
        queue
            .enqueue(Tracked {
                label: "only",
                log: Arc::clone(&log),
            })
            .await
            .unwrap();

        queue.stop();
        queue.stop();

        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn enqueue_after_stop_returns_message() {
        let queue = Queue::new(1).unwrap();
        queue.stop();
        let err = queue.enqueue(Plain(7)).await.unwrap_err();
        assert_eq!(err.0 .0, 7);
        assert_eq!(err.to_string(), "queue stopped");
    }

    #[tokio::test]
    async fn stop_wakes_blocked_producer() {
        let queue = Queue::new(1).unwrap();
        queue.enqueue(Plain(1)).await.unwrap();

        let producer = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.enqueue(Plain(2)).await })
        };
        tokio::task::yield_now().await;
        queue.stop();

        let result = timeout(Duration::from_millis(200), producer)
            .await
            .expect("producer woke")
            .unwrap();
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn stop_wakes_blocked_consumer() {
        let queue = Queue::<Plain>::new(1).unwrap();
        let consumer = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.dequeue().await })
        };
        tokio::task::yield_now().await;
        queue.stop();

        let result = timeout(Duration::from_millis(200), consumer)
            .await
            .expect("consumer woke")
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn every_message_is_delivered_or_purged_once() {
        static PURGED: AtomicUsize = AtomicUsize::new(0);

        struct Counted;
        impl Message for Counted {
            fn purged(self) {
                PURGED.fetch_add(1, Ordering::SeqCst);
            }
        }

        let queue = Queue::new(4).unwrap();
        for _ in 0..4 {
            queue.enqueue(Counted).await.unwrap();
        }
        let mut delivered = 0;
        for _ in 0..2 {
            if queue.dequeue().await.is_some() {
                delivered += 1;
            }
        }
        queue.stop();

        assert_eq!(delivered, 2);
        assert_eq!(PURGED.load(Ordering::SeqCst), 2);
    }
}
