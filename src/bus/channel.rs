//! A single bounded, typed, multi-producer / single-consumer channel with a
//! configurable overflow policy.
//!
//! Built directly on a `parking_lot::Mutex<VecDeque<T>>` plus a
//! `tokio::sync::Notify` rather than `tokio::mpsc`, because `DropOldest`
//! needs to evict from the *full* end of the queue on the producer side —
//! something `tokio::mpsc`'s bounded channel has no hook for.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::Instant;

/// What happens to an item when the channel is at capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Evict the queue's oldest item to make room for the new one.
    DropOldest,
    /// Refuse the new item, keeping the queue as-is.
    DropNewest,
    /// Wait (async) until a slot frees up.
    Block,
}

/// Result of a [`Sender::publish`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Published,
    DroppedOldest,
    DroppedNewest,
    Closed,
}

struct Inner<T> {
    queue: Mutex<VecDeque<T>>,
    capacity: usize,
    policy: OverflowPolicy,
    not_empty: Notify,
    not_full: Notify,
    closed: std::sync::atomic::AtomicBool,
    dropped_total: AtomicU64,
    last_drop_log: Mutex<Option<Instant>>,
}

/// A named, bounded channel. Clone a [`Sender`]/[`Receiver`] pair off it via
/// [`Channel::split`]; `name()` is used for the rate-limited drop log line.
pub struct Channel<T> {
    name: &'static str,
    inner: Arc<Inner<T>>,
}

impl<T> Channel<T> {
    pub fn new(name: &'static str, capacity: usize, policy: OverflowPolicy) -> Self {
        Self {
            name,
            inner: Arc::new(Inner {
                queue: Mutex::new(VecDeque::with_capacity(capacity)),
                capacity,
                policy,
                not_empty: Notify::new(),
                not_full: Notify::new(),
                closed: std::sync::atomic::AtomicBool::new(false),
                dropped_total: AtomicU64::new(0),
                last_drop_log: Mutex::new(None),
            }),
        }
    }

    pub fn sender(&self) -> Sender<T> {
        Sender {
            name: self.name,
            inner: self.inner.clone(),
        }
    }

    pub fn receiver(&self) -> Receiver<T> {
        Receiver {
            inner: self.inner.clone(),
        }
    }

    pub fn dropped_total(&self) -> u64 {
        self.inner.dropped_total.load(Ordering::Relaxed)
    }

    /// Signal producers to stop blocking and consumers to drain-then-stop.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        self.inner.not_empty.notify_waiters();
        self.inner.not_full.notify_waiters();
    }
}

pub struct Sender<T> {
    name: &'static str,
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Sender<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            inner: self.inner.clone(),
        }
    }
}

impl<T> Sender<T> {
    /// Publish `item`, applying the channel's overflow policy if full.
    /// Never blocks indefinitely except under [`OverflowPolicy::Block`].
    pub async fn publish(&self, item: T) -> PublishOutcome {
        loop {
            if self.inner.closed.load(Ordering::SeqCst) {
                return PublishOutcome::Closed;
            }
            {
                let mut queue = self.inner.queue.lock();
                if queue.len() < self.inner.capacity {
                    queue.push_back(item);
                    drop(queue);
                    self.inner.not_empty.notify_one();
                    return PublishOutcome::Published;
                }
                match self.inner.policy {
                    OverflowPolicy::DropOldest => {
                        queue.pop_front();
                        queue.push_back(item);
                        drop(queue);
                        self.inner.not_empty.notify_one();
                        self.record_drop(PublishOutcome::DroppedOldest);
                        return PublishOutcome::DroppedOldest;
                    }
                    OverflowPolicy::DropNewest => {
                        drop(queue);
                        self.record_drop(PublishOutcome::DroppedNewest);
                        return PublishOutcome::DroppedNewest;
                    }
                    OverflowPolicy::Block => {
                        // fall through to wait below
                    }
                }
            }
            self.inner.not_full.notified().await;
        }
    }

    fn record_drop(&self, outcome: PublishOutcome) {
        self.inner.dropped_total.fetch_add(1, Ordering::Relaxed);
        let mut last = self.inner.last_drop_log.lock();
        let now = Instant::now();
        let should_log = last.map(|t| now.duration_since(t).as_secs() >= 1).unwrap_or(true);
        if should_log {
            *last = Some(now);
            tracing::warn!(
                channel = self.name,
                outcome = ?outcome,
                total_dropped = self.inner.dropped_total.load(Ordering::Relaxed),
                "event bus channel overflow"
            );
        }
    }
}

pub struct Receiver<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Receiver<T> {
    /// Await the next item, or `None` once the channel is closed and drained.
    pub async fn recv(&mut self) -> Option<T> {
        loop {
            {
                let mut queue = self.inner.queue.lock();
                if let Some(item) = queue.pop_front() {
                    drop(queue);
                    self.inner.not_full.notify_one();
                    return Some(item);
                }
                if self.inner.closed.load(Ordering::SeqCst) {
                    return None;
                }
            }
            self.inner.not_empty.notified().await;
        }
    }

    pub fn len(&self) -> usize {
        self.inner.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn drop_oldest_evicts_front_item() {
        let chan: Channel<u32> = Channel::new("test", 2, OverflowPolicy::DropOldest);
        let tx = chan.sender();
        let mut rx = chan.receiver();
        assert_eq!(tx.publish(1).await, PublishOutcome::Published);
        assert_eq!(tx.publish(2).await, PublishOutcome::Published);
        assert_eq!(tx.publish(3).await, PublishOutcome::DroppedOldest);
        assert_eq!(rx.recv().await, Some(2));
        assert_eq!(rx.recv().await, Some(3));
    }

    #[tokio::test]
    async fn drop_newest_keeps_queue_unchanged() {
        let chan: Channel<u32> = Channel::new("test", 1, OverflowPolicy::DropNewest);
        let tx = chan.sender();
        let mut rx = chan.receiver();
        assert_eq!(tx.publish(1).await, PublishOutcome::Published);
        assert_eq!(tx.publish(2).await, PublishOutcome::DroppedNewest);
        assert_eq!(rx.recv().await, Some(1));
    }

    #[tokio::test]
    async fn block_policy_waits_for_a_free_slot() {
        let chan: Channel<u32> = Channel::new("test", 1, OverflowPolicy::Block);
        let tx = chan.sender();
        let mut rx = chan.receiver();
        assert_eq!(tx.publish(1).await, PublishOutcome::Published);

        let tx2 = tx.clone();
        let publisher = tokio::spawn(async move { tx2.publish(2).await });

        tokio::task::yield_now().await;
        assert_eq!(rx.recv().await, Some(1));
        assert_eq!(publisher.await.unwrap(), PublishOutcome::Published);
        assert_eq!(rx.recv().await, Some(2));
    }

    #[tokio::test]
    async fn closed_channel_rejects_publish_and_drains_then_ends() {
        let chan: Channel<u32> = Channel::new("test", 2, OverflowPolicy::Block);
        let tx = chan.sender();
        let mut rx = chan.receiver();
        tx.publish(1).await;
        chan.close();
        assert_eq!(tx.publish(2).await, PublishOutcome::Closed);
        assert_eq!(rx.recv().await, Some(1));
        assert_eq!(rx.recv().await, None);
    }
}
