use crate::publisher::Registry;
use crate::subscriber::Subscriber;

use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, trace};

struct Subscribers<T> {
    senders: HashMap<u64, mpsc::Sender<T>>,
    closed: bool,
}

struct TopicInner<T> {
    name: String,
    capacity: usize,
    next_id: AtomicU64,
    subscribers: RwLock<Subscribers<T>>,
    registry: Weak<Registry<T>>,
}

/// A named fan-out point.
///
/// Handles are cheap to clone and all refer to the same subscriber set.
pub struct Topic<T> {
    inner: Arc<TopicInner<T>>,
}

impl<T> Clone for Topic<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Debug for Topic<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Topic")
            .field("name", &self.inner.name)
            .field("subscribers", &self.subscriber_count())
            .finish_non_exhaustive()
    }
}

impl<T> Topic<T> {
    pub(crate) fn new(name: String, capacity: usize, registry: Weak<Registry<T>>) -> Self {
        Self {
            inner: Arc::new(TopicInner {
                name,
                capacity,
                next_id: AtomicU64::new(0),
                subscribers: RwLock::new(Subscribers {
                    senders: HashMap::new(),
                    closed: false,
                }),
                registry,
            }),
        }
    }

    pub(crate) fn same_topic(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// The topic's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Number of currently registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.read().senders.len()
    }

    /// Whether [`Topic::close`] has been called on this topic.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.subscribers.read().closed
    }

    /// Registers a new subscriber. Never blocks on publishers.
    ///
    /// On a closed topic the returned subscriber's stream has already ended.
    #[must_use]
    pub fn subscribe(&self) -> Subscriber<T> {
        self.subscribe_with_capacity(self.inner.capacity)
    }

    /// Like [`Topic::subscribe`], with a queue of `capacity` items (at least
    /// one) instead of the registry's default.
    #[must_use]
    pub fn subscribe_with_capacity(&self, capacity: usize) -> Subscriber<T> {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1;

        let mut subscribers = self.inner.subscribers.write();
        if subscribers.closed {
            // `sender` is never registered, so the stream ends at once.
            debug!(topic = %self.inner.name, subscriber = id, "subscribed to closed topic");
        } else {
            subscribers.senders.insert(id, sender);
            debug!(topic = %self.inner.name, subscriber = id, capacity, "subscribed");
        }
        drop(subscribers);

        Subscriber::new(id, self.clone(), receiver)
    }

    /// Removes one subscriber. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: u64) -> bool {
        let removed = self.inner.subscribers.write().senders.remove(&id).is_some();
        if removed {
            debug!(topic = %self.inner.name, subscriber = id, "unsubscribed");
        }
        removed
    }

    /// Force-unsubscribes everyone and removes the topic from its registry.
    ///
    /// Each subscriber still receives whatever was already queued, followed by
    /// the end-of-stream marker.
    pub fn close(&self) {
        let senders = {
            let mut subscribers = self.inner.subscribers.write();
            subscribers.closed = true;
            std::mem::take(&mut subscribers.senders)
        };
        let count = senders.len();

        // Dropping the senders is what ends each subscriber's stream.
        drop(senders);

        if let Some(registry) = self.inner.registry.upgrade() {
            registry.remove(self);
        }

        debug!(topic = %self.inner.name, subscribers = count, "topic closed");
    }
}

impl<T> Topic<T>
where
    T: Clone,
{
    /// Delivers `value` to every current subscriber without waiting.
    ///
    /// Subscribers whose queue is full miss this value. Returns how many
    /// subscribers it was queued for.
    pub fn publish(&self, value: T) -> usize {
        let subscribers = self.inner.subscribers.read();
        let mut delivered = 0;

        for (id, sender) in &subscribers.senders {
            match sender.try_send(value.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    trace!(topic = %self.inner.name, subscriber = id, "queue full, value dropped");
                }
                Err(TrySendError::Closed(_)) => {}
            }
        }

        delivered
    }
}

#[cfg(test)]
mod tests {
    use crate::Publisher;

    use std::time::Duration;

    use tokio::time::timeout;

    #[tokio::test]
    async fn test_every_subscriber_receives_in_order() {
        let publisher = Publisher::<&'static str>::new(4);
        let topic = publisher.topic("letters");

        let mut first = topic.subscribe();
        let mut second = topic.subscribe();

        assert_eq!(topic.publish("a"), 2);
        assert_eq!(topic.publish("b"), 2);
        assert_eq!(topic.publish("c"), 2);

        for subscriber in [&mut first, &mut second] {
            for expected in ["a", "b", "c"] {
                assert_eq!(
                    timeout(Duration::from_secs(1), subscriber.recv())
                        .await
                        .unwrap(),
                    Some(expected)
                );
            }
        }
    }

    #[tokio::test]
    async fn test_full_queue_drops_instead_of_blocking() {
        let publisher = Publisher::<u32>::default();
        let topic = publisher.topic("numbers");

        let mut slow = topic.subscribe();
        let mut fast = topic.subscribe();

        assert_eq!(topic.publish(1), 2);
        assert_eq!(fast.recv().await, Some(1));

        // `slow` still holds 1, so only `fast` gets 2.
        assert_eq!(topic.publish(2), 1);
        assert_eq!(fast.recv().await, Some(2));

        assert_eq!(slow.recv().await, Some(1));
        assert!(
            timeout(Duration::from_millis(50), slow.recv())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_subscriber_ids_are_unique() {
        let publisher = Publisher::<u32>::default();
        let topic = publisher.topic("numbers");

        let a = topic.subscribe();
        let b = topic.subscribe();
        let c = topic.subscribe();

        assert_ne!(a.id(), b.id());
        assert_ne!(b.id(), c.id());
        assert_ne!(a.id(), c.id());
    }

    #[tokio::test]
    async fn test_close_delivers_queued_value_then_end() {
        let publisher = Publisher::<u32>::default();
        let topic = publisher.topic("numbers");
        let mut subscriber = topic.subscribe();

        topic.publish(42);
        topic.close();

        assert_eq!(subscriber.recv().await, Some(42));
        assert_eq!(subscriber.recv().await, None);
        assert_eq!(topic.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_subscribe_on_closed_handle_ends_immediately() {
        let publisher = Publisher::<u32>::default();
        let stale = publisher.topic("session:A");
        stale.close();

        let mut subscriber = stale.subscribe();

        assert!(stale.is_closed());
        assert_eq!(
            timeout(Duration::from_secs(1), subscriber.recv())
                .await
                .unwrap(),
            None
        );
        assert_eq!(stale.subscriber_count(), 0);
        assert!(!publisher.contains("session:A"));
        assert!(!publisher.topic("session:A").is_closed());
    }

    #[tokio::test]
    async fn test_subscribe_with_capacity_keeps_bursts() {
        let publisher = Publisher::<u32>::default();
        let topic = publisher.topic("numbers");
        let mut wide = topic.subscribe_with_capacity(16);
        let mut narrow = topic.subscribe();

        for i in 0..10 {
            topic.publish(i);
        }
        topic.close();

        let mut received = Vec::new();
        while let Some(value) = wide.recv().await {
            received.push(value);
        }
        assert_eq!(received, (0..10).collect::<Vec<_>>());

        assert_eq!(narrow.recv().await, Some(0));
        assert_eq!(narrow.recv().await, None);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let publisher = Publisher::<u32>::default();

        assert_eq!(publisher.topic("empty").publish(1), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_publishers_and_subscribers() {
        let publisher = Publisher::<u64>::new(1024);
        let topic = publisher.topic("busy");
        let mut observer = topic.subscribe();

        let mut handles = Vec::new();
        for worker in 0..4u64 {
            let topic = topic.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..100 {
                    let transient = topic.subscribe();
                    topic.publish(worker * 1000 + i);
                    drop(transient);
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let mut received = 0;
        while let Ok(Some(_)) = timeout(Duration::from_millis(50), observer.recv()).await {
            received += 1;
        }

        assert_eq!(received, 400);
        assert_eq!(topic.subscriber_count(), 1);
    }
}
