use crate::DEFAULT_QUEUE_CAPACITY;
use crate::topic::Topic;

use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

pub(crate) struct Registry<T> {
    topics: RwLock<HashMap<String, Topic<T>>>,
    capacity: usize,
}

impl<T> Registry<T> {
    /// Removes `topic` from the map, unless the name has since been taken by
    /// a newer topic.
    pub(crate) fn remove(&self, topic: &Topic<T>) {
        let mut topics = self.topics.write();
        if topics
            .get(topic.name())
            .is_some_and(|current| current.same_topic(topic))
        {
            topics.remove(topic.name());
            debug!(topic = %topic.name(), "topic removed from registry");
        }
    }
}

/// Registry of named topics.
///
/// Cloning a `Publisher` is cheap and every clone sees the same topics.
pub struct Publisher<T> {
    registry: Arc<Registry<T>>,
}

impl<T> Clone for Publisher<T> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
        }
    }
}

impl<T> Debug for Publisher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Publisher")
            .field("topics", &self.topic_count())
            .field("capacity", &self.registry.capacity)
            .finish()
    }
}

impl<T> Default for Publisher<T>
where
    T: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

impl<T> Publisher<T>
where
    T: Clone + Send + 'static,
{
    /// Creates an empty registry whose subscribers get queues of `capacity`
    /// items (at least one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            registry: Arc::new(Registry {
                topics: RwLock::new(HashMap::new()),
                capacity: capacity.max(1),
            }),
        }
    }

    /// Returns the topic called `name`, creating it if it does not exist.
    pub fn topic(&self, name: impl Into<String>) -> Topic<T> {
        let name = name.into();

        if let Some(topic) = self.registry.topics.read().get(&name) {
            return topic.clone();
        }

        self.registry
            .topics
            .write()
            .entry(name)
            .or_insert_with_key(|name| {
                debug!(topic = %name, "topic created");
                Topic::new(
                    name.clone(),
                    self.registry.capacity,
                    Arc::downgrade(&self.registry),
                )
            })
            .clone()
    }

    /// Closes every topic in the registry.
    pub fn shutdown(&self) {
        let topics: Vec<_> = self.registry.topics.write().drain().map(|(_, t)| t).collect();

        for topic in topics {
            topic.close();
        }
    }
}

impl<T> Publisher<T> {
    /// Whether a topic called `name` currently exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.registry.topics.read().contains_key(name)
    }

    /// Number of topics currently in the registry.
    #[must_use]
    pub fn topic_count(&self) -> usize {
        self.registry.topics.read().len()
    }
}
