//! Topic management
//!
//! A `Topic` holds the subscriber addresses and the last published message
//! for one topic name. The `TopicRegistry` owns every topic and hands them
//! out as `Arc<Topic>`, so the registry's map lock is only ever held long
//! enough to clone a handle.
//!
//! Locking inside a topic:
//! - `subscribers` and `last_message` are short synchronous critical
//!   sections, never held across an `.await`
//! - `publish_lock` is an async mutex held for a whole fan-out, which
//!   serializes publishes on this topic without blocking subscribe calls

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::Mutex;

pub type SubscriberId = String;

#[derive(Debug)]
pub struct Topic {
    pub name: String,
    subscribers: Mutex<HashSet<SubscriberId>>,
    last_message: Mutex<Option<String>>,
    publish_lock: tokio::sync::Mutex<()>,
}

impl Topic {
    /// Create a new topic with the given name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            subscribers: Mutex::new(HashSet::new()),
            last_message: Mutex::new(None),
            publish_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Add a subscriber to the topic. Duplicate adds are ignored.
    pub fn subscribe(&self, id: SubscriberId) -> bool {
        self.subscribers.lock().insert(id)
    }

    /// Remove a subscriber from the topic.
    pub fn unsubscribe(&self, id: &str) -> bool {
        self.subscribers.lock().remove(id)
    }

    pub fn is_subscribed(&self, id: &str) -> bool {
        self.subscribers.lock().contains(id)
    }

    /// Copy of the current subscriber set.
    pub fn subscribers(&self) -> Vec<SubscriberId> {
        self.subscribers.lock().iter().cloned().collect()
    }

    pub fn last_message(&self) -> Option<String> {
        self.last_message.lock().clone()
    }

    pub(crate) fn set_last_message(&self, message: &str) {
        *self.last_message.lock() = Some(message.to_string());
    }

    pub(crate) async fn lock_publish(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.publish_lock.lock().await
    }
}

#[derive(Debug, Default)]
pub struct TopicRegistry {
    topics: DashMap<String, Arc<Topic>>,
}

impl TopicRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `name` unless it exists. Returns `true` if it was created.
    pub fn create(&self, name: &str) -> bool {
        match self.topics.entry(name.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(Topic::new(name)));
                true
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<Topic>> {
        self.topics.get(name).map(|topic| Arc::clone(topic.value()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.topics.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.topics.iter().map(|topic| topic.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}
