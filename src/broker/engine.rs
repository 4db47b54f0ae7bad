//! Broker engine
//!
//! `Broker` is the facade the RPC layer talks to. It owns:
//! - the liveness registry (`ConnectionRegistry`)
//! - the topic registry (subscriber sets and last messages)
//! - the per-subscriber dead-letter queues
//! - the delivery engine that performs fan-out and dead-letter flushes
//!
//! Concurrency and usage notes:
//! - Every method takes `&self`; share the broker as `Arc<Broker>`. There is
//!   no outer lock, each registry synchronizes itself.
//! - `publish` holds the topic's publish lock for the whole fan-out, so two
//!   publishes on one topic never interleave while different topics proceed
//!   in parallel.
//! - `connect` and `publish` perform outbound calls and only return once
//!   those finished (or timed out).

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::broker::connections::ConnectionRegistry;
use crate::broker::dead_letter::DeadLetterStore;
use crate::broker::delivery::{DeliveryEngine, FlushOutcome, SubscriberTransport};
use crate::broker::message::DeadLetter;
use crate::broker::status::Status;
use crate::broker::topic::{SubscriberId, TopicRegistry};
use crate::config::BrokerSettings;
use crate::transport::callback::WebSocketCallbacks;

pub struct Broker {
    topics: TopicRegistry,
    connections: Arc<ConnectionRegistry>,
    dead_letters: Arc<DeadLetterStore>,
    delivery: DeliveryEngine,
}

impl Default for Broker {
    fn default() -> Self {
        Self::new()
    }
}

impl Broker {
    /// Broker with default settings that calls subscribers back over WebSocket.
    pub fn new() -> Self {
        Self::with_settings(&BrokerSettings::default(), Arc::new(WebSocketCallbacks))
    }

    pub fn with_transport(transport: Arc<dyn SubscriberTransport>) -> Self {
        Self::with_settings(&BrokerSettings::default(), transport)
    }

    pub fn with_settings(settings: &BrokerSettings, transport: Arc<dyn SubscriberTransport>) -> Self {
        let connections = Arc::new(ConnectionRegistry::new());
        let dead_letters = Arc::new(DeadLetterStore::new(settings.max_dead_letters));
        let delivery = DeliveryEngine::new(
            Arc::clone(&connections),
            Arc::clone(&dead_letters),
            transport,
            settings.delivery_timeout(),
            settings.requeue_failed_flush,
        );

        Self {
            topics: TopicRegistry::new(),
            connections,
            dead_letters,
            delivery,
        }
    }

    /// Register `address` as live and hand it whatever it missed.
    pub async fn connect(&self, address: &str) -> Status {
        let newly_connected = self.connections.connect(address);
        self.dead_letters.ensure(address);

        match self.delivery.flush_dead_letters(address).await {
            FlushOutcome::Empty => {}
            FlushOutcome::Delivered(count) => {
                info!("Delivered {count} dead letters to {address}");
            }
            FlushOutcome::Requeued(count) | FlushOutcome::Dropped(count) => {
                debug!("Dead-letter flush of {count} entries to {address} did not go through");
            }
        }

        if newly_connected {
            info!("Client {address} connected");
            Status::Connected
        } else {
            info!("Client {address} already connected");
            Status::AlreadyConnected
        }
    }

    /// Create `topic` if needed. Always succeeds.
    pub fn new_topic(&self, topic: &str) -> Status {
        if self.topics.create(topic) {
            info!("Topic {topic} created");
        } else {
            debug!("Topic {topic} already exists");
        }
        Status::Created
    }

    pub fn subscribe(&self, topic: &str, address: &str) -> Status {
        if !self.connections.is_connected(address) {
            warn!("Rejected subscription of {address} to {topic}: not connected");
            return Status::NotConnected;
        }

        let Some(entry) = self.topics.get(topic) else {
            warn!("Rejected subscription of {address} to {topic}: no such topic");
            return Status::NoTopic;
        };

        if entry.subscribe(address.to_string()) {
            info!("{address} subscribed to {topic}");
        }
        Status::Subscribed
    }

    /// Drop the subscription and any dead letters it left behind. Always succeeds.
    pub fn unsubscribe(&self, topic: &str, address: &str) -> Status {
        if let Some(entry) = self.topics.get(topic) {
            if entry.unsubscribe(address) {
                info!("{address} unsubscribed from {topic}");
            }
        }

        let purged = self.dead_letters.purge_topic(address, topic);
        if purged > 0 {
            debug!("Purged {purged} dead letters of {address} for {topic}");
        }
        Status::Unsubscribed
    }

    /// Store `message` as the topic's last message and deliver it to every
    /// subscriber. Unknown topics are rejected without side effects.
    pub async fn publish(&self, topic: &str, message: &str) -> Status {
        let Some(entry) = self.topics.get(topic) else {
            warn!("Publish to unknown topic {topic} rejected");
            return Status::NoTopic;
        };

        let _serialized = entry.lock_publish().await;
        entry.set_last_message(message);

        let report = self.delivery.fan_out(&entry, message).await;
        debug!(
            "Published on {topic}: {} attempts, {} delivered, {} deferred, {} failed",
            report.attempts(),
            report.delivered,
            report.deferred,
            report.failed
        );

        Status::Published
    }

    pub fn is_connected(&self, address: &str) -> bool {
        self.connections.is_connected(address)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn topic_exists(&self, topic: &str) -> bool {
        self.topics.contains(topic)
    }

    pub fn topic_names(&self) -> Vec<String> {
        self.topics.names()
    }

    /// Subscribers of `topic`, or `None` if the topic does not exist.
    pub fn subscribers(&self, topic: &str) -> Option<Vec<SubscriberId>> {
        self.topics.get(topic).map(|entry| entry.subscribers())
    }

    pub fn last_message(&self, topic: &str) -> Option<String> {
        self.topics.get(topic).and_then(|entry| entry.last_message())
    }

    /// Dead letters waiting for `address`, oldest first.
    pub fn pending_dead_letters(&self, address: &str) -> Vec<DeadLetter> {
        self.dead_letters.pending(address)
    }
}

impl fmt::Debug for Broker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Broker")
            .field("topics", &self.topics.len())
            .field("connections", &self.connections.len())
            .finish()
    }
}
