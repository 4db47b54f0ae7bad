//! Delivery engine
//!
//! Fans one published message out to every subscriber of a topic and turns
//! delivery failures into dead letters plus a liveness transition:
//!
//! - subscriber not live: the message is queued as a dead letter, no network
//!   call is made
//! - subscriber live, callback succeeds: delivered
//! - subscriber live, callback fails or times out: queued as a dead letter
//!   and the subscriber is dropped from the live set until it reconnects,
//!   unless it already reconnected while the attempt was in flight
//!
//! Each attempt runs on its own tokio task; `fan_out` returns once all of
//! them have finished. Failures never propagate to the publisher.
//!
//! The same engine flushes a subscriber's dead letters when it reconnects.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use crate::broker::connections::ConnectionRegistry;
use crate::broker::dead_letter::DeadLetterStore;
use crate::broker::message::DeadLetter;
use crate::broker::topic::Topic;
use crate::utils::error::RpcError;

/// Callbacks every subscriber endpoint must answer.
///
/// `address` is the subscriber's registered address; implementations decide
/// how to reach it. The returned string is the subscriber's acknowledgement.
#[async_trait]
pub trait SubscriberTransport: Send + Sync + 'static {
    async fn send_message(
        &self,
        address: &str,
        topic: &str,
        message: &str,
    ) -> Result<String, RpcError>;

    async fn send_dead_letters(
        &self,
        address: &str,
        dead_letters: &[DeadLetter],
    ) -> Result<String, RpcError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The subscriber acknowledged the message.
    Delivered,
    /// The subscriber was not live; the message went straight to its dead letters.
    Deferred,
    /// The callback failed; the message was dead-lettered and the subscriber marked unreachable.
    Failed,
}

/// Per-publish tally, used for logging only.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FanOutReport {
    pub delivered: usize,
    pub deferred: usize,
    pub failed: usize,
}

impl FanOutReport {
    fn record(&mut self, outcome: DeliveryOutcome) {
        match outcome {
            DeliveryOutcome::Delivered => self.delivered += 1,
            DeliveryOutcome::Deferred => self.deferred += 1,
            DeliveryOutcome::Failed => self.failed += 1,
        }
    }

    pub fn attempts(&self) -> usize {
        self.delivered + self.deferred + self.failed
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Nothing was queued.
    Empty,
    Delivered(usize),
    /// The callback failed and the batch went back into the queue.
    Requeued(usize),
    /// The callback failed and the batch was discarded.
    Dropped(usize),
}

#[derive(Clone)]
pub struct DeliveryEngine {
    connections: Arc<ConnectionRegistry>,
    dead_letters: Arc<DeadLetterStore>,
    transport: Arc<dyn SubscriberTransport>,
    timeout: Option<Duration>,
    requeue_failed_flush: bool,
}

impl DeliveryEngine {
    pub fn new(
        connections: Arc<ConnectionRegistry>,
        dead_letters: Arc<DeadLetterStore>,
        transport: Arc<dyn SubscriberTransport>,
        timeout: Option<Duration>,
        requeue_failed_flush: bool,
    ) -> Self {
        Self {
            connections,
            dead_letters,
            transport,
            timeout,
            requeue_failed_flush,
        }
    }

    /// Deliver `message` to a snapshot of `topic`'s subscribers.
    ///
    /// Callers are expected to hold the topic's publish lock.
    pub async fn fan_out(&self, topic: &Topic, message: &str) -> FanOutReport {
        let subscribers = topic.subscribers();
        let mut report = FanOutReport::default();
        if subscribers.is_empty() {
            return report;
        }

        let topic_name: Arc<str> = Arc::from(topic.name.as_str());
        let message: Arc<str> = Arc::from(message);
        let mut attempts = JoinSet::new();

        for subscriber in subscribers {
            let engine = self.clone();
            let topic_name = Arc::clone(&topic_name);
            let message = Arc::clone(&message);
            attempts.spawn(async move { engine.deliver(&topic_name, &subscriber, &message).await });
        }

        while let Some(joined) = attempts.join_next().await {
            match joined {
                Ok(outcome) => report.record(outcome),
                Err(e) => {
                    error!("Delivery task on topic {} aborted: {}", topic_name, e);
                    report.failed += 1;
                }
            }
        }

        report
    }

    async fn deliver(&self, topic: &str, subscriber: &str, message: &str) -> DeliveryOutcome {
        let Some(epoch) = self.connections.epoch(subscriber) else {
            debug!("{subscriber} is not live, dead-lettering message on {topic}");
            self.dead_letter(subscriber, topic, message);
            return DeliveryOutcome::Deferred;
        };

        let call = self.transport.send_message(subscriber, topic, message);
        match self.bounded(subscriber, call).await {
            Ok(ack) => {
                debug!("{subscriber} acknowledged message on {topic}: {ack}");
                DeliveryOutcome::Delivered
            }
            Err(e) => {
                warn!("Failed to deliver message on {topic} to {subscriber}: {e}");
                self.dead_letter(subscriber, topic, message);
                if !self.connections.disconnect_if(subscriber, epoch) {
                    debug!("{subscriber} reconnected during the attempt, keeping it live");
                }
                DeliveryOutcome::Failed
            }
        }
    }

    fn dead_letter(&self, subscriber: &str, topic: &str, message: &str) {
        if let Some(evicted) = self
            .dead_letters
            .push(subscriber, DeadLetter::new(topic, message))
        {
            warn!(
                "Dead-letter queue of {subscriber} is full ({}), evicted oldest entry from {}",
                self.dead_letters.capacity(),
                evicted.topic
            );
        }
    }

    /// Send everything queued for `address` in one `send_dead_letters` call.
    pub async fn flush_dead_letters(&self, address: &str) -> FlushOutcome {
        let batch = self.dead_letters.drain(address);
        if batch.is_empty() {
            return FlushOutcome::Empty;
        }

        let count = batch.len();
        let call = self.transport.send_dead_letters(address, &batch);
        let result = self.bounded(address, call).await;
        match result {
            Ok(_) => {
                self.dead_letters.settle(address);
                FlushOutcome::Delivered(count)
            }
            Err(e) if self.requeue_failed_flush => {
                warn!("Failed to flush {count} dead letters to {address}, requeueing: {e}");
                let evicted = self.dead_letters.requeue(address, batch);
                if evicted > 0 {
                    warn!("Requeue for {address} evicted {evicted} dead letters over capacity");
                }
                FlushOutcome::Requeued(count)
            }
            Err(e) => {
                warn!("Failed to flush {count} dead letters to {address}, dropping them: {e}");
                self.dead_letters.settle(address);
                FlushOutcome::Dropped(count)
            }
        }
    }

    async fn bounded<F>(&self, address: &str, call: F) -> Result<String, RpcError>
    where
        F: Future<Output = Result<String, RpcError>>,
    {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| RpcError::Timeout {
                    address: address.to_string(),
                    timeout: limit,
                })?,
            None => call.await,
        }
    }
}
