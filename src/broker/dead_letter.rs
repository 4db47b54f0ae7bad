//! Dead-letter store
//!
//! One FIFO queue of [`DeadLetter`]s per subscriber address. Entries land
//! here when a live delivery was skipped (subscriber not live) or failed, and
//! leave when the subscriber reconnects (drain), unsubscribes from the topic
//! (purge) or when a bounded queue overflows (the oldest entry is evicted).
//!
//! Queue order is enqueue order. A drained batch is therefore chronological,
//! which also preserves per-topic order.

use std::collections::{HashSet, VecDeque};

use dashmap::DashMap;

use crate::broker::message::DeadLetter;
use crate::broker::topic::SubscriberId;

#[derive(Debug, Default)]
struct Mailbox {
    letters: VecDeque<DeadLetter>,
    /// Flushes that took a batch and have not settled yet.
    in_flight: usize,
    /// Topics purged while a flush was in flight; filtered out on requeue.
    purged: HashSet<String>,
}

impl Mailbox {
    fn settle(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
        if self.in_flight == 0 {
            self.purged.clear();
        }
    }
}

#[derive(Debug)]
pub struct DeadLetterStore {
    queues: DashMap<SubscriberId, Mailbox>,
    /// Maximum entries per subscriber; `0` disables the bound.
    capacity: usize,
}

impl Default for DeadLetterStore {
    fn default() -> Self {
        Self::new(0)
    }
}

impl DeadLetterStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            queues: DashMap::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Create an empty queue for `address` unless one exists.
    pub fn ensure(&self, address: &str) {
        self.queues.entry(address.to_string()).or_default();
    }

    /// Append a letter. Returns the entry evicted to make room, if any.
    pub fn push(&self, address: &str, letter: DeadLetter) -> Option<DeadLetter> {
        let mut mailbox = self.queues.entry(address.to_string()).or_default();
        let evicted = if self.capacity > 0 && mailbox.letters.len() >= self.capacity {
            mailbox.letters.pop_front()
        } else {
            None
        };
        mailbox.letters.push_back(letter);
        evicted
    }

    /// Remove every entry of `address` that belongs to `topic`, including
    /// entries currently out in a flush should they come back via `requeue`.
    /// Returns how many queued entries were removed.
    pub fn purge_topic(&self, address: &str, topic: &str) -> usize {
        match self.queues.get_mut(address) {
            Some(mut mailbox) => {
                let before = mailbox.letters.len();
                mailbox.letters.retain(|letter| letter.topic != topic);
                if mailbox.in_flight > 0 {
                    mailbox.purged.insert(topic.to_string());
                }
                before - mailbox.letters.len()
            }
            None => 0,
        }
    }

    /// Take every queued entry of `address` for a flush.
    ///
    /// A non-empty batch must be settled with either `requeue` or `settle`.
    pub fn drain(&self, address: &str) -> Vec<DeadLetter> {
        match self.queues.get_mut(address) {
            Some(mut mailbox) if !mailbox.letters.is_empty() => {
                mailbox.in_flight += 1;
                mailbox.letters.drain(..).collect()
            }
            _ => Vec::new(),
        }
    }

    /// The flush of a drained batch finished without putting it back.
    pub fn settle(&self, address: &str) {
        if let Some(mut mailbox) = self.queues.get_mut(address) {
            mailbox.settle();
        }
    }

    /// Put a previously drained batch back in front of whatever was queued
    /// since, minus topics purged in the meantime. Returns how many entries
    /// the capacity bound evicted.
    pub fn requeue(&self, address: &str, batch: Vec<DeadLetter>) -> usize {
        let mut mailbox = self.queues.entry(address.to_string()).or_default();
        let mailbox = &mut *mailbox;
        let newer = std::mem::take(&mut mailbox.letters);
        let purged = &mailbox.purged;
        mailbox
            .letters
            .extend(batch.into_iter().filter(|letter| !purged.contains(&letter.topic)));
        mailbox.letters.extend(newer);
        mailbox.settle();

        let mut evicted = 0;
        if self.capacity > 0 {
            while mailbox.letters.len() > self.capacity {
                mailbox.letters.pop_front();
                evicted += 1;
            }
        }
        evicted
    }

    /// Snapshot of the entries queued for `address`, oldest first.
    pub fn pending(&self, address: &str) -> Vec<DeadLetter> {
        self.queues
            .get(address)
            .map(|mailbox| mailbox.letters.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self, address: &str) -> usize {
        self.queues
            .get(address)
            .map(|mailbox| mailbox.letters.len())
            .unwrap_or(0)
    }
}
