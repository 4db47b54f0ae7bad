//! Liveness registry
//!
//! Tracks which subscriber addresses the broker currently believes are
//! reachable. Membership is advisory: it is set by `Connect` and cleared by a
//! failed delivery, nothing else. There is no heartbeat and no expiry.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use crate::broker::topic::SubscriberId;

/// Live addresses, each tagged with the epoch of its latest `Connect`.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    live: DashMap<SubscriberId, u64>,
    next_epoch: AtomicU64,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `address` as live under a fresh epoch. Returns `false` if it
    /// already was live.
    pub fn connect(&self, address: &str) -> bool {
        let epoch = self.next_epoch.fetch_add(1, Ordering::Relaxed) + 1;
        self.live.insert(address.to_string(), epoch).is_none()
    }

    /// Drop `address` from the live set. Returns `false` if it was not there.
    pub fn disconnect(&self, address: &str) -> bool {
        self.live.remove(address).is_some()
    }

    /// Drop `address` only if no `Connect` happened since `epoch` was read.
    pub fn disconnect_if(&self, address: &str, epoch: u64) -> bool {
        self.live
            .remove_if(address, |_, current| *current == epoch)
            .is_some()
    }

    /// Epoch of the latest `Connect`, or `None` if `address` is not live.
    pub fn epoch(&self, address: &str) -> Option<u64> {
        self.live.get(address).map(|entry| *entry)
    }

    pub fn is_connected(&self, address: &str) -> bool {
        self.live.contains_key(address)
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}
