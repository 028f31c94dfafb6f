//! # Channel Store
//!
//! Holds one slot per registry key and publishes each batch as a new
//! immutable snapshot through a `tokio::sync::watch` channel. Readers clone
//! an `Arc<ChannelSnapshot>`; they never see half of a batch.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

use super::{ChannelBatch, ChannelValue};
use crate::registry::ChannelRegistry;

/// State of one channel
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelState {
    /// Latest value, `None` until the first update
    pub value: Option<ChannelValue>,

    /// When the value was last written
    pub updated_at: Option<DateTime<Utc>>,

    /// Sequence number of the batch that last wrote the value
    pub sequence: u64,
}

impl ChannelState {
    /// Time since the last update, `None` if never updated
    pub fn age(&self, now: DateTime<Utc>) -> Option<chrono::Duration> {
        self.updated_at.map(|t| now - t)
    }
}

/// Immutable view of every channel after a batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelSnapshot {
    slots: HashMap<&'static str, ChannelState>,
    sequence: u64,
    updated_at: Option<DateTime<Utc>>,
}

impl ChannelSnapshot {
    fn empty(registry: &ChannelRegistry) -> Self {
        let slots = registry
            .descriptors()
            .iter()
            .map(|d| (d.key, ChannelState::default()))
            .collect();
        Self {
            slots,
            sequence: 0,
            updated_at: None,
        }
    }

    /// State of a channel; every registry key has a slot
    pub fn get(&self, key: &str) -> Option<&ChannelState> {
        self.slots.get(key)
    }

    /// Latest value of a channel
    pub fn value(&self, key: &str) -> Option<&ChannelValue> {
        self.slots.get(key).and_then(|s| s.value.as_ref())
    }

    /// Number of batches applied so far
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Arrival time of the most recent non-empty batch
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Keys written by the most recent batch
    pub fn last_batch_keys(&self) -> Vec<&'static str> {
        if self.sequence == 0 {
            return Vec::new();
        }
        self.slots
            .iter()
            .filter(|(_, s)| s.sequence == self.sequence)
            .map(|(k, _)| *k)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Process-scoped channel state
///
/// Cloning a store shares the same channels. Only the connection task writes;
/// everyone else reads snapshots or subscribes to changes.
#[derive(Debug, Clone)]
pub struct ChannelStore {
    tx: Arc<watch::Sender<Arc<ChannelSnapshot>>>,
}

impl ChannelStore {
    /// Create an empty slot for every registry key
    pub fn new(registry: &ChannelRegistry) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(ChannelSnapshot::empty(registry)));
        Self { tx: Arc::new(tx) }
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Arc<ChannelSnapshot> {
        self.tx.borrow().clone()
    }

    /// Receiver notified after every published batch
    pub fn subscribe(&self) -> watch::Receiver<Arc<ChannelSnapshot>> {
        self.tx.subscribe()
    }

    /// Apply a batch and publish the result as one snapshot
    ///
    /// Empty batches publish nothing. Keys without a slot are ignored.
    /// Returns the sequence number of the published snapshot.
    pub fn apply(&self, batch: &ChannelBatch) -> u64 {
        let current = self.snapshot();
        if batch.is_empty() {
            return current.sequence;
        }

        let mut next = ChannelSnapshot::clone(&current);
        next.sequence += 1;
        next.updated_at = Some(batch.received_at);

        for update in &batch.updates {
            match next.slots.get_mut(update.key) {
                Some(slot) => {
                    slot.value = Some(update.value.clone());
                    slot.updated_at = Some(batch.received_at);
                    slot.sequence = next.sequence;
                }
                None => debug!("Ignoring update for unknown channel '{}'", update.key),
            }
        }

        let sequence = next.sequence;
        self.tx.send_replace(Arc::new(next));
        sequence
    }
}
