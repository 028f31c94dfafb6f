//! # Derived Field Synthesizer
//!
//! Channels whose value is not a field of the message. Each synthesizer is
//! registered under the key of the channel it produces, and the dispatcher
//! runs it for every message of that channel's type.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;

use crate::protocol::message::Message;
use crate::registry::channels::LAST_SHOT_TIME;
use crate::state::{ChannelState, ChannelValue};

/// Computes a derived channel value
pub trait Synthesizer: Send + Sync {
    /// Produce the new value, or `None` to leave the channel unchanged
    ///
    /// # Arguments
    ///
    /// * `message` - The message being dispatched
    /// * `prior` - Current state of the channel
    /// * `arrived_at` - When the message was received
    fn synthesize(
        &self,
        message: &Message,
        prior: Option<&ChannelState>,
        arrived_at: DateTime<Utc>,
    ) -> Option<ChannelValue>;
}

impl<F> Synthesizer for F
where
    F: Fn(&Message, Option<&ChannelState>, DateTime<Utc>) -> Option<ChannelValue> + Send + Sync,
{
    fn synthesize(
        &self,
        message: &Message,
        prior: Option<&ChannelState>,
        arrived_at: DateTime<Utc>,
    ) -> Option<ChannelValue> {
        self(message, prior, arrived_at)
    }
}

/// Stamps the arrival time of every message it sees
///
/// Message fields are ignored, including any that look like a timestamp.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrivalTime;

impl Synthesizer for ArrivalTime {
    fn synthesize(
        &self,
        _message: &Message,
        _prior: Option<&ChannelState>,
        arrived_at: DateTime<Utc>,
    ) -> Option<ChannelValue> {
        Some(ChannelValue::Timestamp(arrived_at))
    }
}

/// Synthesizers keyed by channel key
#[derive(Default)]
pub struct SynthesizerSet {
    rules: HashMap<&'static str, Box<dyn Synthesizer>>,
}

impl fmt::Debug for SynthesizerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.rules.keys().collect();
        keys.sort();
        f.debug_struct("SynthesizerSet").field("keys", &keys).finish()
    }
}

impl SynthesizerSet {
    /// Empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in NOVA synthesizers
    pub fn nova() -> Self {
        Self::new().with(LAST_SHOT_TIME, ArrivalTime)
    }

    /// Register a synthesizer, replacing any previous one for `key`
    pub fn with<S>(mut self, key: &'static str, synthesizer: S) -> Self
    where
        S: Synthesizer + 'static,
    {
        self.rules.insert(key, Box::new(synthesizer));
        self
    }

    pub fn get(&self, key: &str) -> Option<&dyn Synthesizer> {
        self.rules.get(key).map(|s| s.as_ref())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.rules.contains_key(key)
    }
}
