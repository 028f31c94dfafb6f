//! # Message Dispatcher
//!
//! Routes a message to the channels subscribed to its type and collects
//! every resulting update into one [`ChannelBatch`].

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, trace};

use super::extractor::extract;
use super::normalizer::normalize;
use super::synthesizer::SynthesizerSet;
use crate::error::{NovaError, Result};
use crate::protocol::message::Message;
use crate::registry::ChannelRegistry;
use crate::state::{ChannelBatch, ChannelSnapshot};

/// Maps messages to channel batches
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use nova_bridge::mapping::Dispatcher;
/// use nova_bridge::protocol::decoder::decode_frame;
/// use nova_bridge::state::{ChannelSnapshot, ChannelValue};
///
/// let dispatcher = Dispatcher::nova()?;
/// let message = decode_frame(r#"{"type":"status","uptime_seconds":120.4}"#)?;
/// let batch = dispatcher.dispatch(&message, &ChannelSnapshot::default(), Utc::now());
///
/// assert_eq!(batch.get("uptime"), Some(&ChannelValue::Float(120.0)));
/// # Ok::<(), nova_bridge::error::NovaError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<ChannelRegistry>,
    synthesizers: Arc<SynthesizerSet>,
}

impl Dispatcher {
    /// Create a dispatcher
    ///
    /// # Errors
    ///
    /// Returns [`NovaError::Registry`] if a synthetic channel has no
    /// registered synthesizer
    pub fn new(registry: Arc<ChannelRegistry>, synthesizers: SynthesizerSet) -> Result<Self> {
        for key in registry.synthetic_keys() {
            if !synthesizers.contains(key) {
                return Err(NovaError::Registry(format!(
                    "Synthetic channel '{}' has no synthesizer",
                    key
                )));
            }
        }

        Ok(Self {
            registry,
            synthesizers: Arc::new(synthesizers),
        })
    }

    /// Dispatcher over the built-in NOVA registry and synthesizers
    ///
    /// # Errors
    ///
    /// Only fails if the built-in table is defective
    pub fn nova() -> Result<Self> {
        Self::new(Arc::new(ChannelRegistry::nova()?), SynthesizerSet::nova())
    }

    pub fn registry(&self) -> &Arc<ChannelRegistry> {
        &self.registry
    }

    /// Produce every update caused by `message`
    ///
    /// # Arguments
    ///
    /// * `message` - Decoded message
    /// * `prior` - Channel state before this message, passed to synthesizers
    /// * `arrived_at` - When the message was received
    ///
    /// # Returns
    ///
    /// * `ChannelBatch` - Updates in registry order; empty for unknown types
    pub fn dispatch(
        &self,
        message: &Message,
        prior: &ChannelSnapshot,
        arrived_at: DateTime<Utc>,
    ) -> ChannelBatch {
        let mut batch = ChannelBatch::new(arrived_at);

        for descriptor in self.registry.for_message(&message.kind) {
            let value = if descriptor.synthetic {
                self.synthesizers
                    .get(descriptor.key)
                    .and_then(|s| s.synthesize(message, prior.get(descriptor.key), arrived_at))
            } else {
                descriptor
                    .field_path
                    .as_ref()
                    .and_then(|path| extract(message, path))
                    .and_then(|raw| normalize(raw, descriptor))
            };

            match value {
                Some(value) => batch.push(descriptor.key, value),
                None => trace!("No update for '{}' from {} message", descriptor.key, message.kind),
            }
        }

        debug!(
            "Dispatched {} message: {} channel update(s)",
            message.kind,
            batch.len()
        );
        batch
    }
}
