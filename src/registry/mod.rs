//! # Channel Registry Module
//!
//! Ordered, read-only collection of channel descriptors.
//!
//! This module handles:
//! - Descriptor types and `const fn` builders
//! - The built-in NOVA channel table
//! - Startup validation (unique keys, synthetic/path consistency)
//! - Lookup by key and by message type

pub mod descriptor;
pub mod channels;

use std::collections::{HashMap, HashSet};

use crate::error::{NovaError, Result};
use crate::protocol::message::MessageType;
use descriptor::{ChannelDescriptor, ChannelSource, FieldPath};

/// Validated channel registry
///
/// Never mutated after construction, so it can be shared behind an `Arc`
/// with any number of readers.
///
/// # Examples
///
/// ```
/// use nova_bridge::registry::ChannelRegistry;
///
/// let registry = ChannelRegistry::nova()?;
/// let ball_speed = registry.get("ball_speed").unwrap();
/// assert_eq!(ball_speed.precision, Some(1));
/// # Ok::<(), nova_bridge::error::NovaError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ChannelRegistry {
    descriptors: Vec<ChannelDescriptor>,
    index: HashMap<&'static str, usize>,
}

impl ChannelRegistry {
    /// Build a registry from descriptors, validating every invariant
    ///
    /// # Errors
    ///
    /// Returns [`NovaError::Registry`] if:
    /// - Two descriptors share a key
    /// - A key is empty
    /// - A synthetic descriptor has a field path
    /// - A non-synthetic descriptor has no field path or an empty segment
    pub fn new<I>(descriptors: I) -> Result<Self>
    where
        I: IntoIterator<Item = ChannelDescriptor>,
    {
        let descriptors: Vec<ChannelDescriptor> = descriptors.into_iter().collect();
        let mut index = HashMap::with_capacity(descriptors.len());

        for (position, descriptor) in descriptors.iter().enumerate() {
            validate_descriptor(descriptor)?;

            if index.insert(descriptor.key, position).is_some() {
                return Err(NovaError::Registry(format!(
                    "Duplicate channel key '{}'",
                    descriptor.key
                )));
            }
        }

        Ok(Self { descriptors, index })
    }

    /// The built-in NOVA channel table
    ///
    /// # Errors
    ///
    /// Only fails if the static table itself is defective
    pub fn nova() -> Result<Self> {
        Self::new(channels::all_channels().copied())
    }

    /// All descriptors in registry order
    pub fn descriptors(&self) -> &[ChannelDescriptor] {
        &self.descriptors
    }

    /// Look up a descriptor by key
    pub fn get(&self, key: &str) -> Option<&ChannelDescriptor> {
        self.index.get(key).map(|&i| &self.descriptors[i])
    }

    /// Descriptors fed by the given message type, in registry order
    ///
    /// Unknown message types match nothing.
    pub fn for_message(&self, kind: &MessageType) -> impl Iterator<Item = &ChannelDescriptor> {
        let source = match kind {
            MessageType::Shot => Some(ChannelSource::Shot),
            MessageType::Status => Some(ChannelSource::Status),
            MessageType::Other(_) => None,
        };
        self.descriptors
            .iter()
            .filter(move |d| Some(d.source) == source)
    }

    /// Keys of every synthetic descriptor
    pub fn synthetic_keys(&self) -> HashSet<&'static str> {
        self.descriptors
            .iter()
            .filter(|d| d.synthetic)
            .map(|d| d.key)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

fn validate_descriptor(descriptor: &ChannelDescriptor) -> Result<()> {
    if descriptor.key.is_empty() {
        return Err(NovaError::Registry("Channel key cannot be empty".to_string()));
    }

    match (descriptor.synthetic, descriptor.field_path) {
        (true, Some(path)) => Err(NovaError::Registry(format!(
            "Synthetic channel '{}' must not have a field path (got '{}')",
            descriptor.key, path
        ))),
        (false, None) => Err(NovaError::Registry(format!(
            "Channel '{}' needs a field path",
            descriptor.key
        ))),
        (false, Some(path)) if path.segments().iter().any(|s| s.is_empty()) => {
            Err(NovaError::Registry(format!(
                "Channel '{}' has an empty field path segment in '{}'",
                descriptor.key, path
            )))
        }
        _ => Ok(()),
    }
}
