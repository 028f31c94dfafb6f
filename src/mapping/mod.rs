//! # Mapping Module
//!
//! Turns a decoded message into a batch of channel updates.
//!
//! This module handles:
//! - Resolving field paths (top-level and one nested group)
//! - Applying offset and precision to numeric values
//! - Synthesizing derived channels (last shot time)
//! - Dispatching a message to the channels that subscribe to its type

pub mod extractor;
pub mod normalizer;
pub mod synthesizer;
pub mod dispatcher;

pub use dispatcher::Dispatcher;
