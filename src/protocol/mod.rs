//! # NOVA Protocol Module
//!
//! Wire-level definitions for the NOVA launch monitor message stream.
//!
//! This module handles:
//! - Endpoint constants (default port, reconnect interval, SSDP service type)
//! - Typed message envelopes (`shot`, `status`, anything else)
//! - Decoding a single text frame into a [`message::Message`]

pub mod message;
pub mod decoder;
