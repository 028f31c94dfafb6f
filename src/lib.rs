//! # NOVA Bridge Library
//!
//! Stream shot and status telemetry from a NOVA golf launch monitor into
//! typed measurement channels.
//!
//! This library provides the channel registry, the message-to-channel mapping
//! engine, the channel store and the connection manager that keeps a live
//! link to the device.

pub mod config;
pub mod connection;
pub mod error;
pub mod mapping;
pub mod protocol;
pub mod registry;
pub mod state;
pub mod telemetry;
