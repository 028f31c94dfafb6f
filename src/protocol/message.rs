//! # NOVA Protocol Constants and Types
//!
//! Core definitions for the JSON event stream sent by the device.

use serde_json::{Map, Value};
use std::fmt;
use std::time::Duration;

/// Default WebSocket port the device listens on
pub const NOVA_DEFAULT_PORT: u16 = 2920;

/// Fixed delay between a dropped/failed connection and the next attempt
pub const NOVA_RECONNECT_INTERVAL: Duration = Duration::from_secs(10);

/// SSDP search target the device announces itself with
pub const NOVA_SSDP_SEARCH_TARGET: &str = "urn:openlaunch:service:websocket:1";

/// Field carrying the message type tag
pub const NOVA_TYPE_FIELD: &str = "type";

/// Nested group holding US customary variants of shot fields
pub const NOVA_US_CUSTOMARY_GROUP: &str = "us_customary_units";

/// Message type tag
///
/// Channels subscribe to either [`MessageType::Shot`] or
/// [`MessageType::Status`]. Any other tag is carried as
/// [`MessageType::Other`] so it can be logged and ignored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// One recorded ball strike
    Shot,
    /// Periodic heartbeat
    Status,
    /// Unrecognized tag
    Other(String),
}

impl MessageType {
    /// Parse a `type` tag
    ///
    /// # Examples
    ///
    /// ```
    /// use nova_bridge::protocol::message::MessageType;
    ///
    /// assert_eq!(MessageType::from_tag("shot"), MessageType::Shot);
    /// assert_eq!(MessageType::from_tag("calibration"), MessageType::Other("calibration".into()));
    /// ```
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "shot" => MessageType::Shot,
            "status" => MessageType::Status,
            other => MessageType::Other(other.to_string()),
        }
    }

    /// Wire representation of the tag
    pub fn as_str(&self) -> &str {
        match self {
            MessageType::Shot => "shot",
            MessageType::Status => "status",
            MessageType::Other(tag) => tag,
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded inbound event
///
/// Holds the type tag and the full JSON object, including the `type` field
/// itself and any nested groups.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Type tag
    pub kind: MessageType,

    /// Every field of the JSON object
    pub fields: Map<String, Value>,
}

impl Message {
    /// Create a new message from a tag and its fields
    pub fn new(kind: MessageType, fields: Map<String, Value>) -> Self {
        Self { kind, fields }
    }

    /// Top-level field lookup
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}
