//! # Channel State Module
//!
//! Latest value per channel, published one batch at a time.
//!
//! This module handles:
//! - Typed channel values (integer, float, text, timestamp, structured JSON)
//! - Batches of updates produced from a single message
//! - Copy-on-write snapshots shared with any number of readers

pub mod store;

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::fmt;

pub use store::{ChannelSnapshot, ChannelState, ChannelStore};

/// Value stored in a channel
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelValue {
    Integer(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    /// Arrays, objects and booleans kept as received (e.g. an RGB triple)
    Structured(Value),
}

impl ChannelValue {
    /// Numeric view of the value, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ChannelValue::Integer(v) => Some(*v as f64),
            ChannelValue::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for ChannelValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelValue::Integer(v) => write!(f, "{}", v),
            ChannelValue::Float(v) => write!(f, "{}", v),
            ChannelValue::Text(v) => f.write_str(v),
            ChannelValue::Timestamp(v) => write!(f, "{}", v.to_rfc3339()),
            ChannelValue::Structured(v) => write!(f, "{}", v),
        }
    }
}

/// One channel update
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelUpdate {
    pub key: &'static str,
    pub value: ChannelValue,
}

/// Every update caused by one inbound message
///
/// Applied to a [`ChannelStore`] as a unit.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelBatch {
    /// Arrival time of the message that produced the batch
    pub received_at: DateTime<Utc>,
    pub updates: Vec<ChannelUpdate>,
}

impl ChannelBatch {
    pub fn new(received_at: DateTime<Utc>) -> Self {
        Self {
            received_at,
            updates: Vec::new(),
        }
    }

    pub fn push(&mut self, key: &'static str, value: ChannelValue) {
        self.updates.push(ChannelUpdate { key, value });
    }

    /// Value produced for `key`, if any
    pub fn get(&self, key: &str) -> Option<&ChannelValue> {
        self.updates.iter().find(|u| u.key == key).map(|u| &u.value)
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_value_display() {
        assert_eq!(ChannelValue::Integer(5).to_string(), "5");
        assert_eq!(ChannelValue::Float(65.2).to_string(), "65.2");
        assert_eq!(ChannelValue::Text("Draw".into()).to_string(), "Draw");
        assert_eq!(
            ChannelValue::Structured(json!([255, 0, 0])).to_string(),
            "[255,0,0]"
        );
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(ChannelValue::Timestamp(t).to_string(), "2024-05-01T12:00:00+00:00");
    }

    #[test]
    fn test_value_as_f64() {
        assert_eq!(ChannelValue::Integer(3).as_f64(), Some(3.0));
        assert_eq!(ChannelValue::Float(1.5).as_f64(), Some(1.5));
        assert_eq!(ChannelValue::Text("1".into()).as_f64(), None);
    }

    #[test]
    fn test_batch_lookup() {
        let mut batch = ChannelBatch::new(Utc::now());
        assert!(batch.is_empty());

        batch.push("ball_speed", ChannelValue::Float(65.2));
        batch.push("session_shot_count", ChannelValue::Integer(5));

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.get("ball_speed"), Some(&ChannelValue::Float(65.2)));
        assert_eq!(batch.get("uptime"), None);
    }
}
