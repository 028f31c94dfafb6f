//! # Value Normalizer
//!
//! Applies a descriptor's offset and precision to an extracted value.
//!
//! ## Rounding
//!
//! Values are rounded half to even on the exact stored binary value, the
//! same result as Python's `round(x, n)`. Exact ties such as `0.125` at two
//! places become `0.12` and `2.5` at zero places becomes `2.0`. Decimal
//! literals that are not exactly representable round by their stored value:
//! `2.675` is `2.67499...` and becomes `2.67`, `0.05` is `0.05000...0277`
//! and becomes `0.1`.
//!
//! ## Types
//!
//! - Integers stay integers; rounding an integer is the identity.
//! - Floats stay floats, even at zero places.
//! - Descriptors without offset or precision pass every value through.

use serde_json::Value;
use tracing::debug;

use crate::registry::descriptor::ChannelDescriptor;
use crate::state::ChannelValue;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Numeric {
    Int(i64),
    Float(f64),
}

/// Normalize a raw value for a channel
///
/// # Returns
///
/// * `Option<ChannelValue>` - Stored value, or `None` if the value cannot be
///   used for this channel (non-numeric input where offset/precision apply,
///   or integer overflow)
///
/// # Examples
///
/// ```
/// use nova_bridge::mapping::normalizer::normalize;
/// use nova_bridge::registry::descriptor::{ChannelDescriptor, FieldPath};
/// use nova_bridge::state::ChannelValue;
/// use serde_json::json;
///
/// let count = ChannelDescriptor::shot("count", "Count", FieldPath::Top("shot_number")).offset(1);
/// assert_eq!(normalize(&json!(41), &count), Some(ChannelValue::Integer(42)));
/// ```
pub fn normalize(raw: &Value, descriptor: &ChannelDescriptor) -> Option<ChannelValue> {
    if !descriptor.is_numeric() {
        return Some(pass_through(raw));
    }

    let number = match as_numeric(raw) {
        Some(number) => number,
        None => {
            debug!(
                "Channel '{}' expects a number, skipping value {}",
                descriptor.key, raw
            );
            return None;
        }
    };

    let offset = descriptor.value_offset;
    let shifted = match number {
        Numeric::Int(v) => match v.checked_add(offset) {
            Some(v) => Numeric::Int(v),
            None => {
                debug!(
                    "Channel '{}' offset {} overflows value {}",
                    descriptor.key, offset, v
                );
                return None;
            }
        },
        Numeric::Float(v) => Numeric::Float(v + offset as f64),
    };

    Some(match (shifted, descriptor.precision) {
        (Numeric::Int(v), _) => ChannelValue::Integer(v),
        (Numeric::Float(v), Some(places)) => ChannelValue::Float(round_half_even(v, places)),
        (Numeric::Float(v), None) => ChannelValue::Float(v),
    })
}

/// Round `value` to `places` decimals, ties to even
///
/// Works on the exact binary value: the formatter expands the float exactly
/// and rounds once. Non-finite values are returned unchanged.
///
/// ```
/// use nova_bridge::mapping::normalizer::round_half_even;
///
/// assert_eq!(round_half_even(2.675, 2), 2.67);
/// assert_eq!(round_half_even(0.125, 2), 0.12);
/// ```
pub fn round_half_even(value: f64, places: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    // An f64 has at most 1074 fractional digits
    let places = places.min(1074) as usize;
    format!("{:.*}", places, value)
        .parse()
        .unwrap_or(value)
}

fn as_numeric(raw: &Value) -> Option<Numeric> {
    match raw {
        Value::Number(n) => {
            if let Some(v) = n.as_i64() {
                Some(Numeric::Int(v))
            } else {
                n.as_f64().map(Numeric::Float)
            }
        }
        Value::String(s) => {
            let s = s.trim();
            if let Ok(v) = s.parse::<i64>() {
                Some(Numeric::Int(v))
            } else {
                s.parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .map(Numeric::Float)
            }
        }
        _ => None,
    }
}

fn pass_through(raw: &Value) -> ChannelValue {
    match raw {
        Value::Number(n) => match n.as_i64() {
            Some(v) => ChannelValue::Integer(v),
            None => ChannelValue::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => ChannelValue::Text(s.clone()),
        other => ChannelValue::Structured(other.clone()),
    }
}
