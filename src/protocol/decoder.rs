//! # NOVA Frame Decoder
//!
//! Decodes one inbound WebSocket frame into a typed [`Message`].

use super::message::*;
use crate::error::{NovaError, Result};
use serde_json::Value;

/// Decode a complete text frame
///
/// # Arguments
///
/// * `frame` - Frame payload as received from the device
///
/// # Returns
///
/// * `Result<Message>` - Decoded message, or error if unusable
///
/// # Errors
///
/// Returns error if:
/// - Frame is not valid JSON
/// - JSON is not an object
/// - `type` field is missing or not a string
///
/// # Examples
///
/// ```
/// use nova_bridge::protocol::decoder::decode_frame;
/// use nova_bridge::protocol::message::MessageType;
///
/// let message = decode_frame(r#"{"type":"status","uptime_seconds":42}"#)?;
/// assert_eq!(message.kind, MessageType::Status);
/// # Ok::<(), nova_bridge::error::NovaError>(())
/// ```
pub fn decode_frame(frame: &str) -> Result<Message> {
    let value: Value = serde_json::from_str(frame)
        .map_err(|e| NovaError::Decode(format!("Invalid JSON: {}", e)))?;

    let fields = match value {
        Value::Object(fields) => fields,
        other => {
            return Err(NovaError::Decode(format!(
                "Expected JSON object, got {}",
                json_kind(&other)
            )))
        }
    };

    let kind = match fields.get(NOVA_TYPE_FIELD) {
        Some(Value::String(tag)) => MessageType::from_tag(tag),
        Some(other) => {
            return Err(NovaError::Decode(format!(
                "Field '{}' must be a string, got {}",
                NOVA_TYPE_FIELD,
                json_kind(other)
            )))
        }
        None => {
            return Err(NovaError::Decode(format!(
                "Missing '{}' field",
                NOVA_TYPE_FIELD
            )))
        }
    };

    Ok(Message::new(kind, fields))
}

/// Decode a binary frame
///
/// The device only sends text, but a binary frame holding UTF-8 JSON is
/// accepted the same way.
///
/// # Errors
///
/// Returns error if the bytes are not UTF-8 or [`decode_frame`] fails
pub fn decode_binary_frame(frame: &[u8]) -> Result<Message> {
    let text = std::str::from_utf8(frame)
        .map_err(|e| NovaError::Decode(format!("Binary frame is not UTF-8: {}", e)))?;
    decode_frame(text)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
