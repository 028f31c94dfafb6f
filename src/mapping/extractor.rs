//! # Field Extractor
//!
//! Resolves a [`FieldPath`] against a message.

use serde_json::Value;

use crate::protocol::message::Message;
use crate::registry::descriptor::FieldPath;

/// Look up the value a field path points at
///
/// Absent fields, a nested group that is missing or not an object, and
/// JSON `null` all resolve to `None`: the channel simply gets no update
/// from this message.
///
/// # Examples
///
/// ```
/// use nova_bridge::mapping::extractor::extract;
/// use nova_bridge::protocol::decoder::decode_frame;
/// use nova_bridge::registry::descriptor::FieldPath;
///
/// let message = decode_frame(r#"{"type":"shot","a":{"b":3}}"#)?;
/// assert_eq!(extract(&message, &FieldPath::Nested("a", "b")), Some(&serde_json::json!(3)));
/// assert_eq!(extract(&message, &FieldPath::Nested("a", "c")), None);
/// # Ok::<(), nova_bridge::error::NovaError>(())
/// ```
pub fn extract<'m>(message: &'m Message, path: &FieldPath) -> Option<&'m Value> {
    let value = match *path {
        FieldPath::Top(field) => message.field(field)?,
        FieldPath::Nested(group, field) => message.field(group)?.as_object()?.get(field)?,
    };

    if value.is_null() {
        None
    } else {
        Some(value)
    }
}
