//! # Channel Descriptors
//!
//! Immutable records describing how one channel is populated from incoming
//! messages, plus the display metadata a host platform needs to present it.

use std::fmt;

/// Which message type feeds a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelSource {
    /// Populated from `shot` messages
    Shot,
    /// Populated from `status` messages
    Status,
}

impl ChannelSource {
    /// Wire tag of the message type
    pub const fn as_str(self) -> &'static str {
        match self {
            ChannelSource::Shot => "shot",
            ChannelSource::Status => "status",
        }
    }
}

/// Location of a value inside a message
///
/// Dotted paths are split once, when the table is written, so dispatch never
/// parses strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldPath {
    /// Top-level field
    Top(&'static str),
    /// `group.field` inside a nested object
    Nested(&'static str, &'static str),
}

impl FieldPath {
    /// Path segments, outermost first
    pub fn segments(&self) -> Vec<&'static str> {
        match *self {
            FieldPath::Top(field) => vec![field],
            FieldPath::Nested(group, field) => vec![group, field],
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldPath::Top(field) => write!(f, "{}", field),
            FieldPath::Nested(group, field) => write!(f, "{}.{}", group, field),
        }
    }
}

/// Unit of measurement attached to a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    MetersPerSecond,
    MilesPerHour,
    Degrees,
    RevolutionsPerMinute,
    Seconds,
    Meters,
    Yards,
}

impl Unit {
    /// Display symbol
    pub const fn symbol(self) -> &'static str {
        match self {
            Unit::MetersPerSecond => "m/s",
            Unit::MilesPerHour => "mph",
            Unit::Degrees => "°",
            Unit::RevolutionsPerMinute => "rpm",
            Unit::Seconds => "s",
            Unit::Meters => "m",
            Unit::Yards => "yd",
        }
    }
}

/// Physical quantity class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceClass {
    Speed,
    Distance,
    Duration,
    Timestamp,
}

/// How successive values relate to each other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateClass {
    /// Independent reading
    Measurement,
    /// Monotonic counter that only resets on device restart
    TotalIncreasing,
}

/// Static description of one channel
///
/// Built with `const fn` builders so the whole registry is a `static` table:
///
/// ```
/// use nova_bridge::registry::descriptor::{ChannelDescriptor, FieldPath, Unit};
///
/// const BALL_SPEED: ChannelDescriptor = ChannelDescriptor::shot(
///     "ball_speed",
///     "Ball Speed",
///     FieldPath::Top("ball_speed_meters_per_second"),
/// )
/// .precision(1)
/// .unit(Unit::MetersPerSecond);
///
/// assert_eq!(BALL_SPEED.precision, Some(1));
/// assert!(!BALL_SPEED.synthetic);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelDescriptor {
    /// Unique, stable identifier
    pub key: &'static str,

    /// Message type that populates this channel
    pub source: ChannelSource,

    /// Where to find the value; `None` for synthetic channels
    pub field_path: Option<FieldPath>,

    /// Decimal places to round numeric values to
    pub precision: Option<u32>,

    /// Added to numeric values before rounding
    pub value_offset: i64,

    /// Computed by a synthesizer instead of extracted
    pub synthetic: bool,

    /// Human-readable name
    pub name: &'static str,

    pub unit: Option<Unit>,
    pub device_class: Option<DeviceClass>,
    pub state_class: Option<StateClass>,
    pub icon: Option<&'static str>,
    pub suggested_display_precision: Option<u32>,
}

impl ChannelDescriptor {
    const fn base(
        key: &'static str,
        name: &'static str,
        source: ChannelSource,
        field_path: Option<FieldPath>,
        synthetic: bool,
    ) -> Self {
        Self {
            key,
            source,
            field_path,
            precision: None,
            value_offset: 0,
            synthetic,
            name,
            unit: None,
            device_class: None,
            state_class: None,
            icon: None,
            suggested_display_precision: None,
        }
    }

    /// Channel extracted from `shot` messages
    pub const fn shot(key: &'static str, name: &'static str, path: FieldPath) -> Self {
        Self::base(key, name, ChannelSource::Shot, Some(path), false)
    }

    /// Channel extracted from `status` messages
    pub const fn status(key: &'static str, name: &'static str, path: FieldPath) -> Self {
        Self::base(key, name, ChannelSource::Status, Some(path), false)
    }

    /// Channel computed by a synthesizer whenever a `source` message arrives
    pub const fn synthetic(key: &'static str, name: &'static str, source: ChannelSource) -> Self {
        Self::base(key, name, source, None, true)
    }

    /// Round to `places` decimals; also used as the suggested display precision
    pub const fn precision(self, places: u32) -> Self {
        Self {
            precision: Some(places),
            suggested_display_precision: Some(places),
            ..self
        }
    }

    pub const fn offset(self, value_offset: i64) -> Self {
        Self { value_offset, ..self }
    }

    pub const fn unit(self, unit: Unit) -> Self {
        Self { unit: Some(unit), ..self }
    }

    pub const fn device_class(self, device_class: DeviceClass) -> Self {
        Self {
            device_class: Some(device_class),
            ..self
        }
    }

    pub const fn state_class(self, state_class: StateClass) -> Self {
        Self {
            state_class: Some(state_class),
            ..self
        }
    }

    pub const fn icon(self, icon: &'static str) -> Self {
        Self {
            icon: Some(icon),
            ..self
        }
    }

    /// Speed reading in `unit`
    pub const fn speed(self, unit: Unit) -> Self {
        self.unit(unit)
            .device_class(DeviceClass::Speed)
            .state_class(StateClass::Measurement)
    }

    /// Distance reading in `unit`
    pub const fn distance(self, unit: Unit) -> Self {
        self.unit(unit)
            .device_class(DeviceClass::Distance)
            .state_class(StateClass::Measurement)
    }

    /// Plain measurement with an optional unit
    pub const fn measurement(self, unit: Option<Unit>) -> Self {
        Self {
            unit,
            state_class: Some(StateClass::Measurement),
            ..self
        }
    }

    /// True when offset or precision require a numeric value
    pub const fn is_numeric(&self) -> bool {
        self.precision.is_some() || self.value_offset != 0
    }
}
