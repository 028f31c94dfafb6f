//! # NOVA Channel Table
//!
//! Every channel the bridge tracks, in registry order: device shot channels,
//! status channels, then the OpenGolfCoach channels that arrive as extra
//! fields on shot messages.

use super::descriptor::{
    ChannelDescriptor as D, ChannelSource, DeviceClass, FieldPath, StateClass, Unit,
};
use crate::protocol::message::NOVA_US_CUSTOMARY_GROUP as US;

/// Key of the synthetic "last shot" timestamp channel
pub const LAST_SHOT_TIME: &str = "last_shot_time";

/// Channels fed directly by the launch monitor's shot messages
pub static SHOT_CHANNELS: &[D] = &[
    // shot_number is 0-indexed on the wire
    D::shot("session_shot_count", "Session Shot Count", FieldPath::Top("shot_number"))
        .offset(1)
        .state_class(StateClass::TotalIncreasing)
        .icon("mdi:counter"),
    D::synthetic(LAST_SHOT_TIME, "Last Shot", ChannelSource::Shot)
        .device_class(DeviceClass::Timestamp)
        .icon("mdi:clock-outline"),
    D::shot("ball_speed", "Ball Speed", FieldPath::Top("ball_speed_meters_per_second"))
        .speed(Unit::MetersPerSecond)
        .precision(1),
    D::shot(
        "vertical_launch_angle",
        "Vertical Launch Angle",
        FieldPath::Top("vertical_launch_angle_degrees"),
    )
    .measurement(Some(Unit::Degrees))
    .precision(1)
    .icon("mdi:angle-acute"),
    D::shot(
        "horizontal_launch_angle",
        "Horizontal Launch Angle",
        FieldPath::Top("horizontal_launch_angle_degrees"),
    )
    .measurement(Some(Unit::Degrees))
    .precision(1)
    .icon("mdi:angle-acute"),
    D::shot("total_spin", "Total Spin", FieldPath::Top("total_spin_rpm"))
        .measurement(Some(Unit::RevolutionsPerMinute))
        .precision(0)
        .icon("mdi:rotate-right"),
    D::shot("spin_axis", "Spin Axis", FieldPath::Top("spin_axis_degrees"))
        .measurement(Some(Unit::Degrees))
        .precision(0)
        .icon("mdi:axis-arrow"),
];

/// Heartbeat channels
pub static STATUS_CHANNELS: &[D] = &[
    D::status("uptime", "Uptime", FieldPath::Top("uptime_seconds"))
        .unit(Unit::Seconds)
        .device_class(DeviceClass::Duration)
        .state_class(StateClass::TotalIncreasing)
        .precision(0)
        .icon("mdi:timer-outline"),
];

/// Derived golf metrics computed upstream by OpenGolfCoach
pub static OPEN_GOLF_COACH_CHANNELS: &[D] = &[
    D::shot(
        "ogc_carry_distance_meters",
        "OGC Carry Distance",
        FieldPath::Top("carry_distance_meters"),
    )
    .distance(Unit::Meters)
    .precision(1),
    D::shot(
        "ogc_total_distance_meters",
        "OGC Total Distance",
        FieldPath::Top("total_distance_meters"),
    )
    .distance(Unit::Meters)
    .precision(1),
    D::shot(
        "ogc_offline_distance_meters",
        "OGC Offline Distance",
        FieldPath::Top("offline_distance_meters"),
    )
    .distance(Unit::Meters)
    .precision(1),
    D::shot("ogc_peak_height_meters", "OGC Peak Height", FieldPath::Top("peak_height_meters"))
        .distance(Unit::Meters)
        .precision(1),
    D::shot("ogc_descent_angle", "OGC Descent Angle", FieldPath::Top("descent_angle_degrees"))
        .measurement(Some(Unit::Degrees))
        .precision(1)
        .icon("mdi:angle-acute"),
    D::shot("ogc_hang_time", "OGC Hang Time", FieldPath::Top("hang_time_seconds"))
        .measurement(Some(Unit::Seconds))
        .device_class(DeviceClass::Duration)
        .precision(1),
    D::shot("ogc_club_speed", "OGC Club Speed", FieldPath::Top("club_speed_meters_per_second"))
        .speed(Unit::MetersPerSecond)
        .precision(1),
    D::shot("ogc_smash_factor", "OGC Smash Factor", FieldPath::Top("smash_factor"))
        .measurement(None)
        .precision(2)
        .icon("mdi:golf-tee"),
    D::shot("ogc_backspin", "OGC Backspin", FieldPath::Top("backspin_rpm"))
        .measurement(Some(Unit::RevolutionsPerMinute))
        .precision(0)
        .icon("mdi:rotate-right"),
    D::shot("ogc_sidespin", "OGC Sidespin", FieldPath::Top("sidespin_rpm"))
        .measurement(Some(Unit::RevolutionsPerMinute))
        .precision(0)
        .icon("mdi:rotate-3d-variant"),
    D::shot("ogc_total_spin", "OGC Total Spin", FieldPath::Top("total_spin_rpm"))
        .measurement(Some(Unit::RevolutionsPerMinute))
        .precision(0)
        .icon("mdi:rotate-right"),
    D::shot("ogc_spin_axis", "OGC Spin Axis", FieldPath::Top("spin_axis_degrees"))
        .measurement(Some(Unit::Degrees))
        .precision(0)
        .icon("mdi:axis-arrow"),
    D::shot("ogc_club_path", "OGC Club Path", FieldPath::Top("club_path_degrees"))
        .measurement(Some(Unit::Degrees))
        .precision(1)
        .icon("mdi:golf-course"),
    D::shot(
        "ogc_club_face_to_target",
        "OGC Club Face to Target",
        FieldPath::Top("club_face_to_target_degrees"),
    )
    .measurement(Some(Unit::Degrees))
    .precision(1)
    .icon("mdi:golf"),
    D::shot(
        "ogc_club_face_to_path",
        "OGC Club Face to Path",
        FieldPath::Top("club_face_to_path_degrees"),
    )
    .measurement(Some(Unit::Degrees))
    .precision(1)
    .icon("mdi:golf-cart"),
    D::shot("ogc_shot_name", "OGC Shot Name", FieldPath::Top("shot_name"))
        .icon("mdi:golf-ball"),
    D::shot("ogc_shot_rank", "OGC Shot Rank", FieldPath::Top("shot_rank"))
        .icon("mdi:medal"),
    D::shot("ogc_shot_color_rgb", "OGC Shot Color RGB", FieldPath::Top("shot_color_rgb"))
        .icon("mdi:palette"),
    // US customary units
    D::shot("ogc_ball_speed_mph", "OGC Ball Speed (MPH)", FieldPath::Nested(US, "ball_speed_mph"))
        .speed(Unit::MilesPerHour)
        .precision(1),
    D::shot("ogc_club_speed_mph", "OGC Club Speed (MPH)", FieldPath::Nested(US, "club_speed_mph"))
        .speed(Unit::MilesPerHour)
        .precision(1),
    D::shot(
        "ogc_carry_distance_yards",
        "OGC Carry Distance (Yards)",
        FieldPath::Nested(US, "carry_distance_yards"),
    )
    .distance(Unit::Yards)
    .precision(1),
    D::shot(
        "ogc_total_distance_yards",
        "OGC Total Distance (Yards)",
        FieldPath::Nested(US, "total_distance_yards"),
    )
    .distance(Unit::Yards)
    .precision(1),
    D::shot(
        "ogc_offline_distance_yards",
        "OGC Offline Distance (Yards)",
        FieldPath::Nested(US, "offline_distance_yards"),
    )
    .distance(Unit::Yards)
    .precision(1),
    D::shot(
        "ogc_peak_height_yards",
        "OGC Peak Height (Yards)",
        FieldPath::Nested(US, "peak_height_yards"),
    )
    .distance(Unit::Yards)
    .precision(1),
];

/// Full table in registry order
pub fn all_channels() -> impl Iterator<Item = &'static D> {
    SHOT_CHANNELS
        .iter()
        .chain(STATUS_CHANNELS.iter())
        .chain(OPEN_GOLF_COACH_CHANNELS.iter())
}
