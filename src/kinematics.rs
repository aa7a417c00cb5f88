//! History-dependent kinematics
//!
//! Everything here is computed against exactly one predecessor sample and
//! the ground/exit references known at processing time. Nothing is
//! recomputed later, even when calibration finishes.
//!
//! Non-finite results are expected and kept as-is:
//!   - Δt = 0 gives infinite accelerations
//!   - level flight (no altitude change) gives an infinite or NaN glide ratio

use chrono::{DateTime, Utc};

use crate::types::{ground_plane, NedVec, Sample, EARTH_RADIUS_M};

/// Fill the derived fields of `current` relative to `previous`.
///
/// `ground_altitude` is `None` until takeoff calibration completes; the
/// sample's own altitude stands in, so height stays 0 on the ground.
/// `exit_time` is `None` until exit is detected; flight time stays 0.
pub fn compute_relative(
    current: &mut Sample,
    previous: &Sample,
    ground_altitude: Option<f64>,
    exit_time: Option<DateTime<Utc>>,
) {
    let reference = ground_altitude.unwrap_or(current.fix.altitude);
    current.height = current.fix.altitude - reference;

    let dt = seconds_between(previous.fix.time, current.fix.time);
    current.acceleration_north = (current.fix.velocity_north - previous.fix.velocity_north) / dt;
    current.acceleration_east = (current.fix.velocity_east - previous.fix.velocity_east) / dt;
    current.acceleration_down = (current.fix.velocity_down - previous.fix.velocity_down) / dt;

    let velocity = current.fix.velocity();
    let acceleration = current.acceleration();
    current.acceleration_total = signed_acceleration(&velocity, &acceleration);
    current.acceleration_ground =
        signed_acceleration(&ground_plane(&velocity), &ground_plane(&acceleration));

    current.flight_time = exit_time
        .map(|exit| seconds_between(exit, current.fix.time))
        .unwrap_or(0.0);

    current.horizontal_distance = haversine_distance(
        previous.fix.latitude,
        previous.fix.longitude,
        current.fix.latitude,
        current.fix.longitude,
    );
    current.glide_ratio = glide_ratio(
        current.horizontal_distance,
        previous.fix.altitude,
        current.fix.altitude,
    );
}

/// Acceleration magnitude, negative when it opposes the direction of travel
pub fn signed_acceleration(velocity: &NedVec, acceleration: &NedVec) -> f64 {
    let magnitude = acceleration.norm();
    if velocity.dot(acceleration) < 0.0 {
        -magnitude
    } else {
        magnitude
    }
}

/// Great-circle distance in meters between two lat/lon points (degrees)
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).max(0.0).sqrt());
    EARTH_RADIUS_M * c
}

/// Horizontal distance per meter of altitude lost. Negative while climbing.
pub fn glide_ratio(horizontal_distance: f64, previous_altitude: f64, altitude: f64) -> f64 {
    horizontal_distance / (previous_altitude - altitude)
}

/// Signed seconds from `from` to `to`
pub fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let delta = to - from;
    match delta.num_microseconds() {
        Some(us) => us as f64 / 1e6,
        None => delta.num_milliseconds() as f64 / 1e3,
    }
}
