//! Linear algebra aliases for the kinematics layer
//!
//! Velocities and accelerations are carried in the local NED frame
//! (north, east, down) exactly as the receiver reports them.

use nalgebra::Vector3;

/// Earth radius used for great-circle distances (meters)
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

// ===== NED Frame Types =====
pub type NedVec = Vector3<f64>;

/// Build an NED vector from its three components
pub fn ned(north: f64, east: f64, down: f64) -> NedVec {
    NedVec::new(north, east, down)
}

/// Project an NED vector onto the ground plane (down component zeroed)
pub fn ground_plane(v: &NedVec) -> NedVec {
    NedVec::new(v.x, v.y, 0.0)
}
