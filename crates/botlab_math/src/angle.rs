//! Yaw helpers
//!
//! Yaw is measured in radians about +Y. Yaw 0 faces -Z, matching the
//! camera convention, so the camera and the character share one basis.

use std::f32::consts::{PI, TAU};
use crate::Vec3;

/// Wrap an angle into `(-PI, PI]`
pub fn wrap_angle(angle: f32) -> f32 {
    let mut a = (angle + PI).rem_euclid(TAU) - PI;
    if a <= -PI {
        a += TAU;
    }
    a
}

/// Interpolate from `from` toward `to` along the shortest arc
pub fn lerp_angle(from: f32, to: f32, t: f32) -> f32 {
    from + wrap_angle(to - from) * t
}

/// Horizontal unit forward vector for a yaw
pub fn yaw_forward(yaw: f32) -> Vec3 {
    Vec3::new(-yaw.sin(), 0.0, -yaw.cos())
}

/// Horizontal unit right vector for a yaw
pub fn yaw_right(yaw: f32) -> Vec3 {
    Vec3::new(yaw.cos(), 0.0, -yaw.sin())
}

/// Yaw whose forward vector points along the horizontal part of `direction`
pub fn yaw_from_direction(direction: Vec3) -> f32 {
    (-direction.x).atan2(-direction.z)
}
