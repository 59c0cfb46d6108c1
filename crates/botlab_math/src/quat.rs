//! Unit quaternion for representing rotations in 3D space
//!
//! Colliders can carry an arbitrary orientation; the player itself only
//! ever rotates about Y (see [`crate::angle`]).

use serde::{Serialize, Deserialize};
use crate::Vec3;

/// Unit quaternion `w + xi + yj + zk`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quat {
    /// Identity rotation
    pub const IDENTITY: Self = Self { x: 0.0, y: 0.0, z: 0.0, w: 1.0 };

    /// Create a rotation of `angle` radians about `axis`
    ///
    /// The axis is normalized; a zero axis yields the identity.
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let axis = axis.normalized();
        if axis == Vec3::ZERO {
            return Self::IDENTITY;
        }
        let (s, c) = (angle * 0.5).sin_cos();
        Self { x: axis.x * s, y: axis.y * s, z: axis.z * s, w: c }
    }

    /// Rotation about the world Y axis
    pub fn from_yaw(yaw: f32) -> Self {
        Self::from_axis_angle(Vec3::Y, yaw)
    }

    /// Hamilton product: applying `self * other` rotates by `other` first
    pub fn mul(self, other: Self) -> Self {
        Self {
            w: self.w * other.w - self.x * other.x - self.y * other.y - self.z * other.z,
            x: self.w * other.x + self.x * other.w + self.y * other.z - self.z * other.y,
            y: self.w * other.y - self.x * other.z + self.y * other.w + self.z * other.x,
            z: self.w * other.z + self.x * other.y - self.y * other.x + self.z * other.w,
        }
    }

    /// Inverse of a unit quaternion
    pub fn conjugate(self) -> Self {
        Self { x: -self.x, y: -self.y, z: -self.z, w: self.w }
    }

    /// Renormalize to unit length
    pub fn normalized(self) -> Self {
        let len = (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt();
        if len > 0.0 {
            Self { x: self.x / len, y: self.y / len, z: self.z / len, w: self.w / len }
        } else {
            Self::IDENTITY
        }
    }

    /// Rotate a vector
    pub fn rotate(self, v: Vec3) -> Vec3 {
        // v' = v + 2w(q x v) + 2 q x (q x v)
        let q = Vec3::new(self.x, self.y, self.z);
        let t = q.cross(v) * 2.0;
        v + t * self.w + q.cross(t)
    }
}
