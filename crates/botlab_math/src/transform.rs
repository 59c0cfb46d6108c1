//! Rigid transform (rotation then translation)
//!
//! Collision meshes are stored in local space and placed in the world with a
//! `Transform3`. Scale is deliberately absent: capsule radii must survive the
//! trip into mesh-local space unchanged.

use serde::{Serialize, Deserialize};
use crate::{Quat, Vec3};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Transform3 {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Transform3 {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self { position, rotation: Quat::IDENTITY }
    }

    /// Local point to world point
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.rotation.rotate(local) + self.position
    }

    /// World point to local point
    pub fn inverse_transform_point(&self, world: Vec3) -> Vec3 {
        self.rotation.conjugate().rotate(world - self.position)
    }

    /// Local direction to world direction (ignores translation)
    pub fn transform_vector(&self, local: Vec3) -> Vec3 {
        self.rotation.rotate(local)
    }

    /// World direction to local direction
    pub fn inverse_transform_vector(&self, world: Vec3) -> Vec3 {
        self.rotation.conjugate().rotate(world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_round_trip() {
        let t = Transform3::new(Vec3::new(1.0, 2.0, 3.0), Quat::from_yaw(1.2));
        let p = Vec3::new(-4.0, 0.5, 9.0);
        let back = t.inverse_transform_point(t.transform_point(p));
        assert!((back - p).length() < 0.0001);
    }

    #[test]
    fn test_vector_ignores_translation() {
        let t = Transform3::from_position(Vec3::new(10.0, 10.0, 10.0));
        assert_eq!(t.transform_vector(Vec3::Y), Vec3::Y);
        assert_eq!(t.transform_point(Vec3::ZERO), Vec3::new(10.0, 10.0, 10.0));
    }
}
