//! 3D Mathematics Library
//!
//! This crate provides the small set of geometry types the botlab player core
//! works with.
//!
//! ## Core Types
//!
//! - [`Vec3`] - 3D vector with x, y, z components
//! - [`Quat`] - Unit quaternion rotation
//! - [`Transform3`] - Rigid transform (rotation + translation)
//!
//! ## Angle Helpers
//!
//! - [`wrap_angle`] / [`lerp_angle`] - Shortest-path yaw interpolation

mod vec3;
mod quat;
pub mod transform;
pub mod angle;

pub use vec3::Vec3;
pub use quat::Quat;
pub use transform::Transform3;
pub use angle::{lerp_angle, wrap_angle, yaw_forward, yaw_right, yaw_from_direction};
