//! Scene construction utilities
//!
//! This module provides a declarative API for building test levels.

mod playground;

pub use playground::{box_triangles, MovingPlatform, Playground, PlaygroundBuilder};
