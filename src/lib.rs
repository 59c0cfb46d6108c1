//! Botlab - third-person character controller playground
//!
//! The binary opens a window and drives a [`botlab_core::PlayerSession`]
//! through a procedurally built level. The library half holds the pieces
//! that can be tested without a window:
//!
//! - [`config`] - Layered TOML/env configuration
//! - [`scene`] - Playground level builder with moving platforms
//! - [`systems`] - Window and simulation systems

pub mod config;
pub mod scene;
pub mod systems;
