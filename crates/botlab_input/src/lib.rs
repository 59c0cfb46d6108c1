//! Input handling for Botlab
//!
//! This crate maps raw winit keyboard events to player actions and provides
//! the follow camera rig with free look and pointer lock.

mod bindings;
mod camera_rig;

pub use bindings::{parse_key_code, BindingError, InputAction, KeyBindings};
pub use camera_rig::{
    CameraControl, CameraMode, CameraPose, CameraRig, CameraRigConfig, FollowCamera, PointerLockError,
    PointerLockHost, PointerLockState,
};
