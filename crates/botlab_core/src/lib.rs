//! Player core for Botlab
//!
//! This crate ties physics, input and animation together:
//!
//! - [`AnimationClip`] / [`AnimationMixer`] - Clip names and the mixer interface
//! - [`ClipMixer`] - Rig-less mixer with crossfades and finished events
//! - [`Animator`] - Animation state machine with a switch generation counter
//! - [`DeferredQueue`] - Generation-guarded delayed transitions
//! - [`SceneGraph`] - The scene operations the player needs
//! - [`PlayerSession`] - Owns everything and runs the fixed-substep frame loop

mod animation;
mod animator;
mod error;
mod scene;
mod scheduler;
mod session;

pub use animation::{AnimationClip, AnimationMixer, ClipMixer, ClipMode, DEFAULT_CROSSFADE};
pub use animator::{movement_clip, Animator};
pub use error::PredicateError;
pub use scene::{SceneGraph, SceneKey, SceneObject, SceneObjectKind, SceneObjects, SpawnPose};
pub use scheduler::{DeferredAction, DeferredQueue};
pub use session::{PlayerSession, SessionConfig, SpellPredicate};

// Re-export commonly used types for convenience
pub use botlab_input::{CameraControl, CameraMode, FollowCamera, InputAction, KeyBindings, PointerLockState};
pub use botlab_math::{Quat, Transform3, Vec3};
pub use botlab_physics::{ColliderKey, CollisionMesh, GroundRef, PlayerPhysicsConfig, PlayerState, RegistryError, SceneObjectId, Triangle};
