//! Character physics for Botlab
//!
//! This crate provides the player's collision and movement model:
//! - Triangle and capsule geometry with a BVH for mesh queries
//! - Capsule vs mesh penetration resolution
//! - A named registry of secondary colliders (platforms, props)
//! - Player state, gravity, jumping with coyote time and fall detection
//! - Free-look and direct movement modes

pub mod bvh;
pub mod collision;
pub mod falling;
pub mod movement;
pub mod player;
pub mod registry;
pub mod shapes;
pub mod world;

// Re-export commonly used types
pub use bvh::{CollisionMesh, TriangleBvh};
pub use collision::{aggregate_hits, clamp_correction, resolve_capsule, AggregateContact, CapsuleHit, GroundRef, CORRECTION_EPSILON};
pub use falling::{detect_fall, FallTransition};
pub use movement::{apply_movement, MovementMode};
pub use player::{MoveFlags, PlayerBody, PlayerPhysicsConfig, PlayerState, DEFAULT_JUMP_FORCE, DEFAULT_SUBSTEP};
pub use registry::{ColliderEntry, ColliderKey, ColliderRegistry, RegistryError, SceneObjectId};
pub use shapes::{Aabb, CapsuleShape, Segment, Triangle};
pub use world::{CollisionWorld, ContactReport};
