//! Collision world: the primary scene mesh plus registered colliders

use botlab_math::Vec3;

use crate::bvh::CollisionMesh;
use crate::collision::{aggregate_hits, clamp_correction, resolve_capsule, AggregateContact, CapsuleHit, GroundRef};
use crate::player::{apply_contact_velocity, PlayerBody, PlayerPhysicsConfig, PlayerState};
use crate::registry::ColliderRegistry;

/// Result of one contact-resolution pass
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContactReport {
    /// Combined contact, if anything penetrated
    pub contact: Option<AggregateContact>,
    /// Position correction actually applied
    pub correction: Vec3,
    /// Ground state before this pass
    pub was_on_ground: bool,
}

impl ContactReport {
    /// The player stepped or was pushed off the ground this pass
    pub fn left_ground(&self, state: &PlayerState) -> bool {
        self.was_on_ground && !state.on_ground
    }
}

/// Every mesh the player can collide with
#[derive(Default)]
pub struct CollisionWorld {
    primary: Option<CollisionMesh>,
    /// Secondary colliders (platforms, props)
    pub registry: ColliderRegistry,
}

impl CollisionWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a world around a primary mesh
    pub fn with_primary(mesh: CollisionMesh) -> Self {
        Self {
            primary: Some(mesh),
            registry: ColliderRegistry::new(),
        }
    }

    pub fn set_primary(&mut self, mesh: Option<CollisionMesh>) {
        self.primary = mesh;
    }

    pub fn primary(&self) -> Option<&CollisionMesh> {
        self.primary.as_ref()
    }

    /// Resolve the capsule against every enabled mesh independently
    ///
    /// Each mesh sees the same uncorrected capsule.
    pub fn collide(&self, body: &PlayerBody) -> Vec<(GroundRef, CapsuleHit)> {
        let segment = body.segment();
        let radius = body.capsule.radius;
        let mut hits = Vec::new();

        if let Some(hit) = self.primary.as_ref().and_then(|m| resolve_capsule(&segment, radius, m)) {
            hits.push((GroundRef::Primary, hit));
        }
        for (key, entry) in self.registry.enabled() {
            if let Some(hit) = resolve_capsule(&segment, radius, &entry.mesh) {
                hits.push((GroundRef::Collider(key), hit));
            }
        }
        hits
    }

    /// Push the body out of geometry and update ground state and velocity
    ///
    /// Grounding uses the most ground-aligned contact normal and the vertical
    /// velocity at the moment of contact. When the player leaves the ground,
    /// the current height becomes the fall start height.
    pub fn resolve_contacts(
        &self,
        body: &mut PlayerBody,
        state: &mut PlayerState,
        config: &PlayerPhysicsConfig,
    ) -> ContactReport {
        let was_on_ground = state.on_ground;
        let hits = self.collide(body);
        let contact = aggregate_hits(&hits);
        let mut correction = Vec3::ZERO;

        match contact {
            Some(contact) => {
                if let Some(delta) = clamp_correction(contact.delta) {
                    body.position += delta;
                    correction = delta;
                }

                state.on_ground = contact.strongest_normal.y > config.ground_normal_threshold
                    && state.velocity.y < config.max_grounding_velocity;

                apply_contact_velocity(state, contact.normal, config);
                if state.on_ground && state.velocity.y < 0.0 {
                    state.velocity.y = 0.0;
                }
                state.last_ground = state.on_ground.then_some(contact.strongest);
            }
            None => {
                state.on_ground = false;
                state.last_ground = None;
            }
        }

        if was_on_ground && !state.on_ground {
            state.fall_start_height = body.position.y;
        }

        ContactReport { contact, correction, was_on_ground }
    }

    /// Carry the body along with the collider it is standing on
    ///
    /// Returns the displacement applied.
    pub fn carry(&self, body: &mut PlayerBody, state: &PlayerState, dt: f32) -> Vec3 {
        let Some(GroundRef::Collider(key)) = state.last_ground else {
            return Vec3::ZERO;
        };
        match self.registry.get(key) {
            Some(entry) if entry.enabled => {
                let displacement = entry.velocity * dt;
                body.position += displacement;
                displacement
            }
            _ => Vec3::ZERO,
        }
    }
}
