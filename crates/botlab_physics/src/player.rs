//! Player physics state and the per-substep integration phases
//!
//! The player is a capsule whose top endpoint is the body position. The
//! phases here are deliberately small free functions: the session runs them
//! in a fixed order each substep and interleaves animation updates between
//! them.

use bitflags::bitflags;
use botlab_math::{yaw_forward, yaw_right, Vec3};

use crate::collision::GroundRef;
use crate::shapes::{CapsuleShape, Segment};

/// Default upward velocity applied when jumping
pub const DEFAULT_JUMP_FORCE: f32 = 4.5;

/// Default fixed substep (240 Hz)
pub const DEFAULT_SUBSTEP: f32 = 1.0 / 240.0;

bitflags! {
    /// Held movement keys
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct MoveFlags: u8 {
        const FORWARD = 1 << 0;
        const BACKWARD = 1 << 1;
        const LEFT = 1 << 2;
        const RIGHT = 1 << 3;
        const SPRINT = 1 << 4;
        /// Any key that moves or turns the player
        const DIRECTIONAL = Self::FORWARD.bits() | Self::BACKWARD.bits() | Self::LEFT.bits() | Self::RIGHT.bits();
    }
}

/// Tunables for player physics
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerPhysicsConfig {
    /// Gravity acceleration on Y (negative = down)
    pub gravity: f32,
    /// Minimum (most negative) vertical velocity
    pub terminal_velocity: f32,
    /// Upward velocity set by a jump
    pub jump_force: f32,
    /// Grace period after leaving the ground during which jumping still works
    pub coyote_time: f32,
    /// Fall distance below the take-off height that counts as a real fall
    pub min_fall_distance: f32,
    /// Walking speed in units per second
    pub move_speed: f32,
    /// Speed multiplier while sprint is held
    pub sprint_multiplier: f32,
    /// Direct-mode turn rate in radians per second
    pub turn_speed: f32,
    /// Direct-mode per-substep yaw smoothing factor (0..1)
    pub rotation_smoothing: f32,
    /// Free-look turn rate toward the movement direction (1/s)
    pub free_look_turn_rate: f32,
    /// Tangential velocity multiplier applied on contact
    pub friction: f32,
    /// Tangential speed below which sliding stops outright
    pub slide_threshold: f32,
    /// Uniform velocity multiplier applied on contact
    pub damping: f32,
    /// Speed below which velocity is zeroed on contact
    pub min_speed: f32,
    /// Contact normal Y above which the surface counts as ground
    pub ground_normal_threshold: f32,
    /// Vertical velocity at or above which a contact cannot ground the player
    pub max_grounding_velocity: f32,
    /// Height below which the player is respawned
    pub world_floor: f32,
    /// Fixed physics substep in seconds
    pub substep: f32,
    /// Frame deltas above this skip physics entirely
    pub freeze_threshold: f32,
    /// Capsule dimensions
    pub capsule: CapsuleShape,
}

impl Default for PlayerPhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: -9.81,
            terminal_velocity: -20.0,
            jump_force: DEFAULT_JUMP_FORCE,
            coyote_time: 0.15,
            min_fall_distance: 1.8,
            move_speed: 4.0,
            sprint_multiplier: 2.0,
            turn_speed: 2.5,
            rotation_smoothing: 0.05,
            free_look_turn_rate: 12.0,
            friction: 0.999,
            slide_threshold: 0.05,
            damping: 0.999,
            min_speed: 0.01,
            ground_normal_threshold: 0.3,
            max_grounding_velocity: 2.0,
            world_floor: -25.0,
            substep: DEFAULT_SUBSTEP,
            freeze_threshold: 1.0,
            capsule: CapsuleShape::default(),
        }
    }
}

/// Mutable movement state of the player
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerState {
    /// Current velocity in units per second
    pub velocity: Vec3,
    pub on_ground: bool,
    pub is_falling: bool,
    pub is_landing: bool,
    /// Set once the post-landing transition has run
    pub landing_animation_played: bool,
    /// Body height recorded when the player last left the ground
    pub fall_start_height: f32,
    pub time_since_last_grounded: f32,
    pub coyote_time: f32,
    /// Surface that supported the player in the last grounded substep
    pub last_ground: Option<GroundRef>,
    /// Held movement keys
    pub input: MoveFlags,
}

impl PlayerState {
    pub fn new(coyote_time: f32) -> Self {
        Self {
            velocity: Vec3::ZERO,
            on_ground: false,
            is_falling: false,
            is_landing: false,
            landing_animation_played: false,
            fall_start_height: 0.0,
            time_since_last_grounded: 0.0,
            coyote_time,
            last_ground: None,
            input: MoveFlags::empty(),
        }
    }

    /// Jumping is allowed on the ground or inside the coyote window
    pub fn can_jump(&self) -> bool {
        self.on_ground || self.time_since_last_grounded <= self.coyote_time
    }

    pub fn has_directional_input(&self) -> bool {
        self.input.intersects(MoveFlags::DIRECTIONAL)
    }

    pub fn is_sprinting(&self) -> bool {
        self.input.contains(MoveFlags::SPRINT)
    }

    /// Press or release a movement key
    pub fn set_input(&mut self, flag: MoveFlags, pressed: bool) {
        self.input.set(flag, pressed);
    }

    pub fn clear_input(&mut self) {
        self.input = MoveFlags::empty();
    }

    /// Reset everything a respawn or defeat recovery resets
    ///
    /// `on_ground` is left alone: the next substep recomputes it.
    pub fn reset_for_respawn(&mut self, spawn_height: f32) {
        self.velocity = Vec3::ZERO;
        self.is_falling = false;
        self.is_landing = false;
        self.landing_animation_played = false;
        self.fall_start_height = spawn_height;
        self.time_since_last_grounded = 0.0;
        self.last_ground = None;
        self.clear_input();
    }
}

impl Default for PlayerState {
    fn default() -> Self {
        Self::new(PlayerPhysicsConfig::default().coyote_time)
    }
}

/// The player's capsule and facing
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerBody {
    /// Top endpoint of the capsule axis
    pub position: Vec3,
    /// Facing in radians about +Y (0 faces -Z)
    pub yaw: f32,
    /// Direct-mode turn target that `yaw` is smoothed toward
    pub target_yaw: f32,
    pub capsule: CapsuleShape,
}

impl PlayerBody {
    pub fn new(position: Vec3, yaw: f32, capsule: CapsuleShape) -> Self {
        Self { position, yaw, target_yaw: yaw, capsule }
    }

    /// World-space capsule axis
    pub fn segment(&self) -> Segment {
        self.capsule.segment_at(self.position)
    }

    /// Lowest point of the capsule
    pub fn feet(&self) -> Vec3 {
        self.position - Vec3::Y * (self.capsule.segment_length + self.capsule.radius)
    }

    pub fn forward(&self) -> Vec3 {
        yaw_forward(self.yaw)
    }

    pub fn right(&self) -> Vec3 {
        yaw_right(self.yaw)
    }

    /// Teleport to a pose, discarding any turn in progress
    pub fn set_pose(&mut self, position: Vec3, yaw: f32) {
        self.position = position;
        self.yaw = yaw;
        self.target_yaw = yaw;
    }
}

/// Horizontal reset and gravity
///
/// Horizontal velocity is zeroed when no movement key is held so nothing
/// drifts; vertical velocity gains gravity and is clamped at terminal speed.
pub fn apply_gravity(state: &mut PlayerState, dt: f32, config: &PlayerPhysicsConfig) {
    if !state.has_directional_input() {
        state.velocity.x = 0.0;
        state.velocity.z = 0.0;
    }
    state.velocity.y = (state.velocity.y + config.gravity * dt).max(config.terminal_velocity);
}

/// Move the body by its velocity
pub fn integrate(body: &mut PlayerBody, state: &PlayerState, dt: f32) {
    body.position += state.velocity * dt;
}

/// Coyote timer: reset on the ground, accumulate in the air
pub fn update_coyote(state: &mut PlayerState, dt: f32) {
    if state.on_ground {
        state.time_since_last_grounded = 0.0;
    } else {
        state.time_since_last_grounded += dt;
    }
}

/// Apply a jump impulse if allowed
///
/// Returns `false` (and changes nothing) outside the ground/coyote window.
/// A successful jump spends the coyote window so it cannot be reused
/// mid-air.
pub fn try_jump(body: &PlayerBody, state: &mut PlayerState, config: &PlayerPhysicsConfig) -> bool {
    if !state.can_jump() {
        return false;
    }
    state.velocity.y = config.jump_force;
    state.on_ground = false;
    state.is_falling = false;
    state.is_landing = false;
    state.fall_start_height = body.position.y;
    state.time_since_last_grounded = f32::INFINITY;
    true
}

/// Velocity response to a contact with combined normal `normal`
///
/// The into-surface part of the normal velocity is removed, tangential
/// velocity gets friction (or stops below the slide threshold), the result is
/// damped and tiny speeds are zeroed.
pub fn apply_contact_velocity(state: &mut PlayerState, normal: Vec3, config: &PlayerPhysicsConfig) {
    if normal == Vec3::ZERO {
        return;
    }
    let v = state.velocity;
    let along = v.dot(normal);
    let normal_part = if along < 0.0 { Vec3::ZERO } else { normal * along };

    let mut tangent = v - normal * along;
    if tangent.length() < config.slide_threshold {
        tangent = Vec3::ZERO;
    } else {
        tangent *= config.friction;
    }

    let mut result = (normal_part + tangent) * config.damping;
    if result.length() < config.min_speed {
        result = Vec3::ZERO;
    }
    state.velocity = result;
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 0.0001;

    fn config() -> PlayerPhysicsConfig {
        PlayerPhysicsConfig::default()
    }

    #[test]
    fn test_new_state() {
        let state = PlayerState::new(0.2);
        assert_eq!(state.velocity, Vec3::ZERO);
        assert!(!state.on_ground);
        assert!(!state.is_falling && !state.is_landing);
        assert_eq!(state.coyote_time, 0.2);
        assert!(state.input.is_empty());
    }

    #[test]
    fn test_move_flags() {
        let mut state = PlayerState::default();
        state.set_input(MoveFlags::SPRINT, true);
        assert!(!state.has_directional_input());
        assert!(state.is_sprinting());

        state.set_input(MoveFlags::LEFT, true);
        assert!(state.has_directional_input());

        state.set_input(MoveFlags::LEFT, false);
        assert!(!state.has_directional_input());
    }

    #[test]
    fn test_gravity_and_terminal_velocity() {
        let mut state = PlayerState::default();
        apply_gravity(&mut state, 0.1, &config());
        assert!((state.velocity.y - (-0.981)).abs() < EPSILON);

        state.velocity.y = -19.99;
        apply_gravity(&mut state, 1.0, &config());
        assert_eq!(state.velocity.y, -20.0);
    }

    #[test]
    fn test_horizontal_velocity_zeroed_without_input() {
        let mut state = PlayerState::default();
        state.velocity = Vec3::new(3.0, 0.0, -2.0);
        apply_gravity(&mut state, 0.01, &config());
        assert_eq!(state.velocity.x, 0.0);
        assert_eq!(state.velocity.z, 0.0);

        state.velocity = Vec3::new(3.0, 0.0, -2.0);
        state.set_input(MoveFlags::FORWARD, true);
        apply_gravity(&mut state, 0.01, &config());
        assert_eq!(state.velocity.x, 3.0);
    }

    #[test]
    fn test_integrate() {
        let mut body = PlayerBody::new(Vec3::ZERO, 0.0, CapsuleShape::default());
        let mut state = PlayerState::default();
        state.velocity = Vec3::new(1.0, 2.0, 3.0);
        integrate(&mut body, &state, 0.5);
        assert_eq!(body.position, Vec3::new(0.5, 1.0, 1.5));
    }

    #[test]
    fn test_coyote_timer() {
        let mut state = PlayerState::default();
        state.on_ground = true;
        state.time_since_last_grounded = 0.4;
        update_coyote(&mut state, 0.01);
        assert_eq!(state.time_since_last_grounded, 0.0);

        state.on_ground = false;
        update_coyote(&mut state, 0.01);
        update_coyote(&mut state, 0.01);
        assert!((state.time_since_last_grounded - 0.02).abs() < EPSILON);
    }

    #[test]
    fn test_jump_when_grounded() {
        let body = PlayerBody::new(Vec3::new(0.0, 1.3, 0.0), 0.0, CapsuleShape::default());
        let mut state = PlayerState::default();
        state.on_ground = true;

        assert!(try_jump(&body, &mut state, &config()));
        assert_eq!(state.velocity.y, DEFAULT_JUMP_FORCE);
        assert!(!state.on_ground);
        assert_eq!(state.fall_start_height, 1.3);
        // No second jump from the same take-off
        assert!(!try_jump(&body, &mut state, &config()));
    }

    #[test]
    fn test_jump_coyote_boundary() {
        let body = PlayerBody::new(Vec3::ZERO, 0.0, CapsuleShape::default());
        let mut state = PlayerState::new(0.15);
        state.on_ground = false;

        state.time_since_last_grounded = 0.15;
        assert!(try_jump(&body, &mut state, &config()));

        let mut late = PlayerState::new(0.15);
        late.time_since_last_grounded = 0.15 + 1e-4;
        late.velocity.y = -1.0;
        assert!(!try_jump(&body, &mut late, &config()));
        assert_eq!(late.velocity.y, -1.0);
    }

    #[test]
    fn test_contact_velocity_removes_into_surface() {
        let mut state = PlayerState::default();
        state.velocity = Vec3::new(0.0, -3.0, 0.0);
        apply_contact_velocity(&mut state, Vec3::Y, &config());
        assert_eq!(state.velocity, Vec3::ZERO);
    }

    #[test]
    fn test_contact_velocity_keeps_separating_motion() {
        let mut state = PlayerState::default();
        state.velocity = Vec3::new(0.0, 4.0, 0.0);
        apply_contact_velocity(&mut state, Vec3::Y, &config());
        assert!((state.velocity.y - 4.0 * 0.999).abs() < EPSILON);
    }

    #[test]
    fn test_contact_velocity_friction_and_slide_stop() {
        let mut state = PlayerState::default();
        state.velocity = Vec3::new(2.0, 0.0, 0.0);
        apply_contact_velocity(&mut state, Vec3::Y, &config());
        assert!((state.velocity.x - 2.0 * 0.999 * 0.999).abs() < EPSILON);

        state.velocity = Vec3::new(0.02, 0.0, 0.0);
        apply_contact_velocity(&mut state, Vec3::Y, &config());
        assert_eq!(state.velocity, Vec3::ZERO);
    }

    #[test]
    fn test_reset_for_respawn_keeps_on_ground() {
        let mut state = PlayerState::default();
        state.on_ground = true;
        state.velocity = Vec3::new(1.0, -5.0, 0.0);
        state.is_falling = true;
        state.input = MoveFlags::FORWARD | MoveFlags::SPRINT;

        state.reset_for_respawn(5.0);
        assert_eq!(state.velocity, Vec3::ZERO);
        assert!(state.on_ground);
        assert!(!state.is_falling);
        assert!(state.input.is_empty());
        assert_eq!(state.fall_start_height, 5.0);
    }

    #[test]
    fn test_body_geometry() {
        let body = PlayerBody::new(Vec3::new(0.0, 1.3, 0.0), 0.0, CapsuleShape::new(0.3, 1.0));
        assert!((body.feet().y).abs() < EPSILON);
        assert_eq!(body.segment().end, Vec3::new(0.0, 0.3, 0.0));
        assert!((body.forward() - Vec3::new(0.0, 0.0, -1.0)).length() < EPSILON);
    }
}
