//! The player session
//!
//! [`PlayerSession`] owns everything the player needs: body and state, the
//! collision world, animator, deferred queue and camera rig. The host drives
//! it once per frame with [`PlayerSession::update`] and forwards input.
//!
//! Frame time is sliced into fixed substeps. Each substep runs, in order:
//! 1. Mixer advance
//! 2. (controls enabled) horizontal reset, gravity, integration
//! 3. Movement input and animation selection
//! 4. Platform carry and collision response
//! 5. Coyote timer and fall/landing detection
//! 6. Deferred transitions (always)

use std::collections::HashSet;

use botlab_math::{Quat, Transform3, Vec3};
use botlab_input::{CameraControl, CameraRig, CameraRigConfig, InputAction, PointerLockError, PointerLockHost};
use botlab_physics::falling::detect_fall;
use botlab_physics::movement::apply_movement;
use botlab_physics::player::{apply_gravity, integrate, try_jump, update_coyote};
use botlab_physics::{
    ColliderKey, CollisionMesh, CollisionWorld, FallTransition, MoveFlags, MovementMode, PlayerBody, PlayerPhysicsConfig,
    PlayerState, RegistryError, SceneObjectId, Triangle,
};

use crate::animation::{AnimationClip, AnimationMixer, DEFAULT_CROSSFADE};
use crate::animator::Animator;
use crate::error::PredicateError;
use crate::scene::{SceneGraph, SceneObjectKind, SpawnPose};
use crate::scheduler::{DeferredAction, DeferredQueue};

/// Decides whether a spell may be cast right now
pub type SpellPredicate = Box<dyn FnMut() -> Result<bool, PredicateError>>;

/// Session configuration
#[derive(Clone, Debug, PartialEq)]
pub struct SessionConfig {
    pub physics: PlayerPhysicsConfig,
    pub camera: CameraRigConfig,
    /// Crossfade between clips in seconds
    pub crossfade: f32,
    /// Used when the scene provides no spawn pose
    pub fallback_spawn: SpawnPose,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            physics: PlayerPhysicsConfig::default(),
            camera: CameraRigConfig::default(),
            crossfade: DEFAULT_CROSSFADE,
            fallback_spawn: SpawnPose::default(),
        }
    }
}

/// Player movement, collision and animation driver
pub struct PlayerSession<M: AnimationMixer, S: SceneGraph> {
    config: SessionConfig,
    body: PlayerBody,
    state: PlayerState,
    world: CollisionWorld,
    animator: Animator,
    deferred: DeferredQueue,
    rig: CameraRig,
    mixer: M,
    scene: S,
    spawn: Option<SpawnPose>,
    model_object: SceneObjectId,
    capsule_object: SceneObjectId,
    spell_predicate: Option<SpellPredicate>,
    /// Collider scene objects the session created and must clean up
    owned_sources: HashSet<SceneObjectId>,
    controls_enabled: bool,
    disposed: bool,
}

impl<M: AnimationMixer, S: SceneGraph> PlayerSession<M, S> {
    /// Create a session at the fallback spawn
    ///
    /// `primary` is the scene's main collision mesh. Without one the player
    /// only collides with registered colliders.
    pub fn new(config: SessionConfig, mixer: M, mut scene: S, primary: Option<CollisionMesh>) -> Self {
        if primary.is_none() {
            log::warn!("No primary collision mesh; player will only collide with registered colliders");
        }

        let spawn = config.fallback_spawn;
        let body = PlayerBody::new(spawn.position, spawn.yaw, config.physics.capsule);
        let mut state = PlayerState::new(config.physics.coyote_time);
        state.fall_start_height = spawn.position.y;

        let model_object = scene.add_object(SceneObjectKind::PlayerModel, "player", Self::model_transform(&body));
        let capsule_object = scene.add_object(
            SceneObjectKind::PlayerCapsule,
            "player_capsule",
            Transform3::from_position(body.position),
        );
        scene.set_visible(capsule_object, false);

        let mut world = CollisionWorld::new();
        world.set_primary(primary);

        let mut session = Self {
            animator: Animator::new(config.crossfade),
            rig: CameraRig::new(config.camera.clone()),
            config,
            body,
            state,
            world,
            deferred: DeferredQueue::new(),
            mixer,
            scene,
            spawn: None,
            model_object,
            capsule_object,
            spell_predicate: None,
            owned_sources: HashSet::new(),
            controls_enabled: true,
            disposed: false,
        };
        session.animator.switch_action(&mut session.mixer, AnimationClip::Idle);
        session.rig.sync_to_facing(session.body.yaw);
        log::info!("Player session created at {:?}", session.body.position);
        session
    }

    /// Builder: use the scene's spawn pose and move there
    pub fn with_spawn(mut self, spawn: SpawnPose) -> Self {
        self.set_spawn(Some(spawn));
        self.respawn();
        self
    }

    fn model_transform(body: &PlayerBody) -> Transform3 {
        Transform3::new(body.feet(), Quat::from_yaw(body.yaw))
    }

    // --- Accessors ---

    pub fn body(&self) -> &PlayerBody {
        &self.body
    }

    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn world(&self) -> &CollisionWorld {
        &self.world
    }

    pub fn animator(&self) -> &Animator {
        &self.animator
    }

    pub fn current_clip(&self) -> Option<AnimationClip> {
        self.animator.current()
    }

    pub fn rig(&self) -> &CameraRig {
        &self.rig
    }

    pub fn rig_mut(&mut self) -> &mut CameraRig {
        &mut self.rig
    }

    pub fn mixer(&self) -> &M {
        &self.mixer
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    /// Scene access for objects the caller owns, such as collider sources
    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn model_object(&self) -> SceneObjectId {
        self.model_object
    }

    pub fn pending_transitions(&self) -> usize {
        self.deferred.len()
    }

    pub fn controls_enabled(&self) -> bool {
        self.controls_enabled
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Pose used by [`respawn`](Self::respawn)
    pub fn spawn_pose(&self) -> SpawnPose {
        self.spawn.unwrap_or(self.config.fallback_spawn)
    }

    pub fn set_spawn(&mut self, spawn: Option<SpawnPose>) {
        self.spawn = spawn;
    }

    /// Movement mode implied by the pointer lock
    pub fn movement_mode(&self) -> MovementMode {
        if self.rig.is_locked() {
            MovementMode::FreeLook { camera_yaw: self.rig.yaw() }
        } else {
            MovementMode::Direct
        }
    }

    // --- Frame loop ---

    /// Advance the session by one frame
    ///
    /// Frames longer than the freeze threshold (a stalled tab, a debugger
    /// break) only advance the mixer.
    pub fn update<C: CameraControl + ?Sized>(&mut self, frame_dt: f32, camera: &mut C) {
        if self.disposed || !frame_dt.is_finite() || frame_dt <= 0.0 {
            return;
        }

        if frame_dt > self.config.physics.freeze_threshold {
            log::debug!("Frame of {:.3}s exceeds freeze threshold; skipping physics", frame_dt);
            self.mixer.update(frame_dt);
            self.mixer.take_finished();
            return;
        }

        let substep = self.config.physics.substep;
        let mut remaining = frame_dt;
        while remaining > 0.0 {
            let dt = remaining.min(substep);
            self.substep(dt);
            remaining -= dt;
        }

        self.rig.sync_to_facing(self.body.yaw);
        if self.rig.follow_enabled() {
            let pose = self.rig.compute_pose(self.body.position, self.body.yaw);
            self.rig.apply(&pose, self.body.position, camera);
            self.scene.set_visible(self.model_object, pose.model_visible);
        }
        self.scene.set_transform(self.model_object, Self::model_transform(&self.body));
        self.scene
            .set_transform(self.capsule_object, Transform3::from_position(self.body.position));

        if self.body.position.y < self.config.physics.world_floor {
            log::info!("Player fell below the world floor; respawning");
            self.respawn();
        }
    }

    fn substep(&mut self, dt: f32) {
        self.mixer.update(dt);
        for clip in self.mixer.take_finished() {
            log::trace!("Clip finished: {}", clip.name());
        }

        if self.controls_enabled {
            let physics = &self.config.physics;
            apply_gravity(&mut self.state, dt, physics);
            integrate(&mut self.body, &self.state, dt);

            let mode = self.movement_mode();
            apply_movement(&mut self.body, self.state.input, mode, dt, &self.config.physics);
            self.animator.update_movement(&mut self.mixer, &self.state);

            self.world.carry(&mut self.body, &self.state, dt);
            self.world
                .resolve_contacts(&mut self.body, &mut self.state, &self.config.physics);

            update_coyote(&mut self.state, dt);

            let jump_locked = self.animator.is_jump_locked(&self.mixer);
            let transition = detect_fall(
                &mut self.state,
                self.body.position.y,
                self.config.physics.min_fall_distance,
                jump_locked,
            );
            self.on_fall_transition(transition);
        }

        self.run_deferred(dt);
    }

    fn on_fall_transition(&mut self, transition: FallTransition) {
        match transition {
            FallTransition::None => {}
            FallTransition::StartedFalling => {
                if !self.animator.is_defeated() {
                    self.animator.switch_action(&mut self.mixer, AnimationClip::FallingIdle);
                }
            }
            FallTransition::Landed => {
                if !self.animator.is_defeated() {
                    self.animator
                        .switch_action(&mut self.mixer, AnimationClip::FallingToLanding);
                }
                let delay = self.mixer.duration(AnimationClip::FallingToLanding).unwrap_or(0.0);
                self.deferred
                    .schedule(delay, DeferredAction::FinishLanding, self.animator.generation());
            }
        }
    }

    fn run_deferred(&mut self, dt: f32) {
        for (action, generation) in self.deferred.advance(dt) {
            if generation != self.animator.generation() {
                log::debug!("Dropping stale {:?} (generation {})", action, generation);
                continue;
            }
            match action {
                DeferredAction::FinishLanding => {
                    if self.state.landing_animation_played || !self.state.is_landing {
                        continue;
                    }
                    self.state.is_landing = false;
                    self.state.landing_animation_played = true;
                    self.animator.settle(&mut self.mixer, &self.state);
                }
                DeferredAction::FinishAction => {
                    self.animator.settle(&mut self.mixer, &self.state);
                }
            }
        }
    }

    // --- Actions ---

    /// Jump if grounded or inside the coyote window
    pub fn jump(&mut self) -> bool {
        if self.disposed || !self.controls_enabled || self.animator.is_defeated() {
            return false;
        }
        if !try_jump(&self.body, &mut self.state, &self.config.physics) {
            return false;
        }
        self.animator.switch_action(&mut self.mixer, AnimationClip::Jump);
        true
    }

    /// Replace the spell-cast predicate
    pub fn set_spell_predicate<F>(&mut self, predicate: F)
    where
        F: FnMut() -> Result<bool, PredicateError> + 'static,
    {
        self.spell_predicate = Some(Box::new(predicate));
    }

    pub fn clear_spell_predicate(&mut self) {
        self.spell_predicate = None;
    }

    fn spell_allowed(&mut self) -> bool {
        match self.spell_predicate.as_mut() {
            None => true,
            Some(predicate) => match predicate() {
                Ok(allowed) => allowed,
                Err(e) => {
                    log::warn!("{}; denying spell cast", e);
                    false
                }
            },
        }
    }

    /// Cast a spell if the predicate allows it
    ///
    /// The predicate is consulted only once nothing else blocks the cast.
    pub fn try_spellcast(&mut self) -> bool {
        if !self.can_play_action(AnimationClip::SpellCast) {
            return false;
        }
        if !self.spell_allowed() {
            return false;
        }
        self.play_action(AnimationClip::SpellCast)
    }

    /// Play the arrow shot
    pub fn shoot_arrow(&mut self) -> bool {
        if !self.can_play_action(AnimationClip::ArrowShoot) {
            return false;
        }
        self.play_action(AnimationClip::ArrowShoot)
    }

    /// Whether a one-shot action clip may start now
    ///
    /// Refused while disposed or defeated, while the jump clip runs, while
    /// the same action is still playing, or when the mixer lacks the clip.
    fn can_play_action(&self, clip: AnimationClip) -> bool {
        if self.disposed || self.animator.is_defeated() {
            return false;
        }
        if self.animator.is_jump_locked(&self.mixer) {
            return false;
        }
        if self.animator.current() == Some(clip) && self.mixer.is_running(clip) {
            return false;
        }
        self.mixer.has_clip(clip)
    }

    fn play_action(&mut self, clip: AnimationClip) -> bool {
        // Restart a finished action clip from the top
        if self.animator.current() == Some(clip) {
            self.animator.settle(&mut self.mixer, &self.state);
        }
        if !self.animator.switch_action(&mut self.mixer, clip) {
            return false;
        }
        if self.state.is_landing {
            // The landing clip was cut short
            self.state.is_landing = false;
            self.state.landing_animation_played = true;
        }
        let delay = self.mixer.duration(clip).unwrap_or(0.0);
        self.deferred
            .schedule(delay, DeferredAction::FinishAction, self.animator.generation());
        true
    }

    /// Play the defeat clip and lock all transitions
    pub fn trigger_defeat(&mut self) {
        if self.disposed || self.animator.is_defeated() {
            return;
        }
        self.state.clear_input();
        self.animator.defeat(&mut self.mixer);
        log::info!("Player defeated");
    }

    /// Leave the defeated state where the player stands
    pub fn recover_from_defeat(&mut self) {
        if self.disposed || !self.animator.is_defeated() {
            return;
        }
        self.deferred.clear();
        self.state.reset_for_respawn(self.body.position.y);
        self.animator.recover(&mut self.mixer);
        log::info!("Player recovered");
    }

    /// Move to the spawn pose and reset movement state
    ///
    /// Also lifts a defeat.
    pub fn respawn(&mut self) {
        if self.disposed {
            return;
        }
        let spawn = self.spawn_pose();
        self.body.set_pose(spawn.position, spawn.yaw);
        self.state.reset_for_respawn(spawn.position.y);
        self.deferred.clear();
        if self.animator.is_defeated() {
            self.animator.recover(&mut self.mixer);
        } else {
            self.animator.switch_action(&mut self.mixer, AnimationClip::Idle);
        }
        self.rig.sync_to_facing(spawn.yaw);
        self.scene.set_transform(self.model_object, Self::model_transform(&self.body));
    }

    /// Enable or disable player control
    ///
    /// While disabled the body is frozen; animations and deferred
    /// transitions keep running.
    pub fn set_controls_enabled(&mut self, enabled: bool) {
        if self.disposed {
            return;
        }
        self.controls_enabled = enabled;
        if !enabled {
            self.state.clear_input();
            self.state.velocity = Vec3::ZERO;
        }
    }

    /// Tear down: drop pending work, input and every scene object the session added
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.deferred.clear();
        self.state.clear_input();
        self.spell_predicate = None;
        for entry in self.world.registry.clear() {
            if self.owned_sources.remove(&entry.source) {
                self.scene.remove_object(entry.source);
            }
        }
        self.scene.remove_object(self.model_object);
        self.scene.remove_object(self.capsule_object);
        self.disposed = true;
        log::info!("Player session disposed");
    }

    // --- Input ---

    /// Apply a mapped key event
    pub fn handle_action(&mut self, action: InputAction, pressed: bool, host: &mut dyn PointerLockHost) {
        if self.disposed {
            return;
        }
        let flag = match action {
            InputAction::MoveForward => MoveFlags::FORWARD,
            InputAction::MoveBackward => MoveFlags::BACKWARD,
            InputAction::MoveLeft => MoveFlags::LEFT,
            InputAction::MoveRight => MoveFlags::RIGHT,
            InputAction::Sprint => MoveFlags::SPRINT,
            InputAction::Jump => {
                if pressed {
                    self.jump();
                }
                return;
            }
            InputAction::ToggleCamera => {
                if pressed {
                    self.rig.toggle_mode();
                }
                return;
            }
            InputAction::ReleaseCursor => {
                if pressed {
                    self.rig.release_pointer_lock(host);
                }
                return;
            }
        };

        // Releases always go through so keys never stick
        if pressed && (!self.controls_enabled || self.animator.is_defeated()) {
            return;
        }
        self.state.set_input(flag, pressed);
    }

    /// Raw mouse motion; turns the view only while the pointer is locked
    pub fn handle_mouse_motion(&mut self, delta_x: f64, delta_y: f64) {
        if self.disposed {
            return;
        }
        self.rig.handle_mouse_motion(delta_x, delta_y);
    }

    /// Primary click: grab the pointer, or cast once it is grabbed
    pub fn handle_primary_click(&mut self, host: &mut dyn PointerLockHost) {
        if self.disposed {
            return;
        }
        if self.rig.is_locked() {
            self.try_spellcast();
        } else {
            self.rig.request_pointer_lock(host);
        }
    }

    pub fn pointer_lock_resolved(&mut self, result: Result<(), PointerLockError>) {
        if !self.disposed {
            self.rig.pointer_lock_resolved(result);
        }
    }

    pub fn pointer_lock_lost(&mut self) {
        if !self.disposed {
            self.rig.pointer_lock_lost();
        }
    }

    // --- Colliders ---

    /// Register a collider
    ///
    /// With `source` set, the entry points at that caller-owned scene object
    /// and the session never removes or moves it. Without one, the session
    /// adds a collider object and owns it.
    pub fn add_collider(
        &mut self,
        name: &str,
        source: Option<SceneObjectId>,
        triangles: Vec<Triangle>,
        transform: Transform3,
    ) -> Result<ColliderKey, RegistryError> {
        if self.disposed {
            return Err(RegistryError::Disposed);
        }
        let object = match source {
            Some(id) => id,
            None => self.scene.add_object(SceneObjectKind::Collider, name, transform),
        };
        match self.world.registry.add_collider(name, object, triangles, transform) {
            Ok(key) => {
                if source.is_none() {
                    self.owned_sources.insert(object);
                }
                Ok(key)
            }
            Err(e) => {
                if source.is_none() {
                    self.scene.remove_object(object);
                }
                Err(e)
            }
        }
    }

    /// Unregister a collider, removing its scene object if the session made it
    ///
    /// Returns `false` when nothing was removed, including after `dispose()`.
    pub fn remove_collider(&mut self, name: &str) -> bool {
        if self.disposed {
            return false;
        }
        match self.world.registry.remove_collider(name) {
            Some(entry) => {
                if self.owned_sources.remove(&entry.source) {
                    self.scene.remove_object(entry.source);
                }
                true
            }
            None => false,
        }
    }

    pub fn toggle_collider_physics(&mut self, name: &str, enabled: bool) -> Result<(), RegistryError> {
        if self.disposed {
            return Err(RegistryError::Disposed);
        }
        self.world.registry.toggle_collider_physics(name, enabled)
    }

    /// Move a collider, and its scene object if the session made it
    pub fn update_collider_position(&mut self, name: &str, position: Vec3, rotation: Quat) -> Result<(), RegistryError> {
        if self.disposed {
            return Err(RegistryError::Disposed);
        }
        self.world.registry.update_collider_position(name, position, rotation)?;
        if let Some(entry) = self.world.registry.get_by_name(name) {
            if self.owned_sources.contains(&entry.source) {
                self.scene.set_transform(entry.source, entry.mesh.transform);
            }
        }
        Ok(())
    }

    pub fn set_collider_velocity(&mut self, name: &str, velocity: Vec3) -> Result<(), RegistryError> {
        if self.disposed {
            return Err(RegistryError::Disposed);
        }
        self.world.registry.set_collider_velocity(name, velocity)
    }
}
