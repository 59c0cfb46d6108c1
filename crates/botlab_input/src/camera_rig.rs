//! Follow camera with free look and pointer lock
//!
//! The rig never owns a camera. It computes a [`CameraPose`] from the
//! player's position and facing, and the host applies it through
//! [`CameraControl`].
//!
//! Controls:
//! - Pointer locked: mouse motion turns the free-look yaw/pitch
//! - Pointer unlocked: the camera yaw mirrors the player's facing
//! - Toggle: switch between third and first person

use std::f32::consts::PI;
use std::fmt;

use botlab_math::{yaw_forward, Quat, Vec3};

/// Which view the rig produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraMode {
    #[default]
    ThirdPerson,
    FirstPerson,
}

/// Pointer-lock sub-state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerLockState {
    #[default]
    Unlocked,
    /// A request was issued and the host has not answered yet
    Pending,
    Locked,
}

/// Why a pointer-lock request failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerLockError {
    /// The host refused the request
    Rejected(String),
    /// The platform cannot lock the pointer
    Unsupported,
}

impl fmt::Display for PointerLockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointerLockError::Rejected(reason) => write!(f, "Pointer lock rejected: {}", reason),
            PointerLockError::Unsupported => write!(f, "Pointer lock is not supported"),
        }
    }
}

impl std::error::Error for PointerLockError {}

/// Something that can grab and release the OS pointer
///
/// The result of a request is delivered later through
/// [`CameraRig::pointer_lock_resolved`].
pub trait PointerLockHost {
    fn request_pointer_lock(&mut self);
    fn release_pointer_lock(&mut self);
}

/// Trait for camera control
/// Allows the rig to drive different camera implementations
pub trait CameraControl {
    fn set_position(&mut self, position: Vec3);
    fn look_at(&mut self, target: Vec3);
    /// Orbit-style controls recenter on this point
    fn set_orbit_target(&mut self, _target: Vec3) {}
}

/// Minimal camera that just stores its pose
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FollowCamera {
    pub position: Vec3,
    pub target: Vec3,
}

impl CameraControl for FollowCamera {
    fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }
}

/// Where the camera should be and what it should look at
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub look_at: Vec3,
    /// Whether the player's visual model should be drawn
    pub model_visible: bool,
}

/// Tunables for the camera rig
#[derive(Debug, Clone, PartialEq)]
pub struct CameraRigConfig {
    /// Third-person camera offset in player-local space (+Z is behind)
    pub third_person_offset: Vec3,
    /// Third-person look target offset in player-local space
    pub look_offset: Vec3,
    /// First-person eye offset from the body position
    pub head_offset: Vec3,
    /// Radians per pixel of mouse motion
    pub mouse_sensitivity: f32,
    /// Lowest pitch in radians (negative looks up)
    pub pitch_min: f32,
    /// Highest pitch in radians (positive looks down)
    pub pitch_max: f32,
}

impl Default for CameraRigConfig {
    fn default() -> Self {
        Self {
            third_person_offset: Vec3::new(0.0, 1.0, 3.5),
            look_offset: Vec3::new(0.0, 0.3, 0.0),
            head_offset: Vec3::new(0.0, 0.15, 0.0),
            mouse_sensitivity: 0.002,
            pitch_min: -22.5 * PI / 180.0,
            pitch_max: 35.0 * PI / 180.0,
        }
    }
}

/// Camera follow state: view mode, pointer lock and free-look angles
pub struct CameraRig {
    pub config: CameraRigConfig,
    mode: CameraMode,
    lock: PointerLockState,
    follow_enabled: bool,
    yaw: f32,
    pitch: f32,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self::new(CameraRigConfig::default())
    }
}

impl CameraRig {
    pub fn new(config: CameraRigConfig) -> Self {
        Self {
            config,
            mode: CameraMode::ThirdPerson,
            lock: PointerLockState::Unlocked,
            follow_enabled: true,
            yaw: 0.0,
            pitch: 0.0,
        }
    }

    /// Builder: set the initial view mode
    pub fn with_mode(mut self, mode: CameraMode) -> Self {
        self.mode = mode;
        self
    }

    /// Builder: enable or disable following
    pub fn with_follow(mut self, enabled: bool) -> Self {
        self.follow_enabled = enabled;
        self
    }

    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: CameraMode) {
        self.mode = mode;
    }

    /// Switch between first and third person, returning the new mode
    pub fn toggle_mode(&mut self) -> CameraMode {
        self.mode = match self.mode {
            CameraMode::ThirdPerson => CameraMode::FirstPerson,
            CameraMode::FirstPerson => CameraMode::ThirdPerson,
        };
        log::debug!("Camera mode: {:?}", self.mode);
        self.mode
    }

    pub fn follow_enabled(&self) -> bool {
        self.follow_enabled
    }

    pub fn set_follow_enabled(&mut self, enabled: bool) {
        self.follow_enabled = enabled;
    }

    pub fn lock_state(&self) -> PointerLockState {
        self.lock
    }

    pub fn is_locked(&self) -> bool {
        self.lock == PointerLockState::Locked
    }

    /// Free-look yaw in radians
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Free-look pitch in radians (positive looks down)
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Ask the host for pointer lock
    ///
    /// Ignored while a request is pending or the pointer is already locked.
    /// Returns whether a request was issued.
    pub fn request_pointer_lock(&mut self, host: &mut dyn PointerLockHost) -> bool {
        if self.lock != PointerLockState::Unlocked {
            return false;
        }
        self.lock = PointerLockState::Pending;
        host.request_pointer_lock();
        true
    }

    /// Deliver the host's answer to a pending request
    pub fn pointer_lock_resolved(&mut self, result: Result<(), PointerLockError>) {
        if self.lock != PointerLockState::Pending {
            log::debug!("Ignoring pointer lock result with no pending request");
            return;
        }
        match result {
            Ok(()) => {
                self.lock = PointerLockState::Locked;
                log::info!("Pointer locked");
            }
            Err(e) => {
                self.lock = PointerLockState::Unlocked;
                log::warn!("{}", e);
            }
        }
    }

    /// The host lost the lock (Escape, focus change)
    pub fn pointer_lock_lost(&mut self) {
        if self.lock != PointerLockState::Unlocked {
            log::info!("Pointer unlocked");
        }
        self.lock = PointerLockState::Unlocked;
        self.pitch = 0.0;
    }

    /// Release the pointer on request
    pub fn release_pointer_lock(&mut self, host: &mut dyn PointerLockHost) {
        if self.lock == PointerLockState::Unlocked {
            return;
        }
        host.release_pointer_lock();
        self.pointer_lock_lost();
    }

    /// Apply raw mouse motion
    ///
    /// Only affects the view while the pointer is locked. Returns whether the
    /// motion was used.
    pub fn handle_mouse_motion(&mut self, delta_x: f64, delta_y: f64) -> bool {
        if !self.is_locked() {
            return false;
        }
        // Mouse right turns right (negative yaw), mouse down looks down
        self.yaw -= delta_x as f32 * self.config.mouse_sensitivity;
        self.pitch = (self.pitch + delta_y as f32 * self.config.mouse_sensitivity)
            .clamp(self.config.pitch_min, self.config.pitch_max);
        true
    }

    /// Keep the camera behind the player while unlocked
    pub fn sync_to_facing(&mut self, player_yaw: f32) {
        if !self.is_locked() {
            self.yaw = player_yaw;
        }
    }

    fn view_rotation(&self) -> Quat {
        let pitch = if self.is_locked() { self.pitch } else { 0.0 };
        Quat::from_yaw(self.yaw).mul(Quat::from_axis_angle(Vec3::X, -pitch))
    }

    /// Camera pose for a player at `player_position` facing `player_yaw`
    ///
    /// First person looks along the player's forward vector, ignoring the
    /// free-look angles.
    pub fn compute_pose(&self, player_position: Vec3, player_yaw: f32) -> CameraPose {
        let rotation = self.view_rotation();
        match self.mode {
            CameraMode::ThirdPerson => CameraPose {
                position: player_position + rotation.rotate(self.config.third_person_offset),
                look_at: player_position + rotation.rotate(self.config.look_offset),
                model_visible: true,
            },
            CameraMode::FirstPerson => {
                let eye = player_position + self.config.head_offset;
                CameraPose {
                    position: eye,
                    look_at: eye + yaw_forward(player_yaw),
                    model_visible: false,
                }
            }
        }
    }

    /// Push a pose to a camera
    pub fn apply<C: CameraControl + ?Sized>(&self, pose: &CameraPose, player_position: Vec3, camera: &mut C) {
        camera.set_position(pose.position);
        camera.look_at(pose.look_at);
        camera.set_orbit_target(player_position);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    const EPSILON: f32 = 0.0001;

    #[derive(Default)]
    struct MockHost {
        requests: usize,
        releases: usize,
    }

    impl PointerLockHost for MockHost {
        fn request_pointer_lock(&mut self) {
            self.requests += 1;
        }

        fn release_pointer_lock(&mut self) {
            self.releases += 1;
        }
    }

    fn locked_rig() -> CameraRig {
        let mut rig = CameraRig::default();
        let mut host = MockHost::default();
        rig.request_pointer_lock(&mut host);
        rig.pointer_lock_resolved(Ok(()));
        rig
    }

    #[test]
    fn test_request_while_pending_ignored() {
        let mut rig = CameraRig::default();
        let mut host = MockHost::default();
        assert!(rig.request_pointer_lock(&mut host));
        assert!(!rig.request_pointer_lock(&mut host));
        assert_eq!(host.requests, 1);
        assert_eq!(rig.lock_state(), PointerLockState::Pending);
    }

    #[test]
    fn test_request_while_locked_ignored() {
        let mut rig = locked_rig();
        let mut host = MockHost::default();
        assert!(!rig.request_pointer_lock(&mut host));
        assert_eq!(host.requests, 0);
    }

    #[test]
    fn test_rejection_clears_pending() {
        let mut rig = CameraRig::default();
        let mut host = MockHost::default();
        rig.request_pointer_lock(&mut host);
        rig.pointer_lock_resolved(Err(PointerLockError::Rejected("no focus".to_string())));
        assert_eq!(rig.lock_state(), PointerLockState::Unlocked);
        // A new request can be made
        assert!(rig.request_pointer_lock(&mut host));
    }

    #[test]
    fn test_stray_result_ignored() {
        let mut rig = CameraRig::default();
        rig.pointer_lock_resolved(Ok(()));
        assert_eq!(rig.lock_state(), PointerLockState::Unlocked);
    }

    #[test]
    fn test_mouse_ignored_when_unlocked() {
        let mut rig = CameraRig::default();
        assert!(!rig.handle_mouse_motion(100.0, 100.0));
        assert_eq!(rig.yaw(), 0.0);
        assert_eq!(rig.pitch(), 0.0);
    }

    #[test]
    fn test_pitch_clamped() {
        let mut rig = locked_rig();
        rig.handle_mouse_motion(0.0, 100_000.0);
        assert!((rig.pitch() - 35.0_f32.to_radians()).abs() < EPSILON);
        rig.handle_mouse_motion(0.0, -100_000.0);
        assert!((rig.pitch() - (-22.5_f32).to_radians()).abs() < EPSILON);
    }

    #[test]
    fn test_mouse_right_turns_right() {
        let mut rig = locked_rig();
        rig.handle_mouse_motion(50.0, 0.0);
        assert!(rig.yaw() < 0.0);
    }

    #[test]
    fn test_unlocked_yaw_mirrors_facing() {
        let mut rig = CameraRig::default();
        rig.sync_to_facing(1.2);
        assert_eq!(rig.yaw(), 1.2);

        let mut locked = locked_rig();
        locked.sync_to_facing(1.2);
        assert_eq!(locked.yaw(), 0.0);
    }

    #[test]
    fn test_lock_lost() {
        let mut rig = locked_rig();
        let mut host = MockHost::default();
        rig.release_pointer_lock(&mut host);
        assert_eq!(host.releases, 1);
        assert_eq!(rig.lock_state(), PointerLockState::Unlocked);
    }

    #[test]
    fn test_third_person_pose_behind_player() {
        let rig = CameraRig::default();
        let pose = rig.compute_pose(Vec3::new(0.0, 1.3, 0.0), 0.0);
        assert!((pose.position - Vec3::new(0.0, 2.3, 3.5)).length() < EPSILON);
        assert!((pose.look_at - Vec3::new(0.0, 1.6, 0.0)).length() < EPSILON);
        assert!(pose.model_visible);
    }

    #[test]
    fn test_third_person_pose_follows_yaw() {
        let mut rig = CameraRig::default();
        rig.sync_to_facing(FRAC_PI_2);
        let pose = rig.compute_pose(Vec3::ZERO, rig.yaw());
        // Facing -X, so the camera sits on +X
        assert!((pose.position.x - 3.5).abs() < EPSILON);
        assert!(pose.position.z.abs() < EPSILON);
    }

    #[test]
    fn test_pitch_raises_third_person_camera() {
        let mut rig = locked_rig();
        rig.handle_mouse_motion(0.0, 200.0);
        let pose = rig.compute_pose(Vec3::ZERO, rig.yaw());
        assert!(pose.position.y > 1.0);
    }

    #[test]
    fn test_first_person_pose() {
        let mut rig = CameraRig::default().with_mode(CameraMode::FirstPerson);
        rig.sync_to_facing(0.0);
        let pose = rig.compute_pose(Vec3::new(0.0, 1.3, 0.0), 0.0);
        assert!((pose.position - Vec3::new(0.0, 1.45, 0.0)).length() < EPSILON);
        assert!((pose.look_at - Vec3::new(0.0, 1.45, -1.0)).length() < EPSILON);
        assert!(!pose.model_visible);
    }

    #[test]
    fn test_first_person_looks_along_player_facing() {
        let mut rig = locked_rig().with_mode(CameraMode::FirstPerson);
        rig.handle_mouse_motion(300.0, 200.0);
        assert!(rig.yaw().abs() > EPSILON);

        let pose = rig.compute_pose(Vec3::ZERO, FRAC_PI_2);
        let eye = Vec3::new(0.0, 0.15, 0.0);
        assert!((pose.position - eye).length() < EPSILON);
        // Facing -X regardless of the free-look yaw and pitch
        assert!((pose.look_at - (eye + Vec3::new(-1.0, 0.0, 0.0))).length() < EPSILON);
    }

    #[test]
    fn test_toggle_mode() {
        let mut rig = CameraRig::default();
        assert_eq!(rig.toggle_mode(), CameraMode::FirstPerson);
        assert_eq!(rig.toggle_mode(), CameraMode::ThirdPerson);
    }

    #[test]
    fn test_apply_to_camera() {
        let rig = CameraRig::default();
        let pose = rig.compute_pose(Vec3::ZERO, rig.yaw());
        let mut camera = FollowCamera::default();
        rig.apply(&pose, Vec3::ZERO, &mut camera);
        assert_eq!(camera.position, pose.position);
        assert_eq!(camera.target, pose.look_at);
    }
}
