//! Application configuration
//!
//! Configuration is loaded from multiple sources with the following priority (lowest to highest):
//! 1. `config/default.toml` (version controlled)
//! 2. `config/user.toml` (gitignored, user overrides)
//! 3. Environment variables (`BOTLAB_SECTION__KEY`)

use std::collections::BTreeMap;
use std::path::Path;

use botlab_core::{AnimationClip, ClipMixer, SessionConfig, SpawnPose};
use botlab_input::{CameraMode, CameraRigConfig, KeyBindings};
use botlab_math::Vec3;
use botlab_physics::{CapsuleShape, PlayerPhysicsConfig};
use figment::{Figment, providers::{Format, Toml, Env}};
use serde::{Serialize, Deserialize};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Window configuration
    #[serde(default)]
    pub window: WindowConfig,
    /// Player physics and spawn configuration
    #[serde(default)]
    pub player: PlayerConfig,
    /// Camera rig configuration
    #[serde(default)]
    pub camera: CameraConfig,
    /// Key binding overrides
    #[serde(default)]
    pub input: InputConfig,
    /// Animation timing
    #[serde(default)]
    pub animation: AnimationConfig,
    /// Debug configuration
    #[serde(default)]
    pub debug: DebugConfig,
}

impl AppConfig {
    /// Load configuration from default locations
    ///
    /// Priority (lowest to highest):
    /// 1. `config/default.toml`
    /// 2. `config/user.toml`
    /// 3. Environment variables (`BOTLAB_*`)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific config directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();
        let default_path = config_dir.join("default.toml");
        let user_path = config_dir.join("user.toml");

        let mut figment = Figment::new();

        if default_path.exists() {
            figment = figment.merge(Toml::file(&default_path));
        }

        if user_path.exists() {
            figment = figment.merge(Toml::file(&user_path));
        }

        // BOTLAB_PLAYER__MOVE_SPEED=6 -> player.move_speed = 6
        figment = figment.merge(Env::prefixed("BOTLAB_").split("__"));

        figment.extract().map_err(ConfigError::from)
    }

    /// Everything the player session needs
    pub fn to_session_config(&self) -> SessionConfig {
        SessionConfig {
            physics: self.player.to_physics_config(),
            camera: self.camera.to_rig_config(),
            crossfade: self.animation.crossfade.max(0.0),
            fallback_spawn: self.player.spawn_pose(),
        }
    }
}

/// Window configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Window width in pixels
    pub width: u32,
    /// Window height in pixels
    pub height: u32,
    /// Start in fullscreen mode
    pub fullscreen: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Botlab".to_string(),
            width: 1280,
            height: 720,
            fullscreen: false,
        }
    }
}

/// Player physics configuration
///
/// Mirrors [`PlayerPhysicsConfig`] with a substep rate instead of a
/// substep length, plus the fallback spawn pose.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub gravity: f32,
    pub terminal_velocity: f32,
    pub jump_force: f32,
    pub coyote_time: f32,
    pub min_fall_distance: f32,
    pub move_speed: f32,
    pub sprint_multiplier: f32,
    /// Keyboard turn rate in radians per second
    pub turn_speed: f32,
    pub rotation_smoothing: f32,
    pub free_look_turn_rate: f32,
    pub friction: f32,
    pub damping: f32,
    pub ground_normal_threshold: f32,
    pub max_grounding_velocity: f32,
    /// Height below which the player respawns
    pub world_floor: f32,
    /// Physics substeps per second
    pub substep_rate: u32,
    /// Frame gaps longer than this (seconds) skip physics
    pub freeze_threshold: f32,
    pub capsule_radius: f32,
    pub capsule_segment_length: f32,
    /// Spawn position [x, y, z] used when the scene has none
    pub spawn_position: [f32; 3],
    /// Spawn yaw in degrees
    pub spawn_yaw: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        let physics = PlayerPhysicsConfig::default();
        Self {
            gravity: physics.gravity,
            terminal_velocity: physics.terminal_velocity,
            jump_force: physics.jump_force,
            coyote_time: physics.coyote_time,
            min_fall_distance: physics.min_fall_distance,
            move_speed: physics.move_speed,
            sprint_multiplier: physics.sprint_multiplier,
            turn_speed: physics.turn_speed,
            rotation_smoothing: physics.rotation_smoothing,
            free_look_turn_rate: physics.free_look_turn_rate,
            friction: physics.friction,
            damping: physics.damping,
            ground_normal_threshold: physics.ground_normal_threshold,
            max_grounding_velocity: physics.max_grounding_velocity,
            world_floor: physics.world_floor,
            substep_rate: 240,
            freeze_threshold: physics.freeze_threshold,
            capsule_radius: physics.capsule.radius,
            capsule_segment_length: physics.capsule.segment_length,
            spawn_position: [0.0, 2.0, 0.0],
            spawn_yaw: 0.0,
        }
    }
}

impl PlayerConfig {
    /// Convert to the physics crate's config
    ///
    /// A zero substep rate falls back to 240 Hz.
    pub fn to_physics_config(&self) -> PlayerPhysicsConfig {
        let rate = if self.substep_rate == 0 {
            log::warn!("player.substep_rate must be positive, using 240");
            240
        } else {
            self.substep_rate
        };

        PlayerPhysicsConfig {
            gravity: self.gravity,
            terminal_velocity: self.terminal_velocity,
            jump_force: self.jump_force,
            coyote_time: self.coyote_time,
            min_fall_distance: self.min_fall_distance,
            move_speed: self.move_speed,
            sprint_multiplier: self.sprint_multiplier,
            turn_speed: self.turn_speed,
            rotation_smoothing: self.rotation_smoothing,
            free_look_turn_rate: self.free_look_turn_rate,
            friction: self.friction,
            damping: self.damping,
            ground_normal_threshold: self.ground_normal_threshold,
            max_grounding_velocity: self.max_grounding_velocity,
            world_floor: self.world_floor,
            substep: 1.0 / rate as f32,
            freeze_threshold: self.freeze_threshold,
            capsule: CapsuleShape::new(self.capsule_radius, self.capsule_segment_length),
            ..PlayerPhysicsConfig::default()
        }
    }

    pub fn spawn_pose(&self) -> SpawnPose {
        let [x, y, z] = self.spawn_position;
        SpawnPose::new(Vec3::new(x, y, z), self.spawn_yaw.to_radians())
    }
}

/// Camera rig configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Third-person offset behind the player [x, y, z]
    pub third_person_offset: [f32; 3],
    /// Third-person look target offset [x, y, z]
    pub look_offset: [f32; 3],
    /// First-person eye offset [x, y, z]
    pub head_offset: [f32; 3],
    /// Radians per pixel of mouse motion
    pub mouse_sensitivity: f32,
    /// Pitch limits in degrees (negative looks up)
    pub pitch_min: f32,
    pub pitch_max: f32,
    /// Start in first person
    pub first_person: bool,
    /// Whether the camera follows the player at all
    pub follow: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        let rig = CameraRigConfig::default();
        Self {
            third_person_offset: rig.third_person_offset.to_array(),
            look_offset: rig.look_offset.to_array(),
            head_offset: rig.head_offset.to_array(),
            mouse_sensitivity: rig.mouse_sensitivity,
            pitch_min: rig.pitch_min.to_degrees(),
            pitch_max: rig.pitch_max.to_degrees(),
            first_person: false,
            follow: true,
        }
    }
}

impl CameraConfig {
    pub fn to_rig_config(&self) -> CameraRigConfig {
        let vec = |[x, y, z]: [f32; 3]| Vec3::new(x, y, z);
        let (pitch_min, pitch_max) = if self.pitch_min <= self.pitch_max {
            (self.pitch_min, self.pitch_max)
        } else {
            log::warn!("camera.pitch_min is above camera.pitch_max, swapping them");
            (self.pitch_max, self.pitch_min)
        };

        CameraRigConfig {
            third_person_offset: vec(self.third_person_offset),
            look_offset: vec(self.look_offset),
            head_offset: vec(self.head_offset),
            mouse_sensitivity: self.mouse_sensitivity,
            pitch_min: pitch_min.to_radians(),
            pitch_max: pitch_max.to_radians(),
        }
    }

    pub fn initial_mode(&self) -> CameraMode {
        if self.first_person {
            CameraMode::FirstPerson
        } else {
            CameraMode::ThirdPerson
        }
    }
}

/// Input configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Action name to key name, e.g. `jump = "KeyJ"`
    pub bindings: BTreeMap<String, String>,
}

impl InputConfig {
    /// Default bindings with the configured overrides applied
    ///
    /// Malformed entries are logged and skipped.
    pub fn to_key_bindings(&self) -> KeyBindings {
        let mut bindings = KeyBindings::default();
        let applied = bindings.apply_overrides(
            self.bindings.iter().map(|(action, key)| (action.as_str(), key.as_str())),
        );
        if applied > 0 {
            log::info!("Applied {} key binding override(s)", applied);
        }
        bindings
    }
}

/// Animation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Crossfade between clips in seconds
    pub crossfade: f32,
    /// Clip name to duration in seconds
    pub clip_durations: BTreeMap<String, f32>,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            crossfade: botlab_core::DEFAULT_CROSSFADE,
            clip_durations: BTreeMap::new(),
        }
    }
}

impl AnimationConfig {
    /// Build a mixer holding every clip, with configured durations
    pub fn build_mixer(&self) -> ClipMixer {
        let mut mixer = ClipMixer::with_default_clips();
        for (name, &duration) in &self.clip_durations {
            match AnimationClip::from_name(name) {
                Some(clip) if duration > 0.0 => mixer.add_clip(clip, duration),
                Some(_) => log::warn!("Ignoring non-positive duration for clip '{}'", name),
                None => log::warn!("Ignoring duration for unknown clip '{}'", name),
            }
        }
        mixer
    }
}

/// Debug configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
    /// Show ground contact details in the window title
    pub show_contacts: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            show_contacts: false,
        }
    }
}

/// Configuration error
#[derive(Debug)]
pub struct ConfigError {
    message: String,
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        ConfigError {
            message: e.to_string(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Configuration error: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}
