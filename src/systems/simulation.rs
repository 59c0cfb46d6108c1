//! Game simulation system
//!
//! Manages the per-frame simulation:
//! - Delta time calculation
//! - Moving platforms
//! - Player session stepping (substeps, collision, animation)
//! - Camera synchronization

use std::time::Instant;
use botlab_core::{AnimationClip, AnimationMixer, CameraControl, PlayerSession, SceneGraph, Vec3};
use crate::scene::Playground;

/// Result of a simulation update
#[derive(Debug, Clone, Copy)]
pub struct SimulationResult {
    /// Frame time in seconds
    pub dt: f32,
    /// Player body position after the frame
    pub position: Vec3,
    pub on_ground: bool,
    pub clip: Option<AnimationClip>,
}

/// Manages the game simulation loop
///
/// Frame time is passed through uncapped; the session itself skips physics
/// after long stalls and slices the rest into fixed substeps.
pub struct SimulationSystem {
    last_frame: Instant,
}

impl SimulationSystem {
    /// Create a new simulation system
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
        }
    }

    /// Seconds since the previous call (or construction)
    fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;
        dt
    }

    /// Run one simulation frame
    pub fn update<M, S, C>(
        &mut self,
        session: &mut PlayerSession<M, S>,
        playground: &mut Playground,
        camera: &mut C,
    ) -> SimulationResult
    where
        M: AnimationMixer,
        S: SceneGraph,
        C: CameraControl + ?Sized,
    {
        let dt = self.tick();
        Self::step(session, playground, camera, dt)
    }

    /// Run one frame with an explicit delta time
    pub fn step<M, S, C>(
        session: &mut PlayerSession<M, S>,
        playground: &mut Playground,
        camera: &mut C,
        dt: f32,
    ) -> SimulationResult
    where
        M: AnimationMixer,
        S: SceneGraph,
        C: CameraControl + ?Sized,
    {
        // Platforms move first so the session carries the player with this frame's velocity
        playground.update(session, dt);
        session.update(dt, camera);

        SimulationResult {
            dt,
            position: session.body().position,
            on_ground: session.state().on_ground,
            clip: session.current_clip(),
        }
    }
}

impl Default for SimulationSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use botlab_core::{ClipMixer, FollowCamera, SceneObjects, SessionConfig};

    #[test]
    fn test_tick_measures_elapsed() {
        let mut sim = SimulationSystem::new();
        std::thread::sleep(std::time::Duration::from_millis(20));
        let dt = sim.tick();
        assert!(dt >= 0.02);
        assert!(sim.tick() < dt);
    }

    #[test]
    fn test_default_construction() {
        let sim = SimulationSystem::default();
        assert!(sim.last_frame.elapsed().as_millis() < 100);
    }

    #[test]
    fn test_step_settles_player_on_demo_ground() {
        let mut playground = Playground::demo();
        let mut session = PlayerSession::new(
            SessionConfig::default(),
            ClipMixer::with_default_clips(),
            SceneObjects::new(),
            playground.primary_mesh(),
        );
        playground.install(&mut session);
        session.respawn();
        let mut camera = FollowCamera::default();

        let mut result = SimulationSystem::step(&mut session, &mut playground, &mut camera, 1.0 / 60.0);
        for _ in 0..90 {
            result = SimulationSystem::step(&mut session, &mut playground, &mut camera, 1.0 / 60.0);
        }

        assert!(result.on_ground);
        assert!((result.position.y - 1.3).abs() < 0.05);
        assert_eq!(result.clip, Some(AnimationClip::Idle));
        // The camera sits behind and above the player
        assert!(camera.position.y > result.position.y);
    }
}
