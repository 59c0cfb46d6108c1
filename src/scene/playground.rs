//! Playground - procedurally built test level
//!
//! Provides a fluent API for laying out ground, ramps, blocks and moving
//! platforms. The ground and ramps become the primary collision mesh; blocks
//! and platforms are registered as named colliders so they can be toggled or
//! moved at runtime.

use std::f32::consts::PI;

use botlab_core::{AnimationMixer, PlayerSession, SceneGraph, SpawnPose};
use botlab_math::{Quat, Transform3, Vec3};
use botlab_physics::{CollisionMesh, Triangle};

/// A collider registered when the playground is installed
#[derive(Clone, Debug)]
struct BlockSpec {
    name: String,
    triangles: Vec<Triangle>,
    transform: Transform3,
}

/// A block that travels back and forth along a straight line
///
/// Position follows `origin + travel * (1 - cos(2πt/period)) / 2`, so the
/// platform eases out of each end.
#[derive(Clone, Debug)]
pub struct MovingPlatform {
    pub name: String,
    pub origin: Vec3,
    pub travel: Vec3,
    pub period: f32,
    elapsed: f32,
}

impl MovingPlatform {
    pub fn new(name: impl Into<String>, origin: Vec3, travel: Vec3, period: f32) -> Self {
        Self {
            name: name.into(),
            origin,
            travel,
            period: period.max(f32::EPSILON),
            elapsed: 0.0,
        }
    }

    fn phase(&self) -> f32 {
        2.0 * PI * self.elapsed / self.period
    }

    pub fn position(&self) -> Vec3 {
        self.origin + self.travel * (0.5 - 0.5 * self.phase().cos())
    }

    pub fn velocity(&self) -> Vec3 {
        self.travel * (PI / self.period * self.phase().sin())
    }

    /// Advance the platform clock
    pub fn advance(&mut self, dt: f32) {
        self.elapsed = (self.elapsed + dt) % self.period;
    }
}

/// Builder for [`Playground`]
///
/// # Example
/// ```ignore
/// let playground = PlaygroundBuilder::new()
///     .add_ground(0.0, 40.0, 8)
///     .add_block("wall", Vec3::new(6.0, 1.5, 0.0), Vec3::new(0.25, 1.5, 4.0))
///     .add_moving_platform("lift", Vec3::new(-6.0, 0.25, 0.0), Vec3::new(1.5, 0.25, 1.5), Vec3::new(0.0, 3.0, 0.0), 6.0)
///     .with_spawn(SpawnPose::new(Vec3::new(0.0, 2.0, 0.0), 0.0))
///     .build();
/// ```
#[derive(Default)]
pub struct PlaygroundBuilder {
    primary: Vec<Triangle>,
    blocks: Vec<BlockSpec>,
    platforms: Vec<(MovingPlatform, Vec<Triangle>)>,
    spawn: Option<SpawnPose>,
}

impl PlaygroundBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flat square ground at height `y`, split into `cells` x `cells` quads
    pub fn add_ground(mut self, y: f32, half_extent: f32, cells: u32) -> Self {
        let cells = cells.max(1);
        let step = 2.0 * half_extent / cells as f32;
        for i in 0..cells {
            for j in 0..cells {
                let x0 = -half_extent + i as f32 * step;
                let z0 = -half_extent + j as f32 * step;
                self.primary.extend(quad(
                    Vec3::new(x0, y, z0),
                    Vec3::new(x0, y, z0 + step),
                    Vec3::new(x0 + step, y, z0 + step),
                    Vec3::new(x0 + step, y, z0),
                ));
            }
        }
        self
    }

    /// Slope rising by `rise` over `length` toward -Z from `start`
    pub fn add_ramp(mut self, start: Vec3, half_width: f32, length: f32, rise: f32) -> Self {
        self.primary.extend(quad(
            Vec3::new(start.x - half_width, start.y, start.z),
            Vec3::new(start.x + half_width, start.y, start.z),
            Vec3::new(start.x + half_width, start.y + rise, start.z - length),
            Vec3::new(start.x - half_width, start.y + rise, start.z - length),
        ));
        self
    }

    /// Static box registered as a named collider
    pub fn add_block(mut self, name: &str, center: Vec3, half_extents: Vec3) -> Self {
        self.blocks.push(BlockSpec {
            name: name.to_string(),
            triangles: box_triangles(half_extents),
            transform: Transform3::from_position(center),
        });
        self
    }

    /// Box that travels between `origin` and `origin + travel`
    pub fn add_moving_platform(
        mut self,
        name: &str,
        origin: Vec3,
        half_extents: Vec3,
        travel: Vec3,
        period: f32,
    ) -> Self {
        self.platforms.push((
            MovingPlatform::new(name, origin, travel, period),
            box_triangles(half_extents),
        ));
        self
    }

    pub fn with_spawn(mut self, spawn: SpawnPose) -> Self {
        self.spawn = Some(spawn);
        self
    }

    pub fn build(self) -> Playground {
        Playground {
            primary: self.primary,
            blocks: self.blocks,
            platforms: self.platforms,
            spawn: self.spawn,
        }
    }
}

/// A laid-out level ready to hand to a [`PlayerSession`]
pub struct Playground {
    primary: Vec<Triangle>,
    blocks: Vec<BlockSpec>,
    platforms: Vec<(MovingPlatform, Vec<Triangle>)>,
    spawn: Option<SpawnPose>,
}

impl Playground {
    /// The demo level: ground, a ramp up to a ledge, a wall and a lift
    pub fn demo() -> Self {
        PlaygroundBuilder::new()
            .add_ground(0.0, 40.0, 8)
            .add_ramp(Vec3::new(0.0, 0.0, -4.0), 1.5, 6.0, 2.0)
            .add_block("ledge", Vec3::new(0.0, 1.0, -13.0), Vec3::new(3.0, 1.0, 3.0))
            .add_block("wall", Vec3::new(8.0, 1.5, 0.0), Vec3::new(0.25, 1.5, 5.0))
            .add_block("tower", Vec3::new(-10.0, 2.5, -10.0), Vec3::new(1.5, 2.5, 1.5))
            .add_moving_platform(
                "lift",
                Vec3::new(-6.0, 0.25, 0.0),
                Vec3::new(1.5, 0.25, 1.5),
                Vec3::new(0.0, 4.5, 0.0),
                8.0,
            )
            .with_spawn(SpawnPose::new(Vec3::new(0.0, 2.0, 4.0), 0.0))
            .build()
    }

    /// Primary collision mesh, or `None` for a level with no static ground
    pub fn primary_mesh(&self) -> Option<CollisionMesh> {
        if self.primary.is_empty() {
            None
        } else {
            Some(CollisionMesh::new(self.primary.clone(), Transform3::IDENTITY))
        }
    }

    pub fn spawn(&self) -> Option<SpawnPose> {
        self.spawn
    }

    pub fn platforms(&self) -> impl Iterator<Item = &MovingPlatform> {
        self.platforms.iter().map(|(platform, _)| platform)
    }

    /// Register every block and platform with the session
    ///
    /// Returns the number of colliders registered. Rejected registrations
    /// are logged and skipped.
    pub fn install<M: AnimationMixer, S: SceneGraph>(&self, session: &mut PlayerSession<M, S>) -> usize {
        let blocks = self
            .blocks
            .iter()
            .map(|b| (b.name.as_str(), &b.triangles, b.transform));
        let platforms = self
            .platforms
            .iter()
            .map(|(p, tris)| (p.name.as_str(), tris, Transform3::from_position(p.position())));

        let mut installed = 0;
        for (name, triangles, transform) in blocks.chain(platforms) {
            match session.add_collider(name, None, triangles.clone(), transform) {
                Ok(_) => installed += 1,
                Err(e) => log::warn!("Skipping collider '{}': {}", name, e),
            }
        }

        session.set_spawn(self.spawn);
        log::info!(
            "Playground installed: {} primary triangles, {} colliders",
            self.primary.len(),
            installed
        );
        installed
    }

    /// Move platforms by `dt` and push their new pose and velocity to the session
    pub fn update<M: AnimationMixer, S: SceneGraph>(&mut self, session: &mut PlayerSession<M, S>, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        for (platform, _) in &mut self.platforms {
            platform.advance(dt);
            let moved = session
                .set_collider_velocity(&platform.name, platform.velocity())
                .and_then(|_| session.update_collider_position(&platform.name, platform.position(), Quat::IDENTITY));
            if let Err(e) = moved {
                log::debug!("Platform '{}' not moved: {}", platform.name, e);
            }
        }
    }
}

/// Two triangles for a quad wound counter-clockwise seen from its front
fn quad(a: Vec3, b: Vec3, c: Vec3, d: Vec3) -> [Triangle; 2] {
    [Triangle::new(a, b, c), Triangle::new(a, c, d)]
}

/// Axis-aligned box centered on the origin with outward-facing triangles
pub fn box_triangles(half: Vec3) -> Vec<Triangle> {
    let (x, y, z) = (half.x, half.y, half.z);
    let v = Vec3::new;
    let faces = [
        // +Y
        quad(v(-x, y, -z), v(-x, y, z), v(x, y, z), v(x, y, -z)),
        // -Y
        quad(v(-x, -y, -z), v(x, -y, -z), v(x, -y, z), v(-x, -y, z)),
        // +X
        quad(v(x, -y, -z), v(x, y, -z), v(x, y, z), v(x, -y, z)),
        // -X
        quad(v(-x, -y, -z), v(-x, -y, z), v(-x, y, z), v(-x, y, -z)),
        // +Z
        quad(v(-x, -y, z), v(x, -y, z), v(x, y, z), v(-x, y, z)),
        // -Z
        quad(v(-x, -y, -z), v(-x, y, -z), v(x, y, -z), v(x, -y, -z)),
    ];
    faces.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use botlab_core::{ClipMixer, FollowCamera, SceneObjectKind, SceneObjects, SessionConfig};

    const EPSILON: f32 = 1e-4;

    fn session_for(playground: &Playground) -> PlayerSession<ClipMixer, SceneObjects> {
        PlayerSession::new(
            SessionConfig::default(),
            ClipMixer::with_default_clips(),
            SceneObjects::new(),
            playground.primary_mesh(),
        )
    }

    #[test]
    fn test_box_normals_point_outward() {
        let tris = box_triangles(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(tris.len(), 12);
        for tri in &tris {
            let centroid = (tri.a + tri.b + tri.c) * (1.0 / 3.0);
            assert!(tri.normal().dot(centroid) > 0.0);
        }
    }

    #[test]
    fn test_ground_faces_up() {
        let playground = PlaygroundBuilder::new().add_ground(0.0, 4.0, 2).build();
        assert_eq!(playground.primary.len(), 8);
        for tri in &playground.primary {
            assert!((tri.normal().y - 1.0).abs() < EPSILON);
        }
    }

    #[test]
    fn test_ramp_faces_up_and_back() {
        let playground = PlaygroundBuilder::new()
            .add_ramp(Vec3::ZERO, 1.0, 4.0, 2.0)
            .build();
        let normal = playground.primary[0].normal();
        assert!(normal.y > 0.0);
        assert!(normal.z > 0.0);
    }

    #[test]
    fn test_empty_playground_has_no_primary() {
        assert!(PlaygroundBuilder::new().build().primary_mesh().is_none());
    }

    #[test]
    fn test_platform_motion() {
        let mut platform = MovingPlatform::new("lift", Vec3::ZERO, Vec3::new(0.0, 4.0, 0.0), 8.0);
        assert_eq!(platform.position(), Vec3::ZERO);

        platform.advance(2.0);
        assert!((platform.position().y - 2.0).abs() < EPSILON);
        // Fastest at the midpoint: travel * π / period
        assert!((platform.velocity().y - 4.0 * PI / 8.0).abs() < EPSILON);

        platform.advance(2.0);
        assert!((platform.position().y - 4.0).abs() < EPSILON);
        assert!(platform.velocity().y.abs() < EPSILON);

        platform.advance(4.0);
        assert!(platform.position().y.abs() < EPSILON);
    }

    #[test]
    fn test_demo_install() {
        let playground = Playground::demo();
        let mut session = session_for(&playground);
        let installed = playground.install(&mut session);

        assert_eq!(installed, 4);
        assert_eq!(session.world().registry.len(), 4);
        assert_eq!(session.scene().of_kind(SceneObjectKind::Collider).count(), 4);
        assert_eq!(session.spawn_pose(), playground.spawn().unwrap());
    }

    #[test]
    fn test_duplicate_block_skipped() {
        let playground = PlaygroundBuilder::new()
            .add_ground(0.0, 10.0, 1)
            .add_block("crate", Vec3::new(2.0, 0.5, 0.0), Vec3::splat(0.5))
            .add_block("crate", Vec3::new(-2.0, 0.5, 0.0), Vec3::splat(0.5))
            .build();
        let mut session = session_for(&playground);
        assert_eq!(playground.install(&mut session), 1);
    }

    #[test]
    fn test_update_moves_platform_collider() {
        let mut playground = Playground::demo();
        let mut session = session_for(&playground);
        playground.install(&mut session);

        playground.update(&mut session, 2.0);

        let entry = session.world().registry.get_by_name("lift").expect("lift registered");
        assert!((entry.mesh.transform.position.y - (0.25 + 2.25)).abs() < EPSILON);
        assert!(entry.velocity.y > 0.0);
    }

    #[test]
    fn test_player_rides_lift() {
        let mut playground = PlaygroundBuilder::new()
            .add_moving_platform(
                "lift",
                Vec3::ZERO,
                Vec3::new(2.0, 0.25, 2.0),
                Vec3::new(4.0, 0.0, 0.0),
                8.0,
            )
            .with_spawn(SpawnPose::new(Vec3::new(0.0, 1.55, 0.0), 0.0))
            .build();
        let mut session = session_for(&playground).with_spawn(SpawnPose::new(Vec3::new(0.0, 1.55, 0.0), 0.0));
        playground.install(&mut session);
        let mut camera = FollowCamera::default();

        // Settle onto the platform
        for _ in 0..30 {
            session.update(1.0 / 60.0, &mut camera);
        }
        assert!(session.state().on_ground);
        let start_x = session.body().position.x;

        for _ in 0..120 {
            playground.update(&mut session, 1.0 / 60.0);
            session.update(1.0 / 60.0, &mut camera);
        }

        // Two seconds in, the platform has moved half its travel
        assert!(session.body().position.x - start_x > 1.0);
        assert!(session.state().on_ground);
    }
}
