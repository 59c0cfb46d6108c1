//! Input-driven horizontal movement
//!
//! Two modes are supported:
//! - **Free-look**: keys move the player relative to the camera yaw and the
//!   body turns smoothly toward the direction of travel
//! - **Direct**: left/right turn the body, forward/back move along its facing
//!
//! Movement displaces the body directly; it does not go through velocity.

use botlab_math::{lerp_angle, yaw_forward, yaw_from_direction, yaw_right, Vec3};

use crate::player::{MoveFlags, PlayerBody, PlayerPhysicsConfig};

/// How held keys map to motion
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MovementMode {
    /// Camera-relative movement; `camera_yaw` is the camera's current yaw
    FreeLook { camera_yaw: f32 },
    /// Tank-style turning and moving along the body's facing
    Direct,
}

/// Signed axis value from a pair of opposing keys
fn axis(input: MoveFlags, positive: MoveFlags, negative: MoveFlags) -> f32 {
    let mut value = 0.0;
    if input.contains(positive) {
        value += 1.0;
    }
    if input.contains(negative) {
        value -= 1.0;
    }
    value
}

fn speed(input: MoveFlags, config: &PlayerPhysicsConfig) -> f32 {
    if input.contains(MoveFlags::SPRINT) {
        config.move_speed * config.sprint_multiplier
    } else {
        config.move_speed
    }
}

/// Apply one substep of movement and turning
///
/// Returns the world-space displacement that was applied.
pub fn apply_movement(
    body: &mut PlayerBody,
    input: MoveFlags,
    mode: MovementMode,
    dt: f32,
    config: &PlayerPhysicsConfig,
) -> Vec3 {
    let forward_axis = axis(input, MoveFlags::FORWARD, MoveFlags::BACKWARD);
    let speed = speed(input, config);

    match mode {
        MovementMode::FreeLook { camera_yaw } => {
            let right_axis = axis(input, MoveFlags::RIGHT, MoveFlags::LEFT);
            let direction = (yaw_forward(camera_yaw) * forward_axis
                + yaw_right(camera_yaw) * right_axis)
                .normalized();
            if direction == Vec3::ZERO {
                return Vec3::ZERO;
            }

            let displacement = direction * speed * dt;
            body.position += displacement;

            let target = yaw_from_direction(direction);
            let t = 1.0 - (-config.free_look_turn_rate * dt).exp();
            body.yaw = lerp_angle(body.yaw, target, t);
            body.target_yaw = body.yaw;
            displacement
        }
        MovementMode::Direct => {
            let turn_axis = axis(input, MoveFlags::LEFT, MoveFlags::RIGHT);
            body.target_yaw += turn_axis * config.turn_speed * dt;
            body.yaw += (body.target_yaw - body.yaw) * config.rotation_smoothing;

            if forward_axis == 0.0 {
                return Vec3::ZERO;
            }
            let displacement = yaw_forward(body.yaw) * forward_axis * speed * dt;
            body.position += displacement;
            displacement
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::CapsuleShape;
    use std::f32::consts::FRAC_PI_2;

    const EPSILON: f32 = 0.0001;

    fn body() -> PlayerBody {
        PlayerBody::new(Vec3::ZERO, 0.0, CapsuleShape::default())
    }

    #[test]
    fn test_no_input_no_motion() {
        let mut b = body();
        let config = PlayerPhysicsConfig::default();
        let d = apply_movement(&mut b, MoveFlags::empty(), MovementMode::FreeLook { camera_yaw: 1.0 }, 0.1, &config);
        assert_eq!(d, Vec3::ZERO);
        assert_eq!(b.yaw, 0.0);
    }

    #[test]
    fn test_free_look_forward_follows_camera() {
        let mut b = body();
        let config = PlayerPhysicsConfig::default();
        // Camera turned a quarter left: forward is -X
        let mode = MovementMode::FreeLook { camera_yaw: FRAC_PI_2 };
        let d = apply_movement(&mut b, MoveFlags::FORWARD, mode, 0.5, &config);
        assert!((d - Vec3::new(-2.0, 0.0, 0.0)).length() < EPSILON);
        assert!(b.yaw > 0.0 && b.yaw < FRAC_PI_2);
    }

    #[test]
    fn test_free_look_diagonal_is_normalized() {
        let mut b = body();
        let config = PlayerPhysicsConfig::default();
        let mode = MovementMode::FreeLook { camera_yaw: 0.0 };
        let d = apply_movement(&mut b, MoveFlags::FORWARD | MoveFlags::RIGHT, mode, 1.0, &config);
        assert!((d.length() - config.move_speed).abs() < EPSILON);
    }

    #[test]
    fn test_sprint_doubles_speed() {
        let mut b = body();
        let config = PlayerPhysicsConfig::default();
        let mode = MovementMode::FreeLook { camera_yaw: 0.0 };
        let d = apply_movement(&mut b, MoveFlags::FORWARD | MoveFlags::SPRINT, mode, 1.0, &config);
        assert!((d.length() - 8.0).abs() < EPSILON);
    }

    #[test]
    fn test_free_look_facing_converges() {
        let mut b = body();
        let config = PlayerPhysicsConfig::default();
        let mode = MovementMode::FreeLook { camera_yaw: 0.0 };
        for _ in 0..480 {
            apply_movement(&mut b, MoveFlags::RIGHT, mode, 1.0 / 240.0, &config);
        }
        // Moving +X means facing yaw -PI/2
        assert!((b.yaw + FRAC_PI_2).abs() < 0.01);
    }

    #[test]
    fn test_direct_turning() {
        let mut b = body();
        let config = PlayerPhysicsConfig::default();
        apply_movement(&mut b, MoveFlags::LEFT, MovementMode::Direct, 0.1, &config);
        assert!((b.target_yaw - 0.25).abs() < EPSILON);
        assert!(b.yaw > 0.0 && b.yaw < b.target_yaw);
    }

    #[test]
    fn test_direct_backward() {
        let mut b = body();
        let config = PlayerPhysicsConfig::default();
        let d = apply_movement(&mut b, MoveFlags::BACKWARD, MovementMode::Direct, 0.25, &config);
        assert!((d - Vec3::new(0.0, 0.0, 1.0)).length() < EPSILON);
    }

    #[test]
    fn test_opposing_keys_cancel() {
        let mut b = body();
        let config = PlayerPhysicsConfig::default();
        let input = MoveFlags::FORWARD | MoveFlags::BACKWARD;
        let d = apply_movement(&mut b, input, MovementMode::FreeLook { camera_yaw: 0.0 }, 1.0, &config);
        assert_eq!(d, Vec3::ZERO);
    }
}
