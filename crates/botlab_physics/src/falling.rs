//! Fall and landing detection
//!
//! A fall only counts once the player has dropped at least
//! `min_fall_distance` below the height at which they last left the ground.
//! Short hops and stairs therefore never trigger the falling/landing cycle.

use crate::player::PlayerState;

/// State change reported by [`detect_fall`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FallTransition {
    /// Nothing changed this substep
    None,
    /// The player just dropped far enough to count as falling
    StartedFalling,
    /// The player touched down after a real fall
    Landed,
}

/// Update the falling/landing flags after contacts were resolved
///
/// `height` is the body height after collision. `jump_locked` suppresses the
/// start of a fall while a jump animation is still playing.
pub fn detect_fall(
    state: &mut PlayerState,
    height: f32,
    min_fall_distance: f32,
    jump_locked: bool,
) -> FallTransition {
    if state.on_ground {
        if state.is_falling {
            state.is_falling = false;
            state.is_landing = true;
            state.landing_animation_played = false;
            return FallTransition::Landed;
        }
        return FallTransition::None;
    }

    if state.is_falling || state.is_landing || jump_locked {
        return FallTransition::None;
    }

    if state.fall_start_height - height >= min_fall_distance {
        state.is_falling = true;
        return FallTransition::StartedFalling;
    }
    FallTransition::None
}
