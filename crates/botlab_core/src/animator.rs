//! Animation state machine
//!
//! Tracks the current clip and issues crossfades to the mixer. Priorities,
//! highest first:
//! 1. Defeat: blocks everything until recovery
//! 2. Jump: locks other transitions while the clip runs
//! 3. Falling
//! 4. Landing
//! 5. Spell cast / arrow shot: block movement clips while running
//! 6. Movement: idle, walk or run
//!
//! Every successful switch bumps a generation counter. Deferred callbacks
//! capture it and are dropped if another switch happened in between.

use botlab_physics::PlayerState;

use crate::animation::{AnimationClip, AnimationMixer, DEFAULT_CROSSFADE};

/// Idle, walk or run for the given input
pub fn movement_clip(state: &PlayerState) -> AnimationClip {
    if !state.has_directional_input() {
        AnimationClip::Idle
    } else if state.is_sprinting() {
        AnimationClip::Run
    } else {
        AnimationClip::Walk
    }
}

/// Current clip, generation counter and defeat lock
#[derive(Clone, Debug, PartialEq)]
pub struct Animator {
    current: Option<AnimationClip>,
    generation: u64,
    defeated: bool,
    crossfade: f32,
}

impl Default for Animator {
    fn default() -> Self {
        Self::new(DEFAULT_CROSSFADE)
    }
}

impl Animator {
    pub fn new(crossfade: f32) -> Self {
        Self {
            current: None,
            generation: 0,
            defeated: false,
            crossfade,
        }
    }

    pub fn current(&self) -> Option<AnimationClip> {
        self.current
    }

    /// Bumped on every clip switch
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_defeated(&self) -> bool {
        self.defeated
    }

    pub fn crossfade(&self) -> f32 {
        self.crossfade
    }

    /// Crossfade from the current clip to `clip`
    ///
    /// Switching to the current clip is a no-op. Returns whether a switch
    /// happened; a clip the mixer lacks is logged and skipped.
    pub fn switch_action<M: AnimationMixer + ?Sized>(&mut self, mixer: &mut M, clip: AnimationClip) -> bool {
        if self.current == Some(clip) {
            return false;
        }
        if !mixer.has_clip(clip) {
            log::warn!("Animation clip '{}' not found in mixer", clip.name());
            return false;
        }

        if let Some(previous) = self.current {
            mixer.fade_out(previous, self.crossfade);
        }
        mixer.reset(clip);
        mixer.fade_in(clip, self.crossfade);
        mixer.play(clip);

        self.current = Some(clip);
        self.generation += 1;
        log::trace!("Animation -> {} (generation {})", clip.name(), self.generation);
        true
    }

    /// Jump clip is current and still playing
    pub fn is_jump_locked<M: AnimationMixer + ?Sized>(&self, mixer: &M) -> bool {
        self.current == Some(AnimationClip::Jump) && mixer.is_running(AnimationClip::Jump)
    }

    /// A one-shot action (spell cast, arrow) is current and still playing
    pub fn is_action_locked<M: AnimationMixer + ?Sized>(&self, mixer: &M) -> bool {
        match self.current {
            Some(clip @ (AnimationClip::SpellCast | AnimationClip::ArrowShoot)) => mixer.is_running(clip),
            _ => false,
        }
    }

    /// Pick the movement clip for this substep
    ///
    /// Does nothing while defeated, jumping, casting, falling, landing or
    /// airborne. Returns whether the clip changed.
    pub fn update_movement<M: AnimationMixer + ?Sized>(&mut self, mixer: &mut M, state: &PlayerState) -> bool {
        if self.defeated || self.is_jump_locked(mixer) || self.is_action_locked(mixer) {
            return false;
        }
        if state.is_falling || state.is_landing || !state.on_ground {
            return false;
        }
        self.switch_action(mixer, movement_clip(state))
    }

    /// Clip to return to once a one-shot is over
    pub fn settle<M: AnimationMixer + ?Sized>(&mut self, mixer: &mut M, state: &PlayerState) -> bool {
        if self.defeated {
            return false;
        }
        let clip = if state.is_falling { AnimationClip::FallingIdle } else { movement_clip(state) };
        self.switch_action(mixer, clip)
    }

    /// Force the defeat clip and lock all further transitions
    pub fn defeat<M: AnimationMixer + ?Sized>(&mut self, mixer: &mut M) {
        if self.defeated {
            return;
        }
        self.switch_action(mixer, AnimationClip::DefeatFall);
        // Even without the clip, deferred work from before the defeat is stale
        if self.current != Some(AnimationClip::DefeatFall) {
            self.generation += 1;
        }
        self.defeated = true;
    }

    /// Lift the defeat lock and return to idle
    pub fn recover<M: AnimationMixer + ?Sized>(&mut self, mixer: &mut M) {
        self.defeated = false;
        self.switch_action(mixer, AnimationClip::Idle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::ClipMixer;
    use botlab_physics::MoveFlags;

    fn grounded() -> PlayerState {
        let mut state = PlayerState::default();
        state.on_ground = true;
        state
    }

    #[test]
    fn test_switch_to_same_clip_is_noop() {
        let mut mixer = ClipMixer::with_default_clips();
        let mut animator = Animator::default();
        assert!(animator.switch_action(&mut mixer, AnimationClip::Idle));
        let generation = animator.generation();

        assert!(!animator.switch_action(&mut mixer, AnimationClip::Idle));
        assert_eq!(animator.generation(), generation);
        assert_eq!(animator.current(), Some(AnimationClip::Idle));
    }

    #[test]
    fn test_switch_bumps_generation() {
        let mut mixer = ClipMixer::with_default_clips();
        let mut animator = Animator::default();
        animator.switch_action(&mut mixer, AnimationClip::Idle);
        animator.switch_action(&mut mixer, AnimationClip::Walk);
        assert_eq!(animator.generation(), 2);
        assert!(mixer.is_running(AnimationClip::Walk));
    }

    #[test]
    fn test_missing_clip_keeps_current() {
        let mut mixer = ClipMixer::new().with_clip(AnimationClip::Idle, 1.0);
        let mut animator = Animator::default();
        animator.switch_action(&mut mixer, AnimationClip::Idle);
        assert!(!animator.switch_action(&mut mixer, AnimationClip::Run));
        assert_eq!(animator.current(), Some(AnimationClip::Idle));
    }

    #[test]
    fn test_movement_selection() {
        let mut mixer = ClipMixer::with_default_clips();
        let mut animator = Animator::default();
        let mut state = grounded();

        animator.update_movement(&mut mixer, &state);
        assert_eq!(animator.current(), Some(AnimationClip::Idle));

        state.set_input(MoveFlags::FORWARD, true);
        animator.update_movement(&mut mixer, &state);
        assert_eq!(animator.current(), Some(AnimationClip::Walk));

        state.set_input(MoveFlags::SPRINT, true);
        animator.update_movement(&mut mixer, &state);
        assert_eq!(animator.current(), Some(AnimationClip::Run));
    }

    #[test]
    fn test_airborne_keeps_clip() {
        let mut mixer = ClipMixer::with_default_clips();
        let mut animator = Animator::default();
        animator.switch_action(&mut mixer, AnimationClip::Walk);

        let state = PlayerState::default();
        assert!(!animator.update_movement(&mut mixer, &state));
        assert_eq!(animator.current(), Some(AnimationClip::Walk));
    }

    #[test]
    fn test_jump_lock() {
        let mut mixer = ClipMixer::with_default_clips();
        let mut animator = Animator::default();
        animator.switch_action(&mut mixer, AnimationClip::Jump);
        assert!(animator.is_jump_locked(&mixer));

        let state = grounded();
        assert!(!animator.update_movement(&mut mixer, &state));
        assert_eq!(animator.current(), Some(AnimationClip::Jump));

        mixer.update(1.0);
        assert!(!animator.is_jump_locked(&mixer));
        assert!(animator.update_movement(&mut mixer, &state));
        assert_eq!(animator.current(), Some(AnimationClip::Idle));
    }

    #[test]
    fn test_spell_blocks_movement() {
        let mut mixer = ClipMixer::with_default_clips();
        let mut animator = Animator::default();
        animator.switch_action(&mut mixer, AnimationClip::SpellCast);
        assert!(animator.is_action_locked(&mixer));
        assert!(!animator.update_movement(&mut mixer, &grounded()));
    }

    #[test]
    fn test_defeat_blocks_everything() {
        let mut mixer = ClipMixer::with_default_clips();
        let mut animator = Animator::default();
        animator.switch_action(&mut mixer, AnimationClip::Idle);
        animator.defeat(&mut mixer);
        assert_eq!(animator.current(), Some(AnimationClip::DefeatFall));

        mixer.update(5.0);
        assert!(!animator.update_movement(&mut mixer, &grounded()));
        assert!(!animator.settle(&mut mixer, &grounded()));
        assert_eq!(animator.current(), Some(AnimationClip::DefeatFall));

        animator.recover(&mut mixer);
        assert!(!animator.is_defeated());
        assert_eq!(animator.current(), Some(AnimationClip::Idle));
    }

    #[test]
    fn test_settle_prefers_falling() {
        let mut mixer = ClipMixer::with_default_clips();
        let mut animator = Animator::default();
        let mut state = PlayerState::default();
        state.is_falling = true;
        animator.settle(&mut mixer, &state);
        assert_eq!(animator.current(), Some(AnimationClip::FallingIdle));
    }
}
