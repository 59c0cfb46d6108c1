//! Animation clips and the mixer interface
//!
//! The core never touches skeletal data. It names clips and drives a
//! mixer through [`AnimationMixer`]; [`ClipMixer`] is a self-contained mixer
//! that tracks time, weights and finished events without any rig.

use std::collections::HashMap;

/// Crossfade used for every clip switch
pub const DEFAULT_CROSSFADE: f32 = 0.2;

/// How a clip behaves when it reaches its end
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClipMode {
    /// Wraps around forever
    Loop,
    /// Plays once and holds the last frame
    OnceHold,
}

/// Every clip the player model provides
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnimationClip {
    Idle,
    Walk,
    Run,
    Jump,
    FallingIdle,
    FallingToLanding,
    SpellCast,
    DefeatFall,
    ArrowShoot,
}

impl AnimationClip {
    pub const ALL: [AnimationClip; 9] = [
        AnimationClip::Idle,
        AnimationClip::Walk,
        AnimationClip::Run,
        AnimationClip::Jump,
        AnimationClip::FallingIdle,
        AnimationClip::FallingToLanding,
        AnimationClip::SpellCast,
        AnimationClip::DefeatFall,
        AnimationClip::ArrowShoot,
    ];

    /// Clip name as exported in the model file
    pub fn name(self) -> &'static str {
        match self {
            AnimationClip::Idle => "Idle",
            AnimationClip::Walk => "Walk",
            AnimationClip::Run => "Run",
            AnimationClip::Jump => "Jump",
            AnimationClip::FallingIdle => "FallingIdle",
            AnimationClip::FallingToLanding => "FallingToLanding",
            AnimationClip::SpellCast => "SpellCast",
            AnimationClip::DefeatFall => "DefeatFall",
            AnimationClip::ArrowShoot => "ArrowShoot",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.name() == name)
    }

    pub fn mode(self) -> ClipMode {
        match self {
            AnimationClip::Idle | AnimationClip::Walk | AnimationClip::Run | AnimationClip::FallingIdle => {
                ClipMode::Loop
            }
            AnimationClip::Jump
            | AnimationClip::FallingToLanding
            | AnimationClip::SpellCast
            | AnimationClip::DefeatFall
            | AnimationClip::ArrowShoot => ClipMode::OnceHold,
        }
    }

    /// Length used when a mixer is built without explicit durations
    pub fn default_duration(self) -> f32 {
        match self {
            AnimationClip::Idle => 2.0,
            AnimationClip::Walk => 1.0,
            AnimationClip::Run => 0.7,
            AnimationClip::Jump => 0.9,
            AnimationClip::FallingIdle => 1.0,
            AnimationClip::FallingToLanding => 0.6,
            AnimationClip::SpellCast => 1.4,
            AnimationClip::DefeatFall => 2.0,
            AnimationClip::ArrowShoot => 1.0,
        }
    }
}

/// Commands the animation state machine issues
///
/// Implementations silently ignore clips they do not have; callers check
/// [`AnimationMixer::has_clip`] first when it matters.
pub trait AnimationMixer {
    /// Advance every track by `dt` seconds
    fn update(&mut self, dt: f32);
    fn has_clip(&self, clip: AnimationClip) -> bool;
    fn play(&mut self, clip: AnimationClip);
    /// Rewind to the start and clear any finished state
    fn reset(&mut self, clip: AnimationClip);
    fn fade_in(&mut self, clip: AnimationClip, duration: f32);
    fn fade_out(&mut self, clip: AnimationClip, duration: f32);
    fn stop(&mut self, clip: AnimationClip);
    /// Playing and not yet at the end of a once-clip
    fn is_running(&self, clip: AnimationClip) -> bool;
    fn duration(&self, clip: AnimationClip) -> Option<f32>;
    /// Drain the once-clips that finished since the last call
    fn take_finished(&mut self) -> Vec<AnimationClip>;
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Fade {
    from: f32,
    to: f32,
    elapsed: f32,
    duration: f32,
}

#[derive(Clone, Debug, PartialEq)]
struct Track {
    duration: f32,
    mode: ClipMode,
    time: f32,
    weight: f32,
    fade: Option<Fade>,
    playing: bool,
    finished: bool,
}

impl Track {
    fn new(duration: f32, mode: ClipMode) -> Self {
        Self {
            duration,
            mode,
            time: 0.0,
            weight: 0.0,
            fade: None,
            playing: false,
            finished: false,
        }
    }

    fn is_running(&self) -> bool {
        self.playing && !self.finished
    }

    /// Returns true the moment a once-clip finishes
    fn advance(&mut self, dt: f32) -> bool {
        if let Some(fade) = self.fade.as_mut() {
            fade.elapsed += dt;
            let t = if fade.duration > 0.0 { (fade.elapsed / fade.duration).min(1.0) } else { 1.0 };
            self.weight = fade.from + (fade.to - fade.from) * t;
            if t >= 1.0 {
                let faded_out = fade.to <= 0.0;
                self.fade = None;
                if faded_out {
                    self.playing = false;
                }
            }
        }

        if !self.is_running() {
            return false;
        }

        self.time += dt;
        match self.mode {
            ClipMode::Loop => {
                if self.duration > 0.0 {
                    self.time %= self.duration;
                }
                false
            }
            ClipMode::OnceHold => {
                if self.time >= self.duration {
                    self.time = self.duration;
                    self.finished = true;
                    true
                } else {
                    false
                }
            }
        }
    }
}

/// Rig-less mixer with per-clip time, weight and crossfades
#[derive(Clone, Debug, Default)]
pub struct ClipMixer {
    tracks: HashMap<AnimationClip, Track>,
    finished: Vec<AnimationClip>,
}

impl ClipMixer {
    /// A mixer with no clips
    pub fn new() -> Self {
        Self::default()
    }

    /// A mixer with every clip at its default duration
    pub fn with_default_clips() -> Self {
        AnimationClip::ALL
            .iter()
            .fold(Self::new(), |mixer, &clip| mixer.with_clip(clip, clip.default_duration()))
    }

    /// Builder: add a clip
    pub fn with_clip(mut self, clip: AnimationClip, duration: f32) -> Self {
        self.add_clip(clip, duration);
        self
    }

    /// Add or replace a clip
    pub fn add_clip(&mut self, clip: AnimationClip, duration: f32) {
        self.tracks.insert(clip, Track::new(duration.max(0.0), clip.mode()));
    }

    /// Current blend weight of a clip (0 when absent)
    pub fn weight(&self, clip: AnimationClip) -> f32 {
        self.tracks.get(&clip).map_or(0.0, |t| t.weight)
    }

    /// Playback position of a clip in seconds
    pub fn time(&self, clip: AnimationClip) -> Option<f32> {
        self.tracks.get(&clip).map(|t| t.time)
    }

    /// Clips with a non-zero weight
    pub fn active_clips(&self) -> Vec<AnimationClip> {
        let mut clips: Vec<AnimationClip> = self
            .tracks
            .iter()
            .filter(|(_, t)| t.weight > 0.0)
            .map(|(c, _)| *c)
            .collect();
        clips.sort_by_key(|c| c.name());
        clips
    }
}

impl AnimationMixer for ClipMixer {
    fn update(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        for (clip, track) in self.tracks.iter_mut() {
            if track.advance(dt) {
                self.finished.push(*clip);
            }
        }
    }

    fn has_clip(&self, clip: AnimationClip) -> bool {
        self.tracks.contains_key(&clip)
    }

    fn play(&mut self, clip: AnimationClip) {
        if let Some(track) = self.tracks.get_mut(&clip) {
            track.playing = true;
        }
    }

    fn reset(&mut self, clip: AnimationClip) {
        if let Some(track) = self.tracks.get_mut(&clip) {
            track.time = 0.0;
            track.finished = false;
            track.fade = None;
        }
    }

    fn fade_in(&mut self, clip: AnimationClip, duration: f32) {
        if let Some(track) = self.tracks.get_mut(&clip) {
            track.weight = 0.0;
            track.fade = Some(Fade { from: 0.0, to: 1.0, elapsed: 0.0, duration });
        }
    }

    fn fade_out(&mut self, clip: AnimationClip, duration: f32) {
        if let Some(track) = self.tracks.get_mut(&clip) {
            track.fade = Some(Fade { from: track.weight, to: 0.0, elapsed: 0.0, duration });
        }
    }

    fn stop(&mut self, clip: AnimationClip) {
        if let Some(track) = self.tracks.get_mut(&clip) {
            track.playing = false;
            track.weight = 0.0;
            track.fade = None;
        }
    }

    fn is_running(&self, clip: AnimationClip) -> bool {
        self.tracks.get(&clip).is_some_and(Track::is_running)
    }

    fn duration(&self, clip: AnimationClip) -> Option<f32> {
        self.tracks.get(&clip).map(|t| t.duration)
    }

    fn take_finished(&mut self) -> Vec<AnimationClip> {
        std::mem::take(&mut self.finished)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 0.0001;

    #[test]
    fn test_clip_modes() {
        assert_eq!(AnimationClip::Idle.mode(), ClipMode::Loop);
        assert_eq!(AnimationClip::FallingIdle.mode(), ClipMode::Loop);
        assert_eq!(AnimationClip::Jump.mode(), ClipMode::OnceHold);
        assert_eq!(AnimationClip::FallingToLanding.mode(), ClipMode::OnceHold);
    }

    #[test]
    fn test_clip_names() {
        for clip in AnimationClip::ALL {
            assert_eq!(AnimationClip::from_name(clip.name()), Some(clip));
        }
        assert_eq!(AnimationClip::from_name("Dance"), None);
    }

    #[test]
    fn test_loop_keeps_running() {
        let mut mixer = ClipMixer::new().with_clip(AnimationClip::Walk, 1.0);
        mixer.play(AnimationClip::Walk);
        mixer.update(2.5);
        assert!(mixer.is_running(AnimationClip::Walk));
        assert!((mixer.time(AnimationClip::Walk).unwrap() - 0.5).abs() < EPSILON);
        assert!(mixer.take_finished().is_empty());
    }

    #[test]
    fn test_once_clip_finishes_and_holds() {
        let mut mixer = ClipMixer::new().with_clip(AnimationClip::Jump, 0.5);
        mixer.play(AnimationClip::Jump);
        mixer.update(0.3);
        assert!(mixer.is_running(AnimationClip::Jump));
        mixer.update(0.3);
        assert!(!mixer.is_running(AnimationClip::Jump));
        assert_eq!(mixer.time(AnimationClip::Jump), Some(0.5));
        assert_eq!(mixer.take_finished(), vec![AnimationClip::Jump]);
        // Finished event is reported once
        mixer.update(0.3);
        assert!(mixer.take_finished().is_empty());
    }

    #[test]
    fn test_reset_replays_once_clip() {
        let mut mixer = ClipMixer::new().with_clip(AnimationClip::SpellCast, 0.2);
        mixer.play(AnimationClip::SpellCast);
        mixer.update(0.5);
        assert!(!mixer.is_running(AnimationClip::SpellCast));

        mixer.reset(AnimationClip::SpellCast);
        mixer.play(AnimationClip::SpellCast);
        assert!(mixer.is_running(AnimationClip::SpellCast));
    }

    #[test]
    fn test_crossfade_weights() {
        let mut mixer = ClipMixer::new()
            .with_clip(AnimationClip::Idle, 2.0)
            .with_clip(AnimationClip::Walk, 1.0);
        mixer.fade_in(AnimationClip::Idle, 0.0);
        mixer.play(AnimationClip::Idle);
        mixer.update(0.01);
        assert_eq!(mixer.weight(AnimationClip::Idle), 1.0);

        mixer.fade_out(AnimationClip::Idle, 0.2);
        mixer.reset(AnimationClip::Walk);
        mixer.fade_in(AnimationClip::Walk, 0.2);
        mixer.play(AnimationClip::Walk);
        mixer.update(0.1);
        assert!((mixer.weight(AnimationClip::Idle) - 0.5).abs() < EPSILON);
        assert!((mixer.weight(AnimationClip::Walk) - 0.5).abs() < EPSILON);

        mixer.update(0.1);
        assert_eq!(mixer.weight(AnimationClip::Walk), 1.0);
        assert_eq!(mixer.weight(AnimationClip::Idle), 0.0);
        assert!(!mixer.is_running(AnimationClip::Idle));
        assert_eq!(mixer.active_clips(), vec![AnimationClip::Walk]);
    }

    #[test]
    fn test_missing_clip_ignored() {
        let mut mixer = ClipMixer::new();
        mixer.play(AnimationClip::Run);
        assert!(!mixer.has_clip(AnimationClip::Run));
        assert!(!mixer.is_running(AnimationClip::Run));
        assert_eq!(mixer.duration(AnimationClip::Run), None);
    }

    #[test]
    fn test_default_clips() {
        let mixer = ClipMixer::with_default_clips();
        for clip in AnimationClip::ALL {
            assert!(mixer.has_clip(clip));
        }
        assert_eq!(mixer.duration(AnimationClip::Jump), Some(0.9));
    }
}
