//! Timeline mapping: a character's global clock → clip-local time.
//!
//! Each playing clip instance carries its own `PlaybackState`. The caller
//! owns it and threads the current global time `τ` through every call; there
//! is no ambient clock. Raw local time is `t = (τ - τ_start) * rate`.
//!
//! Phases: `Scheduled → Playing` once `τ ≥ τ_start` (regardless of the sign of
//! `rate`), `Playing → Finished` once a non-looping clip has used up its
//! repetitions. Looping clips stay `Playing`.
//! `Finished` is terminal until [`PlaybackState::reset`].

use log::debug;
use serde::{Deserialize, Serialize};

use crate::clip::AnimationClip;
use crate::ids::ClipId;

/// How many passes through the clip to play.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Repetitions {
    /// Never finishes.
    Infinite,
    /// Finishes after `n` full passes.
    Count(u32),
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum PlaybackPhase {
    Scheduled,
    Playing,
    Finished,
}

/// Result of mapping one global time through a playback state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimelineSample {
    pub phase: PlaybackPhase,
    /// Raw mapped time `(τ - τ_start) * rate`, not wrapped or clamped.
    pub raw_time: f32,
    /// Clip-local time to hand to the sampler.
    pub local_time: f32,
    /// `local_time / duration`, wrapped into [0,1) for looping clips and
    /// clamped to [0,1] otherwise.
    pub normalized_time: f32,
    /// Blend weight this instance contributes (0 unless playing).
    pub effective_weight: f32,
}

/// Per clip-instance playback controls, owned by the caller.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PlaybackState {
    pub clip: ClipId,
    /// Global activation time `τ_start`.
    pub start_time: f32,
    /// Signed playback rate; negative plays in reverse.
    pub rate: f32,
    weight: f32,
    /// Passes of a non-looping clip; `None` plays it once. Looping clips
    /// ignore this and play until stopped.
    pub repetitions: Option<Repetitions>,
    phase: PlaybackPhase,
}

impl PlaybackState {
    pub fn new(clip: ClipId, start_time: f32) -> Self {
        Self {
            clip,
            start_time,
            rate: 1.0,
            weight: 1.0,
            repetitions: None,
            phase: PlaybackPhase::Scheduled,
        }
    }

    pub fn with_rate(mut self, rate: f32) -> Self {
        self.rate = rate;
        self
    }

    pub fn with_weight(mut self, weight: f32) -> Self {
        self.set_weight(weight);
        self
    }

    pub fn with_repetitions(mut self, repetitions: Repetitions) -> Self {
        self.repetitions = Some(repetitions);
        self
    }

    #[inline]
    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    #[inline]
    pub fn weight(&self) -> f32 {
        self.weight
    }

    /// Set the blend weight, clamped into [0,1]. NaN becomes 0.
    pub fn set_weight(&mut self, weight: f32) {
        self.weight = if weight.is_nan() {
            0.0
        } else {
            weight.clamp(0.0, 1.0)
        };
    }

    pub fn set_rate(&mut self, rate: f32) {
        self.rate = rate;
    }

    /// Back to `Scheduled`, keeping the start time.
    pub fn reset(&mut self) {
        self.phase = PlaybackPhase::Scheduled;
    }

    /// Reschedule to start at `start_time`.
    pub fn restart_at(&mut self, start_time: f32) {
        self.start_time = start_time;
        self.reset();
    }

    /// Weight contributed to blending; zero unless playing.
    #[inline]
    pub fn effective_weight(&self) -> f32 {
        match self.phase {
            PlaybackPhase::Playing => self.weight,
            PlaybackPhase::Scheduled | PlaybackPhase::Finished => 0.0,
        }
    }

    /// `(τ - τ_start) * rate` with no phase handling.
    #[inline]
    pub fn raw_local_time(&self, global_time: f32) -> f32 {
        (global_time - self.start_time) * self.rate
    }

    /// Number of passes after which playback finishes. Looping clips never
    /// finish, whatever the repetition count.
    fn pass_limit(&self, clip: &AnimationClip) -> Option<u32> {
        if clip.is_looping() {
            return None;
        }
        match self.repetitions {
            Some(Repetitions::Infinite) => None,
            Some(Repetitions::Count(n)) => Some(n),
            None => Some(1),
        }
    }

    fn transition(&mut self, to: PlaybackPhase, global_time: f32) {
        debug!(
            "playback {:?}: {:?} -> {:?} at τ={global_time}",
            self.clip, self.phase, to
        );
        self.phase = to;
    }

    /// Map `global_time` for `clip`, advancing the phase machine.
    pub fn advance(&mut self, clip: &AnimationClip, global_time: f32) -> TimelineSample {
        if self.phase == PlaybackPhase::Scheduled && global_time >= self.start_time {
            self.transition(PlaybackPhase::Playing, global_time);
        }

        let duration = clip.duration();
        // A clock that steps back before the start holds the start.
        let raw_time = (global_time - self.start_time).max(0.0) * self.rate;

        if self.phase == PlaybackPhase::Playing {
            if let Some(limit) = self.pass_limit(clip) {
                let elapsed = if duration > 0.0 {
                    raw_time.abs() / duration
                } else {
                    f32::INFINITY
                };
                if elapsed >= limit as f32 {
                    self.transition(PlaybackPhase::Finished, global_time);
                }
            }
        }

        let local_time = match self.phase {
            PlaybackPhase::Scheduled => {
                if self.rate < 0.0 {
                    duration
                } else {
                    0.0
                }
            }
            PlaybackPhase::Finished => {
                if self.rate < 0.0 {
                    0.0
                } else {
                    duration
                }
            }
            PlaybackPhase::Playing => self.pass_time(clip, raw_time),
        };

        TimelineSample {
            phase: self.phase,
            raw_time,
            local_time,
            normalized_time: normalize(clip, local_time, self.phase),
            effective_weight: self.effective_weight(),
        }
    }

    /// Clip-local time within the current pass while playing.
    fn pass_time(&self, clip: &AnimationClip, raw_time: f32) -> f32 {
        let duration = clip.duration();
        if clip.is_looping() {
            // The sampler wraps; reverse time wraps to the clip end.
            return raw_time;
        }
        if duration <= 0.0 {
            return 0.0;
        }
        let pass = raw_time.abs() % duration;
        if self.rate < 0.0 {
            duration - pass
        } else {
            pass
        }
    }

    /// Normalized time `u` for `global_time` without changing the phase.
    pub fn normalized_time(&self, clip: &AnimationClip, global_time: f32) -> f32 {
        let mut probe = self.clone();
        probe.advance(clip, global_time).normalized_time
    }
}

fn normalize(clip: &AnimationClip, local_time: f32, phase: PlaybackPhase) -> f32 {
    let duration = clip.duration();
    if duration <= 0.0 {
        return if phase == PlaybackPhase::Finished {
            1.0
        } else {
            0.0
        };
    }
    let u = local_time / duration;
    if clip.is_looping() && phase != PlaybackPhase::Finished {
        u.rem_euclid(1.0)
    } else {
        u.clamp(0.0, 1.0)
    }
}
