//! Engine: data ownership and the per-tick pipeline.
//!
//! Methods:
//! - add_skeleton / add_clip (or their JSON loaders), create_character, play
//! - update: timeline mapping → clip sampling → blending, per character
//! - sample_synced: normalized-time sampling of several clips from one phase

use glam::Mat4;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::blend::blend_with_epsilon;
use crate::clip::{AnimationClip, AnimationSample};
use crate::config::Config;
use crate::error::SkeletalError;
use crate::ids::{CharacterId, ClipId, IdAllocator, PlaybackId, SkeletonId};
use crate::pose::Pose;
use crate::sampling::{sample_into, sample_normalized};
use crate::skeleton::{Joint, Skeleton};
use crate::stored::{parse_stored_clip_json_with_config, parse_stored_skeleton_json};
use crate::timeline::{PlaybackPhase, PlaybackState, Repetitions, TimelineSample};
use crate::Result;

/// Configuration for starting a clip on a character.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlaybackCfg {
    pub start_time: f32,
    pub rate: f32,
    pub weight: f32,
    pub repetitions: Option<Repetitions>,
}

impl Default for PlaybackCfg {
    fn default() -> Self {
        Self {
            start_time: 0.0,
            rate: 1.0,
            weight: 1.0,
            repetitions: None,
        }
    }
}

/// Per-character controller: its skeleton, active playbacks and last pose.
#[derive(Debug)]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    pub skeleton: SkeletonId,
    pub playbacks: Vec<PlaybackId>,
    pose: Pose,
    /// Reused per-playback sample buffers.
    scratch: Vec<Pose>,
    globals: Vec<Mat4>,
}

impl Character {
    /// Most recent blended pose (bind pose before the first update).
    pub fn pose(&self) -> &Pose {
        &self.pose
    }
}

#[derive(Debug)]
struct Playback {
    id: PlaybackId,
    character: CharacterId,
    state: PlaybackState,
}

/// Engine (core) owning skeletons, clips, characters and playback states.
#[derive(Debug)]
pub struct Engine {
    cfg: Config,
    ids: IdAllocator,
    skeletons: Vec<Skeleton>,
    clips: Vec<(ClipId, AnimationClip)>,
    characters: Vec<Character>,
    playbacks: Vec<Playback>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Engine {
    /// Create a new engine with the given config.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            ids: IdAllocator::default(),
            skeletons: Vec::new(),
            clips: Vec::new(),
            characters: Vec::new(),
            playbacks: Vec::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Validate and store a joint hierarchy.
    pub fn add_skeleton(&mut self, joints: Vec<Joint>) -> Result<SkeletonId> {
        let id = self.ids.skeletons.next_id();
        let skeleton = Skeleton::new(id, joints)?;
        debug!("skeleton {:?} loaded ({} joints)", id, skeleton.joint_count());
        self.skeletons.push(skeleton);
        Ok(id)
    }

    /// Parse and store a skeleton from stored JSON text.
    pub fn load_skeleton_json(&mut self, json: &str) -> Result<SkeletonId> {
        let id = self.ids.skeletons.next_id();
        let skeleton = parse_stored_skeleton_json(json, id)?;
        debug!("skeleton {:?} parsed ({} joints)", id, skeleton.joint_count());
        self.skeletons.push(skeleton);
        Ok(id)
    }

    pub fn skeleton(&self, id: SkeletonId) -> Result<&Skeleton> {
        self.skeletons
            .iter()
            .find(|s| s.id() == id)
            .ok_or(SkeletalError::UnknownSkeleton(id))
    }

    /// Validate and store a clip for `skeleton`.
    pub fn add_clip(
        &mut self,
        name: &str,
        skeleton: SkeletonId,
        frames_per_second: f32,
        is_looping: bool,
        samples: Vec<AnimationSample>,
    ) -> Result<ClipId> {
        let skel = self.skeleton(skeleton)?;
        let clip =
            AnimationClip::with_config(name, skel, frames_per_second, is_looping, samples, &self.cfg)?;
        Ok(self.insert_clip(clip))
    }

    /// Parse and store a clip from stored JSON text.
    pub fn load_clip_json(&mut self, json: &str, skeleton: SkeletonId) -> Result<ClipId> {
        let skel = self.skeleton(skeleton)?;
        let clip = parse_stored_clip_json_with_config(json, skel, &self.cfg)?;
        Ok(self.insert_clip(clip))
    }

    fn insert_clip(&mut self, clip: AnimationClip) -> ClipId {
        let id = self.ids.clips.next_id();
        debug!(
            "clip {:?} '{}' loaded ({} frames @ {} fps, looping={})",
            id,
            clip.name(),
            clip.frame_count(),
            clip.frames_per_second(),
            clip.is_looping()
        );
        self.clips.push((id, clip));
        id
    }

    pub fn clip(&self, id: ClipId) -> Result<&AnimationClip> {
        self.clips
            .iter()
            .find_map(|(c, data)| if *c == id { Some(data) } else { None })
            .ok_or(SkeletalError::UnknownClip(id))
    }

    /// Create a character bound to `skeleton`, starting in bind pose.
    pub fn create_character(&mut self, name: &str, skeleton: SkeletonId) -> Result<CharacterId> {
        let skel = self.skeleton(skeleton)?;
        let pose = Pose::bind(skel);
        let id = self.ids.characters.next_id();
        self.characters.push(Character {
            id,
            name: name.to_string(),
            skeleton,
            playbacks: Vec::new(),
            pose,
            scratch: Vec::new(),
            globals: Vec::with_capacity(self.cfg.scratch_joints),
        });
        Ok(id)
    }

    pub fn character(&self, id: CharacterId) -> Result<&Character> {
        self.characters
            .iter()
            .find(|c| c.id == id)
            .ok_or(SkeletalError::UnknownCharacter(id))
    }

    fn character_index(&self, id: CharacterId) -> Result<usize> {
        self.characters
            .iter()
            .position(|c| c.id == id)
            .ok_or(SkeletalError::UnknownCharacter(id))
    }

    /// Schedule `clip` on `character`. The clip must target the character's skeleton.
    pub fn play(
        &mut self,
        character: CharacterId,
        clip: ClipId,
        cfg: PlaybackCfg,
    ) -> Result<PlaybackId> {
        let idx = self.character_index(character)?;
        let clip_skeleton = self.clip(clip)?.skeleton_id();
        let skeleton = self.characters[idx].skeleton;
        if clip_skeleton != skeleton {
            return Err(SkeletalError::SkeletonMismatch {
                expected: skeleton,
                found: clip_skeleton,
            });
        }

        let mut state = PlaybackState::new(clip, cfg.start_time)
            .with_rate(cfg.rate)
            .with_weight(cfg.weight);
        state.repetitions = cfg.repetitions;

        let id = self.ids.playbacks.next_id();
        self.playbacks.push(Playback {
            id,
            character,
            state,
        });
        self.characters[idx].playbacks.push(id);
        Ok(id)
    }

    pub fn playback(&self, id: PlaybackId) -> Result<&PlaybackState> {
        self.playbacks
            .iter()
            .find(|p| p.id == id)
            .map(|p| &p.state)
            .ok_or(SkeletalError::UnknownPlayback(id))
    }

    /// Mutable access for gameplay-side changes (weight, rate, reset).
    pub fn playback_mut(&mut self, id: PlaybackId) -> Result<&mut PlaybackState> {
        self.playbacks
            .iter_mut()
            .find(|p| p.id == id)
            .map(|p| &mut p.state)
            .ok_or(SkeletalError::UnknownPlayback(id))
    }

    /// Remove a playback from its character.
    pub fn stop(&mut self, id: PlaybackId) -> Result<()> {
        let pos = self
            .playbacks
            .iter()
            .position(|p| p.id == id)
            .ok_or(SkeletalError::UnknownPlayback(id))?;
        let removed = self.playbacks.remove(pos);
        if let Some(c) = self
            .characters
            .iter_mut()
            .find(|c| c.id == removed.character)
        {
            c.playbacks.retain(|p| *p != id);
        }
        Ok(())
    }

    /// Drop every finished playback of `character`, returning their ids.
    pub fn prune_finished(&mut self, character: CharacterId) -> Result<Vec<PlaybackId>> {
        let idx = self.character_index(character)?;
        let finished: Vec<PlaybackId> = self
            .playbacks
            .iter()
            .filter(|p| p.character == character && p.state.phase() == PlaybackPhase::Finished)
            .map(|p| p.id)
            .collect();
        self.playbacks.retain(|p| !finished.contains(&p.id));
        self.characters[idx]
            .playbacks
            .retain(|p| !finished.contains(p));
        Ok(finished)
    }

    /// Run one tick for `character` at global time `global_time`.
    ///
    /// Each playback maps the clock to clip time, playing clips are sampled,
    /// and the samples are blended by effective weight. Fails with
    /// `DegenerateBlend` when nothing is playing.
    pub fn update(&mut self, character: CharacterId, global_time: f32) -> Result<&Pose> {
        let idx = self.character_index(character)?;
        let ch = &mut self.characters[idx];
        let skeleton = self
            .skeletons
            .iter()
            .find(|s| s.id() == ch.skeleton)
            .ok_or(SkeletalError::UnknownSkeleton(ch.skeleton))?;

        let mut weights: Vec<f32> = Vec::with_capacity(ch.playbacks.len());
        for pid in &ch.playbacks {
            let playback = self
                .playbacks
                .iter_mut()
                .find(|p| p.id == *pid)
                .ok_or(SkeletalError::UnknownPlayback(*pid))?;
            let clip = self
                .clips
                .iter()
                .find_map(|(c, data)| if *c == playback.state.clip { Some(data) } else { None })
                .ok_or(SkeletalError::UnknownClip(playback.state.clip))?;

            let ts: TimelineSample = playback.state.advance(clip, global_time);
            if ts.effective_weight <= 0.0 {
                continue;
            }
            let slot = weights.len();
            if ch.scratch.len() <= slot {
                ch.scratch.push(Pose::bind(skeleton));
            }
            sample_into(clip, ts.local_time, &mut ch.scratch[slot])?;
            weights.push(ts.effective_weight);
        }

        if weights.is_empty() {
            warn!(
                "character {:?}: no playing clips at τ={global_time}",
                ch.id
            );
            return Err(SkeletalError::DegenerateBlend { total_weight: 0.0 });
        }

        let inputs: Vec<(&Pose, f32)> = ch.scratch.iter().zip(weights).collect();
        let blended = blend_with_epsilon(&inputs, self.cfg.blend_epsilon).map_err(|e| {
            warn!("character {:?}: blend failed: {e}", ch.id);
            e
        })?;
        ch.pose = blended;
        Ok(&ch.pose)
    }

    /// Sample several clips at one shared normalized time `u` and blend them.
    ///
    /// Clip lengths need not match; each clip is sampled at `u * duration`.
    pub fn sample_synced(
        &self,
        character: CharacterId,
        clips: &[(ClipId, f32)],
        u: f32,
    ) -> Result<Pose> {
        let skeleton = self.character(character)?.skeleton;
        let mut poses: Vec<(Pose, f32)> = Vec::with_capacity(clips.len());
        for (clip_id, weight) in clips {
            let clip = self.clip(*clip_id)?;
            if clip.skeleton_id() != skeleton {
                return Err(SkeletalError::SkeletonMismatch {
                    expected: skeleton,
                    found: clip.skeleton_id(),
                });
            }
            poses.push((sample_normalized(clip, u), *weight));
        }
        let inputs: Vec<(&Pose, f32)> = poses.iter().map(|(p, w)| (p, *w)).collect();
        blend_with_epsilon(&inputs, self.cfg.blend_epsilon)
    }

    /// Model-space transforms of the character's current pose.
    pub fn global_transforms(&mut self, character: CharacterId) -> Result<&[Mat4]> {
        let idx = self.character_index(character)?;
        let ch = &mut self.characters[idx];
        let skeleton = self
            .skeletons
            .iter()
            .find(|s| s.id() == ch.skeleton)
            .ok_or(SkeletalError::UnknownSkeleton(ch.skeleton))?;
        ch.pose.global_transforms_into(skeleton, &mut ch.globals)?;
        Ok(&ch.globals)
    }

    /// Skinning matrices (`global * inverse_bind_pose`) of the current pose.
    pub fn skinning_matrices(&self, character: CharacterId) -> Result<Vec<Mat4>> {
        let ch = self.character(character)?;
        let skeleton = self.skeleton(ch.skeleton)?;
        ch.pose.skinning_matrices(skeleton)
    }
}
