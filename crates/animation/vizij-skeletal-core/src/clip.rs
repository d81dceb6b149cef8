//! Sampled animation clips.
//!
//! A clip stores one full set of joint poses per frame at a fixed rate. It
//! references its skeleton by id so many clips can share one skeleton.

use serde::Serialize;

use crate::config::Config;
use crate::error::SkeletalError;
use crate::ids::SkeletonId;
use crate::skeleton::Skeleton;
use crate::transform::JointPose;
use crate::Result;

/// One frame: a local pose per joint.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct AnimationSample {
    pub joints: Vec<JointPose>,
}

impl AnimationSample {
    pub fn new(joints: Vec<JointPose>) -> Self {
        Self { joints }
    }
}

impl From<Vec<JointPose>> for AnimationSample {
    fn from(joints: Vec<JointPose>) -> Self {
        Self { joints }
    }
}

/// Immutable, validated clip data.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct AnimationClip {
    name: String,
    skeleton: SkeletonId,
    frames_per_second: f32,
    is_looping: bool,
    samples: Vec<AnimationSample>,
}

impl AnimationClip {
    /// Validate with default tolerances.
    pub fn new(
        name: impl Into<String>,
        skeleton: &Skeleton,
        frames_per_second: f32,
        is_looping: bool,
        samples: Vec<AnimationSample>,
    ) -> Result<Self> {
        Self::with_config(
            name,
            skeleton,
            frames_per_second,
            is_looping,
            samples,
            &Config::default(),
        )
    }

    /// Validate with an explicit config (unit tolerance).
    pub fn with_config(
        name: impl Into<String>,
        skeleton: &Skeleton,
        frames_per_second: f32,
        is_looping: bool,
        samples: Vec<AnimationSample>,
        cfg: &Config,
    ) -> Result<Self> {
        if !frames_per_second.is_finite() || frames_per_second <= 0.0 {
            return Err(SkeletalError::InvalidSampleRate {
                fps: frames_per_second,
            });
        }
        if samples.is_empty() {
            return Err(SkeletalError::DimensionMismatch {
                expected: 1,
                found: 0,
            });
        }
        let joint_count = skeleton.joint_count();
        for (frame, sample) in samples.iter().enumerate() {
            if sample.joints.len() != joint_count {
                return Err(SkeletalError::DimensionMismatch {
                    expected: joint_count,
                    found: sample.joints.len(),
                });
            }
            for (joint, pose) in sample.joints.iter().enumerate() {
                if !pose.has_unit_rotation(cfg.unit_tolerance) {
                    return Err(SkeletalError::NonUnitRotation {
                        frame,
                        joint,
                        length: pose.rotation_length(),
                    });
                }
            }
        }
        Ok(Self {
            name: name.into(),
            skeleton: skeleton.id(),
            frames_per_second,
            is_looping,
            samples,
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn skeleton_id(&self) -> SkeletonId {
        self.skeleton
    }

    #[inline]
    pub fn frames_per_second(&self) -> f32 {
        self.frames_per_second
    }

    #[inline]
    pub fn is_looping(&self) -> bool {
        self.is_looping
    }

    #[inline]
    pub fn frame_count(&self) -> usize {
        self.samples.len()
    }

    /// Joints per frame (equals the skeleton's joint count).
    #[inline]
    pub fn joint_count(&self) -> usize {
        self.samples[0].joints.len()
    }

    #[inline]
    pub fn samples(&self) -> &[AnimationSample] {
        &self.samples
    }

    pub fn sample_at(&self, frame: usize) -> Result<&AnimationSample> {
        self.samples.get(frame).ok_or(SkeletalError::IndexOutOfRange {
            index: frame,
            len: self.samples.len(),
        })
    }

    /// Playback length in seconds.
    ///
    /// Looping clips wrap from the last frame back to the first, so the seam
    /// adds one frame interval: `frame_count / fps`. Non-looping clips end on
    /// the last frame: `(frame_count - 1) / fps`.
    #[inline]
    pub fn duration(&self) -> f32 {
        let n = self.samples.len() as f32;
        if self.is_looping {
            n / self.frames_per_second
        } else {
            (n - 1.0) / self.frames_per_second
        }
    }
}
