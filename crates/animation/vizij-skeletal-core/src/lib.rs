//! Vizij Skeletal Core (engine-agnostic)
//!
//! Joint hierarchies, local/global pose composition, sampled clips, and the
//! clock mapping that turns a character's global time into blended poses.
//! Data flows leaf-first: `Skeleton` → `Pose` → `AnimationClip` → `sampling`
//! → `timeline` → `blend`, with `Engine` wiring the per-tick pipeline.

pub mod blend;
pub mod clip;
pub mod config;
pub mod engine;
pub mod error;
pub mod ids;
pub mod interp;
pub mod pose;
pub mod sampling;
pub mod skeleton;
pub mod stored;
pub mod timeline;
pub mod transform;

// Re-exports for consumers (adapters)
pub use blend::{blend, blend_with_epsilon, cross_fade};
pub use clip::{AnimationClip, AnimationSample};
pub use config::Config;
pub use engine::{Character, Engine, PlaybackCfg};
pub use error::SkeletalError;
pub use ids::{CharacterId, ClipId, PlaybackId, SkeletonId};
pub use pose::Pose;
pub use sampling::{sample, sample_into, sample_normalized};
pub use skeleton::{compute_inverse_bind_poses, Joint, Skeleton};
pub use stored::{parse_stored_clip_json, parse_stored_skeleton_json};
pub use timeline::{PlaybackPhase, PlaybackState, Repetitions, TimelineSample};
pub use transform::JointPose;

pub use glam::{Mat4, Quat, Vec3};

/// Result type used throughout the skeletal core.
pub type Result<T> = std::result::Result<T, SkeletalError>;
