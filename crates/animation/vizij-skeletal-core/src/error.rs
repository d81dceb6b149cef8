//! Error types for skeleton, pose, clip and blending operations.

use serde::{Deserialize, Serialize};

use crate::ids::{CharacterId, ClipId, PlaybackId, SkeletonId};

/// Validation failures surfaced synchronously to the caller.
///
/// All variants describe malformed input; nothing here is transient.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum SkeletalError {
    /// Joint list violates parent-before-child ordering or root rules.
    #[error("Invalid hierarchy at joint {joint}: {reason}")]
    InvalidHierarchy { joint: usize, reason: String },

    /// Joint lookup past the end of the skeleton.
    #[error("Index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// Per-joint array length does not match the skeleton.
    #[error("Dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// Clip sample rate must be finite and > 0.
    #[error("Invalid sample rate: {fps}")]
    InvalidSampleRate { fps: f32 },

    /// Operands are bound to different skeletons.
    #[error("Skeleton mismatch: expected {expected:?}, found {found:?}")]
    SkeletonMismatch {
        expected: SkeletonId,
        found: SkeletonId,
    },

    /// Blend weights sum to (nearly) zero.
    #[error("Degenerate blend: total weight {total_weight}")]
    DegenerateBlend { total_weight: f32 },

    /// Authored rotation is not a unit quaternion.
    #[error("Non-unit rotation at frame {frame}, joint {joint} (length {length})")]
    NonUnitRotation {
        frame: usize,
        joint: usize,
        length: f32,
    },

    /// Blend weight is negative or not finite.
    #[error("Invalid weight {weight} at input {index}")]
    InvalidWeight { index: usize, weight: f32 },

    #[error("Unknown skeleton: {0:?}")]
    UnknownSkeleton(SkeletonId),

    #[error("Unknown clip: {0:?}")]
    UnknownClip(ClipId),

    #[error("Unknown character: {0:?}")]
    UnknownCharacter(CharacterId),

    #[error("Unknown playback: {0:?}")]
    UnknownPlayback(PlaybackId),

    /// Stored JSON could not be parsed.
    #[error("Parse error: {reason}")]
    Parse { reason: String },
}

impl SkeletalError {
    /// Every condition in this crate is recoverable by the caller.
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        true
    }

    /// Get error category for logging.
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidHierarchy { .. } | Self::IndexOutOfRange { .. } => "hierarchy",
            Self::DimensionMismatch { .. }
            | Self::InvalidSampleRate { .. }
            | Self::NonUnitRotation { .. } => "validation",
            Self::SkeletonMismatch { .. }
            | Self::DegenerateBlend { .. }
            | Self::InvalidWeight { .. } => "blend",
            Self::UnknownSkeleton(_)
            | Self::UnknownClip(_)
            | Self::UnknownCharacter(_)
            | Self::UnknownPlayback(_) => "lookup",
            Self::Parse { .. } => "serialization",
        }
    }
}

impl From<serde_json::Error> for SkeletalError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories() {
        let err = SkeletalError::IndexOutOfRange { index: 4, len: 2 };
        assert_eq!(err.category(), "hierarchy");
        assert!(err.is_recoverable());

        let err = SkeletalError::DegenerateBlend { total_weight: 0.0 };
        assert_eq!(err.category(), "blend");
    }

    #[test]
    fn display_includes_fields() {
        let err = SkeletalError::DimensionMismatch {
            expected: 3,
            found: 2,
        };
        assert_eq!(err.to_string(), "Dimension mismatch: expected 3, found 2");
    }

    #[test]
    fn json_errors_convert() {
        let raw = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: SkeletalError = raw.into();
        assert_eq!(err.category(), "serialization");
    }
}
