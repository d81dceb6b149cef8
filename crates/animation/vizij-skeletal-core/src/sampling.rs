//! Clip sampling: clip-local time → interpolated Pose.
//!
//! Model:
//! - Looping clips wrap `t` into `[0, frame_count / fps)`; the frame after the
//!   last is frame 0, so the seam is not a duplicated frame. Negative times
//!   wrap (floor-based, not truncation).
//! - Non-looping clips clamp `t` into `[0, (frame_count - 1) / fps]` and hold
//!   the boundary frame outside that range.
//! - The fractional frame `f = t * fps` selects a bracketing pair; each joint
//!   lerps translation/scale and slerps rotation along the shortest arc.

use log::warn;

use crate::clip::AnimationClip;
use crate::error::SkeletalError;
use crate::interp::functions::interpolate_joint_pose;
use crate::pose::Pose;
use crate::Result;

/// Bracketing frames and blend factor for clip-local time `t`.
/// Returns `(i0, i1, alpha)` with `alpha ∈ [0, 1]`.
fn find_frames(clip: &AnimationClip, t: f32) -> (usize, usize, f32) {
    let n = clip.frame_count();
    if n == 1 {
        return (0, 0, 0.0);
    }
    let fps = clip.frames_per_second();
    let duration = clip.duration();

    if clip.is_looping() {
        let mut wrapped = t - duration * (t / duration).floor();
        // Rounding can land exactly on the period.
        if wrapped >= duration || wrapped < 0.0 {
            wrapped = 0.0;
        }
        let f = wrapped * fps;
        let i0 = (f.floor() as usize).min(n - 1);
        let alpha = (f - i0 as f32).clamp(0.0, 1.0);
        (i0, (i0 + 1) % n, alpha)
    } else {
        if t >= duration {
            return (n - 1, n - 1, 0.0);
        }
        if t <= 0.0 {
            return (0, 0, 0.0);
        }
        let f = t * fps;
        let i0 = (f.floor() as usize).min(n - 1);
        let i1 = (i0 + 1).min(n - 1);
        let alpha = if i0 == i1 {
            0.0
        } else {
            (f - i0 as f32).clamp(0.0, 1.0)
        };
        (i0, i1, alpha)
    }
}

#[inline]
fn sanitize_time(t: f32) -> f32 {
    if t.is_finite() {
        t
    } else {
        warn!("non-finite sample time {t}; sampling at 0");
        0.0
    }
}

/// Sample `clip` at clip-local time `t` (seconds) into a new Pose.
pub fn sample(clip: &AnimationClip, t: f32) -> Pose {
    let t = sanitize_time(t);
    let (i0, i1, alpha) = find_frames(clip, t);
    let a = &clip.samples()[i0].joints;
    let b = &clip.samples()[i1].joints;
    let locals = a
        .iter()
        .zip(b)
        .map(|(ja, jb)| interpolate_joint_pose(ja, jb, alpha))
        .collect();
    Pose::from_locals(clip.skeleton_id(), locals)
}

/// Sample into an existing pose, reusing its storage.
pub fn sample_into(clip: &AnimationClip, t: f32, out: &mut Pose) -> Result<()> {
    if out.skeleton_id() != clip.skeleton_id() {
        return Err(SkeletalError::SkeletonMismatch {
            expected: clip.skeleton_id(),
            found: out.skeleton_id(),
        });
    }
    if out.joint_count() != clip.joint_count() {
        return Err(SkeletalError::DimensionMismatch {
            expected: clip.joint_count(),
            found: out.joint_count(),
        });
    }
    let t = sanitize_time(t);
    let (i0, i1, alpha) = find_frames(clip, t);
    let a = &clip.samples()[i0].joints;
    let b = &clip.samples()[i1].joints;
    for ((dst, ja), jb) in out.locals_mut().iter_mut().zip(a).zip(b) {
        *dst = interpolate_joint_pose(ja, jb, alpha);
    }
    Ok(())
}

/// Sample at normalized time `u`, where `u = 1` is one full clip duration.
/// Lets clips of different lengths be driven from one shared phase.
pub fn sample_normalized(clip: &AnimationClip, u: f32) -> Pose {
    sample(clip, u * clip.duration())
}
