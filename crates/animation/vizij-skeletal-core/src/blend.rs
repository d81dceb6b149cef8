//! Weighted blending of sampled poses.
//!
//! Weights are normalized by their sum. Translation and scale are weighted
//! means. Rotation is a left-to-right SLERP fold over the inputs sorted by
//! descending weight (stable, so ties keep input order):
//! `acc = slerp(acc, q_k, w_k / W_k)` where `W_k` is the running weight sum.
//! For two inputs this is exactly `slerp(q_a, q_b, w_b)`.

use glam::Vec3;

use crate::config::Config;
use crate::error::SkeletalError;
use crate::interp::functions::{lerp_f32, slerp_quat};
use crate::pose::Pose;
use crate::transform::JointPose;
use crate::Result;

/// Blend with the default degenerate-weight epsilon.
pub fn blend(inputs: &[(&Pose, f32)]) -> Result<Pose> {
    blend_with_epsilon(inputs, Config::default().blend_epsilon)
}

/// Blend `(pose, weight)` pairs. All poses must share one skeleton.
pub fn blend_with_epsilon(inputs: &[(&Pose, f32)], epsilon: f32) -> Result<Pose> {
    let Some((first, _)) = inputs.first() else {
        return Err(SkeletalError::DegenerateBlend { total_weight: 0.0 });
    };
    let skeleton = first.skeleton_id();
    let joint_count = first.joint_count();

    let mut total = 0.0f32;
    for (index, (pose, weight)) in inputs.iter().enumerate() {
        if pose.skeleton_id() != skeleton {
            return Err(SkeletalError::SkeletonMismatch {
                expected: skeleton,
                found: pose.skeleton_id(),
            });
        }
        if pose.joint_count() != joint_count {
            return Err(SkeletalError::DimensionMismatch {
                expected: joint_count,
                found: pose.joint_count(),
            });
        }
        if !weight.is_finite() || *weight < 0.0 {
            return Err(SkeletalError::InvalidWeight {
                index,
                weight: *weight,
            });
        }
        total += weight;
    }
    if total <= epsilon {
        return Err(SkeletalError::DegenerateBlend {
            total_weight: total,
        });
    }

    let weights: Vec<f32> = inputs.iter().map(|(_, w)| w / total).collect();
    let mut order: Vec<usize> = (0..inputs.len()).collect();
    order.sort_by(|&a, &b| weights[b].total_cmp(&weights[a]));

    let mut locals = Vec::with_capacity(joint_count);
    for joint in 0..joint_count {
        let mut translation = Vec3::ZERO;
        let mut scale = Vec3::ZERO;
        for ((pose, _), w) in inputs.iter().zip(&weights) {
            let local = &pose.locals()[joint];
            translation += local.translation * *w;
            scale += local.scale * *w;
        }

        let lead = order[0];
        let mut rotation = inputs[lead].0.locals()[joint].rotation;
        let mut running = weights[lead];
        for &k in &order[1..] {
            let w = weights[k];
            if w <= 0.0 {
                continue;
            }
            running += w;
            rotation = slerp_quat(rotation, inputs[k].0.locals()[joint].rotation, w / running);
        }

        locals.push(JointPose {
            scale,
            rotation,
            translation,
        });
    }

    Ok(Pose::from_locals(skeleton, locals))
}

/// Two-way cross-fade: `alpha = 0` is `from`, `alpha = 1` is `to`.
pub fn cross_fade(from: &Pose, to: &Pose, alpha: f32) -> Result<Pose> {
    let alpha = if alpha.is_nan() {
        0.0
    } else {
        alpha.clamp(0.0, 1.0)
    };
    blend(&[(from, lerp_f32(1.0, 0.0, alpha)), (to, alpha)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SkeletonId;
    use glam::Quat;
    use std::f32::consts::FRAC_PI_2;

    fn single(id: u32, pose: JointPose) -> Pose {
        Pose::from_locals(SkeletonId(id), vec![pose])
    }

    #[test]
    fn two_way_rotation_is_slerp() {
        let a = single(0, JointPose::IDENTITY);
        let b = single(0, JointPose::from_rotation(Quat::from_rotation_z(FRAC_PI_2)));
        let out = blend(&[(&a, 3.0), (&b, 1.0)]).unwrap();
        let expected = Quat::from_rotation_z(FRAC_PI_2 * 0.25);
        assert!(out.locals()[0].rotation.abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn translation_is_weighted_mean() {
        let a = single(0, JointPose::from_translation(Vec3::ZERO));
        let b = single(0, JointPose::from_translation(Vec3::new(4.0, 0.0, 0.0)));
        let out = blend(&[(&a, 1.0), (&b, 3.0)]).unwrap();
        assert!((out.locals()[0].translation.x - 3.0).abs() < 1e-6);
        assert!(out.locals()[0].scale.abs_diff_eq(Vec3::ONE, 1e-6));
    }

    #[test]
    fn zero_weights_are_degenerate() {
        let a = single(0, JointPose::IDENTITY);
        assert!(matches!(
            blend(&[(&a, 0.0), (&a, 0.0)]),
            Err(SkeletalError::DegenerateBlend { .. })
        ));
        assert!(matches!(
            blend(&[]),
            Err(SkeletalError::DegenerateBlend { .. })
        ));
    }

    #[test]
    fn negative_weight_rejected() {
        let a = single(0, JointPose::IDENTITY);
        assert_eq!(
            blend(&[(&a, 1.0), (&a, -0.5)]).unwrap_err(),
            SkeletalError::InvalidWeight {
                index: 1,
                weight: -0.5
            }
        );
    }

    #[test]
    fn mixed_skeletons_rejected() {
        let a = single(0, JointPose::IDENTITY);
        let b = single(1, JointPose::IDENTITY);
        assert!(matches!(
            blend(&[(&a, 1.0), (&b, 1.0)]),
            Err(SkeletalError::SkeletonMismatch { .. })
        ));
    }

    #[test]
    fn cross_fade_endpoints() {
        let a = single(0, JointPose::from_translation(Vec3::X));
        let b = single(0, JointPose::from_translation(Vec3::Y));
        assert_eq!(cross_fade(&a, &b, 0.0).unwrap().locals()[0].translation, Vec3::X);
        assert_eq!(cross_fade(&a, &b, 1.0).unwrap().locals()[0].translation, Vec3::Y);
        assert_eq!(cross_fade(&a, &b, 7.0).unwrap().locals()[0].translation, Vec3::Y);
    }
}
