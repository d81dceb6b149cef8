//! Interpolation helpers:
//! - lerp_f32 / lerp_vec3 (component-wise)
//! - slerp_quat (spherical, shortest arc)
//! - interpolate_joint_pose (TRS: lerp translation/scale, slerp rotation)

use glam::{Quat, Vec3};

use crate::transform::JointPose;

/// Below this angle between inputs SLERP degenerates; fall back to NLERP.
const SLERP_DOT_THRESHOLD: f32 = 0.9995;

/// Linear interpolation of scalars.
#[inline]
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
pub fn lerp_vec3(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    Vec3::new(
        lerp_f32(a.x, b.x, t),
        lerp_f32(a.y, b.y, t),
        lerp_f32(a.z, b.z, t),
    )
}

/// Quaternion SLERP with shortest-arc correction.
/// If dot < 0, negate the second quaternion so `q` and `-q` interpolate
/// identically. Inputs are expected to be unit length.
#[inline]
pub fn slerp_quat(a: Quat, b: Quat, t: f32) -> Quat {
    let mut b = b;
    let mut d = a.dot(b);
    if d < 0.0 {
        b = -b;
        d = -d;
    }

    if d > SLERP_DOT_THRESHOLD {
        // Nearly parallel: sin(theta) ~ 0, NLERP is accurate and stable here.
        let q = Quat::from_xyzw(
            lerp_f32(a.x, b.x, t),
            lerp_f32(a.y, b.y, t),
            lerp_f32(a.z, b.z, t),
            lerp_f32(a.w, b.w, t),
        );
        return q.normalize();
    }

    let theta = d.min(1.0).acos();
    let sin_theta = theta.sin();
    let wa = ((1.0 - t) * theta).sin() / sin_theta;
    let wb = (t * theta).sin() / sin_theta;
    Quat::from_xyzw(
        a.x * wa + b.x * wb,
        a.y * wa + b.y * wb,
        a.z * wa + b.z * wb,
        a.w * wa + b.w * wb,
    )
}

/// Interpolate one joint's local transform.
#[inline]
pub fn interpolate_joint_pose(a: &JointPose, b: &JointPose, t: f32) -> JointPose {
    JointPose {
        scale: lerp_vec3(a.scale, b.scale, t),
        rotation: slerp_quat(a.rotation, b.rotation, t),
        translation: lerp_vec3(a.translation, b.translation, t),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

    #[test]
    fn slerp_halfway_about_z() {
        let a = Quat::IDENTITY;
        let b = Quat::from_rotation_z(FRAC_PI_2);
        let mid = slerp_quat(a, b, 0.5);
        assert!(mid.abs_diff_eq(Quat::from_rotation_z(FRAC_PI_4), 1e-5));
    }

    #[test]
    fn slerp_endpoints() {
        let a = Quat::from_rotation_x(0.3);
        let b = Quat::from_rotation_y(1.2);
        assert!(slerp_quat(a, b, 0.0).abs_diff_eq(a, 1e-5));
        assert!(slerp_quat(a, b, 1.0).abs_diff_eq(b, 1e-5));
    }

    #[test]
    fn slerp_takes_short_arc_on_sign_flip() {
        let a = Quat::from_rotation_z(0.2);
        let b = Quat::from_rotation_z(0.8);
        let direct = slerp_quat(a, b, 0.3);
        let flipped = slerp_quat(a, -b, 0.3);
        assert!(direct.abs_diff_eq(flipped, 1e-5));
    }

    #[test]
    fn slerp_between_q_and_neg_q_stays_put() {
        let q = Quat::from_rotation_y(0.7);
        for i in 0..=4 {
            let t = i as f32 / 4.0;
            let r = slerp_quat(q, -q, t);
            // Same rotation; sign may differ only by the chosen representative.
            assert!(r.dot(q).abs() > 1.0 - 1e-5, "t={t} r={r:?}");
        }
    }

    #[test]
    fn joint_pose_lerps_translation_and_scale() {
        let a = JointPose::IDENTITY;
        let b = JointPose::new(Vec3::splat(3.0), Quat::IDENTITY, Vec3::new(2.0, 4.0, 0.0));
        let m = interpolate_joint_pose(&a, &b, 0.5);
        assert!(m.scale.abs_diff_eq(Vec3::splat(2.0), 1e-6));
        assert!(m.translation.abs_diff_eq(Vec3::new(1.0, 2.0, 0.0), 1e-6));
    }
}
