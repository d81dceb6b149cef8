//! Per-joint local transform (scale, rotation, translation).

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// One joint's transform relative to its parent.
///
/// `rotation` must be a unit quaternion. Nothing in this crate renormalizes
/// it implicitly; call [`JointPose::normalized`] on authored data instead.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct JointPose {
    pub scale: Vec3,
    /// Quaternion (x, y, z, w)
    pub rotation: Quat,
    pub translation: Vec3,
}

impl Default for JointPose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl JointPose {
    pub const IDENTITY: Self = Self {
        scale: Vec3::ONE,
        rotation: Quat::IDENTITY,
        translation: Vec3::ZERO,
    };

    #[inline]
    pub fn new(scale: Vec3, rotation: Quat, translation: Vec3) -> Self {
        Self {
            scale,
            rotation,
            translation,
        }
    }

    #[inline]
    pub fn from_rotation(rotation: Quat) -> Self {
        Self {
            rotation,
            ..Self::IDENTITY
        }
    }

    #[inline]
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    /// Compose into a single matrix. A point is scaled, then rotated, then
    /// translated: `M = T * R * S`.
    #[inline]
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Length of the rotation quaternion.
    #[inline]
    pub fn rotation_length(&self) -> f32 {
        self.rotation.length()
    }

    /// True if `| |q| - 1 | <= tolerance`.
    #[inline]
    pub fn has_unit_rotation(&self, tolerance: f32) -> bool {
        (self.rotation_length() - 1.0).abs() <= tolerance
    }

    /// Copy with the rotation rescaled to unit length.
    /// A zero quaternion becomes identity.
    pub fn normalized(&self) -> Self {
        let len = self.rotation_length();
        let rotation = if len > 0.0 && len.is_finite() {
            self.rotation * len.recip()
        } else {
            Quat::IDENTITY
        };
        Self { rotation, ..*self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn srt_order_scales_before_rotating_and_translating() {
        let pose = JointPose::new(
            Vec3::splat(2.0),
            Quat::from_rotation_z(FRAC_PI_2),
            Vec3::new(10.0, 0.0, 0.0),
        );
        // (1,0,0) -> scale (2,0,0) -> rotate (0,2,0) -> translate (10,2,0)
        let p = pose.to_matrix().transform_point3(Vec3::X);
        assert!(p.abs_diff_eq(Vec3::new(10.0, 2.0, 0.0), 1e-5), "got {p:?}");
    }

    #[test]
    fn normalized_fixes_length_and_keeps_rest() {
        let pose = JointPose {
            rotation: Quat::from_xyzw(0.0, 0.0, 0.0, 2.0),
            translation: Vec3::Y,
            ..JointPose::IDENTITY
        };
        assert!(!pose.has_unit_rotation(1e-3));
        let fixed = pose.normalized();
        assert!(fixed.has_unit_rotation(1e-6));
        assert_eq!(fixed.translation, Vec3::Y);
    }

    #[test]
    fn zero_rotation_normalizes_to_identity() {
        let pose = JointPose::from_rotation(Quat::from_xyzw(0.0, 0.0, 0.0, 0.0));
        assert_eq!(pose.normalized().rotation, Quat::IDENTITY);
    }
}
