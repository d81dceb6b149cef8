//! Per-joint local pose bound to a skeleton, and global transform computation.

use glam::Mat4;
use log::trace;
use serde::{Deserialize, Serialize};

use crate::error::SkeletalError;
use crate::ids::SkeletonId;
use crate::skeleton::Skeleton;
use crate::transform::JointPose;
use crate::Result;

/// Local joint transforms for one skeleton at one instant.
///
/// The pose refers to its skeleton by id only; operations that need the
/// hierarchy take the `Skeleton` explicitly and check the binding.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Pose {
    skeleton: SkeletonId,
    locals: Vec<JointPose>,
    #[serde(skip)]
    globals: Vec<Mat4>,
    #[serde(skip, default = "dirty_default")]
    dirty: bool,
}

fn dirty_default() -> bool {
    true
}

impl PartialEq for Pose {
    fn eq(&self, other: &Self) -> bool {
        self.skeleton == other.skeleton && self.locals == other.locals
    }
}

impl Pose {
    /// Identity pose for `skeleton`.
    pub fn bind(skeleton: &Skeleton) -> Self {
        Self::from_locals(
            skeleton.id(),
            vec![JointPose::IDENTITY; skeleton.joint_count()],
        )
    }

    /// Wrap a local array. Length is checked against the skeleton when the
    /// pose is used with one.
    pub fn from_locals(skeleton: SkeletonId, locals: Vec<JointPose>) -> Self {
        Self {
            skeleton,
            locals,
            globals: Vec::new(),
            dirty: true,
        }
    }

    /// Wrap a local array, checking its length against `skeleton` up front.
    pub fn for_skeleton(skeleton: &Skeleton, locals: Vec<JointPose>) -> Result<Self> {
        let pose = Self::from_locals(skeleton.id(), locals);
        pose.check_binding(skeleton)?;
        Ok(pose)
    }

    #[inline]
    pub fn skeleton_id(&self) -> SkeletonId {
        self.skeleton
    }

    #[inline]
    pub fn joint_count(&self) -> usize {
        self.locals.len()
    }

    #[inline]
    pub fn locals(&self) -> &[JointPose] {
        &self.locals
    }

    pub fn local(&self, index: usize) -> Result<&JointPose> {
        self.locals.get(index).ok_or(SkeletalError::IndexOutOfRange {
            index,
            len: self.locals.len(),
        })
    }

    /// Replace one joint's local transform; invalidates cached globals.
    pub fn set_local(&mut self, index: usize, pose: JointPose) -> Result<()> {
        let len = self.locals.len();
        let slot = self
            .locals
            .get_mut(index)
            .ok_or(SkeletalError::IndexOutOfRange { index, len })?;
        *slot = pose;
        self.dirty = true;
        Ok(())
    }

    /// Overwrite every local from `src`; invalidates cached globals.
    pub fn copy_locals_from(&mut self, src: &[JointPose]) -> Result<()> {
        if src.len() != self.locals.len() {
            return Err(SkeletalError::DimensionMismatch {
                expected: self.locals.len(),
                found: src.len(),
            });
        }
        self.locals.copy_from_slice(src);
        self.dirty = true;
        Ok(())
    }

    /// Mutable access for in-crate writers (sampler, blender); marks dirty.
    pub(crate) fn locals_mut(&mut self) -> &mut [JointPose] {
        self.dirty = true;
        &mut self.locals
    }

    /// Explicit normalization utility for authored or hand-edited rotations.
    pub fn normalize_rotations(&mut self) {
        for local in &mut self.locals {
            *local = local.normalized();
        }
        self.dirty = true;
    }

    /// Ensure this pose belongs to `skeleton` and has one local per joint.
    pub fn check_binding(&self, skeleton: &Skeleton) -> Result<()> {
        if self.skeleton != skeleton.id() {
            return Err(SkeletalError::SkeletonMismatch {
                expected: skeleton.id(),
                found: self.skeleton,
            });
        }
        if self.locals.len() != skeleton.joint_count() {
            return Err(SkeletalError::DimensionMismatch {
                expected: skeleton.joint_count(),
                found: self.locals.len(),
            });
        }
        Ok(())
    }

    /// Model-space transform per joint.
    pub fn global_transforms(&self, skeleton: &Skeleton) -> Result<Vec<Mat4>> {
        let mut out = Vec::with_capacity(self.locals.len());
        self.global_transforms_into(skeleton, &mut out)?;
        Ok(out)
    }

    /// Like [`Pose::global_transforms`] but writes into a reusable buffer.
    ///
    /// `global[0]` is the root's local matrix; every other joint composes its
    /// local matrix onto its parent's global in one forward pass.
    pub fn global_transforms_into(&self, skeleton: &Skeleton, out: &mut Vec<Mat4>) -> Result<()> {
        self.check_binding(skeleton)?;
        trace!(
            "global pose pass: skeleton={:?} joints={}",
            self.skeleton,
            self.locals.len()
        );
        out.clear();
        out.reserve(self.locals.len());
        for (joint, local) in skeleton.joints().iter().zip(&self.locals) {
            let m = match joint.parent {
                None => local.to_matrix(),
                Some(p) => out[p] * local.to_matrix(),
            };
            out.push(m);
        }
        Ok(())
    }

    /// Cached globals, recomputed only after a local change.
    pub fn cached_global_transforms(&mut self, skeleton: &Skeleton) -> Result<&[Mat4]> {
        self.check_binding(skeleton)?;
        if self.dirty || self.globals.len() != self.locals.len() {
            let mut globals = std::mem::take(&mut self.globals);
            self.global_transforms_into(skeleton, &mut globals)?;
            self.globals = globals;
            self.dirty = false;
        }
        Ok(&self.globals)
    }

    /// `global[i] * inverse_bind_pose[i]` for the external skinning step.
    pub fn skinning_matrices(&self, skeleton: &Skeleton) -> Result<Vec<Mat4>> {
        let mut globals = self.global_transforms(skeleton)?;
        for (m, joint) in globals.iter_mut().zip(skeleton.joints()) {
            *m *= joint.inverse_bind_pose;
        }
        Ok(globals)
    }
}
