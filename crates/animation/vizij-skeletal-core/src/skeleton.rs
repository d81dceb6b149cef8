//! Immutable joint hierarchy.
//!
//! Joints are stored flat and ordered parent-before-child: every joint's
//! parent has a strictly smaller index and the single root sits at index 0.
//! That ordering is what lets [`crate::Pose`] compute global transforms in a
//! single forward pass.

use glam::Mat4;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::error::SkeletalError;
use crate::ids::SkeletonId;
use crate::transform::JointPose;
use crate::Result;

/// A node of the hierarchy.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Joint {
    /// Parent joint index, `None` for the root.
    pub parent: Option<usize>,
    /// Maps model space into this joint's bind-time local space.
    pub inverse_bind_pose: Mat4,
    #[serde(default)]
    pub debug_name: Option<String>,
}

impl Joint {
    pub fn root() -> Self {
        Self {
            parent: None,
            inverse_bind_pose: Mat4::IDENTITY,
            debug_name: None,
        }
    }

    pub fn child_of(parent: usize) -> Self {
        Self {
            parent: Some(parent),
            inverse_bind_pose: Mat4::IDENTITY,
            debug_name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.debug_name = Some(name.into());
        self
    }

    pub fn with_inverse_bind_pose(mut self, m: Mat4) -> Self {
        self.inverse_bind_pose = m;
        self
    }
}

/// Ordered joint list shared read-only by every pose and clip built for it.
#[derive(Clone, Debug, Serialize)]
pub struct Skeleton {
    id: SkeletonId,
    joints: Vec<Joint>,
    /// Per-joint ancestor chains, nearest parent first. Built on first use.
    #[serde(skip)]
    ancestors: OnceCell<Vec<Vec<usize>>>,
}

/// Check the parent-before-child rule over a list of parent links.
fn validate_parents<I>(parents: I) -> Result<usize>
where
    I: IntoIterator<Item = Option<usize>>,
{
    let mut count = 0usize;
    for (idx, parent) in parents.into_iter().enumerate() {
        match parent {
            None if idx != 0 => {
                return Err(SkeletalError::InvalidHierarchy {
                    joint: idx,
                    reason: "only joint 0 may be the root".into(),
                });
            }
            Some(_) if idx == 0 => {
                return Err(SkeletalError::InvalidHierarchy {
                    joint: 0,
                    reason: "joint 0 must be the root".into(),
                });
            }
            Some(p) if p >= idx => {
                return Err(SkeletalError::InvalidHierarchy {
                    joint: idx,
                    reason: format!("parent {p} does not precede joint"),
                });
            }
            _ => {}
        }
        count += 1;
    }
    if count == 0 {
        return Err(SkeletalError::InvalidHierarchy {
            joint: 0,
            reason: "skeleton has no joints".into(),
        });
    }
    Ok(count)
}

impl Skeleton {
    /// Build a skeleton, validating hierarchy ordering.
    pub fn new(id: SkeletonId, joints: Vec<Joint>) -> Result<Self> {
        validate_parents(joints.iter().map(|j| j.parent))?;
        Ok(Self {
            id,
            joints,
            ancestors: OnceCell::new(),
        })
    }

    #[inline]
    pub fn id(&self) -> SkeletonId {
        self.id
    }

    #[inline]
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    #[inline]
    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    pub fn joint(&self, index: usize) -> Result<&Joint> {
        self.joints.get(index).ok_or(SkeletalError::IndexOutOfRange {
            index,
            len: self.joints.len(),
        })
    }

    /// Parent index of `index`, `None` for the root.
    pub fn parent(&self, index: usize) -> Result<Option<usize>> {
        self.joint(index).map(|j| j.parent)
    }

    /// Direct children of `index`, in index order.
    pub fn children(&self, index: usize) -> Result<Vec<usize>> {
        self.joint(index)?;
        Ok(self
            .joints
            .iter()
            .enumerate()
            .filter(|(_, j)| j.parent == Some(index))
            .map(|(i, _)| i)
            .collect())
    }

    /// Index of the first joint whose debug name equals `name`.
    pub fn find_joint(&self, name: &str) -> Option<usize> {
        self.joints
            .iter()
            .position(|j| j.debug_name.as_deref() == Some(name))
    }

    /// Full ancestor chain of `index`, nearest parent first, root last.
    /// The root's chain is empty.
    pub fn ancestors(&self, index: usize) -> Result<&[usize]> {
        self.joint(index)?;
        let all = self.ancestors.get_or_init(|| self.build_ancestors());
        Ok(&all[index])
    }

    fn build_ancestors(&self) -> Vec<Vec<usize>> {
        let mut out: Vec<Vec<usize>> = Vec::with_capacity(self.joints.len());
        for joint in &self.joints {
            let chain = match joint.parent {
                None => Vec::new(),
                Some(p) => {
                    // Parent precedes child, so its chain is already built.
                    let mut chain = Vec::with_capacity(out[p].len() + 1);
                    chain.push(p);
                    chain.extend_from_slice(&out[p]);
                    chain
                }
            };
            out.push(chain);
        }
        out
    }

    /// True if `ancestor` lies on the parent chain of `joint`.
    pub fn is_ancestor(&self, ancestor: usize, joint: usize) -> Result<bool> {
        self.joint(ancestor)?;
        Ok(self.ancestors(joint)?.contains(&ancestor))
    }
}

/// Derive inverse bind matrices from a rest pose: the inverse of each
/// joint's global rest transform.
pub fn compute_inverse_bind_poses(
    parents: &[Option<usize>],
    rest: &[JointPose],
) -> Result<Vec<Mat4>> {
    validate_parents(parents.iter().copied())?;
    if parents.len() != rest.len() {
        return Err(SkeletalError::DimensionMismatch {
            expected: parents.len(),
            found: rest.len(),
        });
    }
    let mut globals: Vec<Mat4> = Vec::with_capacity(rest.len());
    for (parent, local) in parents.iter().zip(rest) {
        let m = match parent {
            None => local.to_matrix(),
            Some(p) => globals[*p] * local.to_matrix(),
        };
        globals.push(m);
    }
    Ok(globals.into_iter().map(|m| m.inverse()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn chain(n: usize) -> Vec<Joint> {
        (0..n)
            .map(|i| {
                if i == 0 {
                    Joint::root()
                } else {
                    Joint::child_of(i - 1)
                }
            })
            .collect()
    }

    #[test]
    fn rejects_forward_parent() {
        let joints = vec![Joint::root(), Joint::child_of(2), Joint::child_of(0)];
        let err = Skeleton::new(SkeletonId(0), joints).unwrap_err();
        assert!(matches!(err, SkeletalError::InvalidHierarchy { joint: 1, .. }));
    }

    #[test]
    fn rejects_self_parent() {
        let joints = vec![Joint::root(), Joint::child_of(1)];
        assert!(Skeleton::new(SkeletonId(0), joints).is_err());
    }

    #[test]
    fn rejects_second_root() {
        let joints = vec![Joint::root(), Joint::root()];
        let err = Skeleton::new(SkeletonId(0), joints).unwrap_err();
        assert!(matches!(err, SkeletalError::InvalidHierarchy { joint: 1, .. }));
    }

    #[test]
    fn rejects_empty() {
        assert!(Skeleton::new(SkeletonId(0), Vec::new()).is_err());
    }

    #[test]
    fn lookups_are_bounds_checked() {
        let skel = Skeleton::new(SkeletonId(3), chain(2)).unwrap();
        assert_eq!(skel.joint_count(), 2);
        assert_eq!(skel.parent(1).unwrap(), Some(0));
        assert_eq!(
            skel.joint(5).unwrap_err(),
            SkeletalError::IndexOutOfRange { index: 5, len: 2 }
        );
    }

    #[test]
    fn ancestor_chains() {
        // 0 <- 1 <- 2, 0 <- 3
        let joints = vec![
            Joint::root(),
            Joint::child_of(0),
            Joint::child_of(1),
            Joint::child_of(0).with_name("tail"),
        ];
        let skel = Skeleton::new(SkeletonId(0), joints).unwrap();
        assert!(skel.ancestors(0).unwrap().is_empty());
        assert_eq!(skel.ancestors(2).unwrap(), &[1, 0]);
        assert_eq!(skel.ancestors(3).unwrap(), &[0]);
        assert!(skel.is_ancestor(1, 2).unwrap());
        assert!(!skel.is_ancestor(3, 2).unwrap());
        assert_eq!(skel.children(0).unwrap(), vec![1, 3]);
        assert_eq!(skel.find_joint("tail"), Some(3));
    }

    #[test]
    fn inverse_bind_undoes_rest_globals() {
        let rest = vec![
            JointPose::from_translation(Vec3::new(0.0, 1.0, 0.0)),
            JointPose::from_translation(Vec3::new(0.0, 2.0, 0.0)),
        ];
        let inv = compute_inverse_bind_poses(&[None, Some(0)], &rest).unwrap();
        let p = inv[1].transform_point3(Vec3::new(0.0, 3.0, 0.0));
        assert!(p.abs_diff_eq(Vec3::ZERO, 1e-6));
    }
}
