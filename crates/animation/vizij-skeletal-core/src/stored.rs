use glam::{Mat4, Quat, Vec3};
use serde::Deserialize;

use crate::clip::{AnimationClip, AnimationSample};
use crate::config::Config;
use crate::error::SkeletalError;
use crate::ids::SkeletonId;
use crate::skeleton::{compute_inverse_bind_poses, Joint, Skeleton};
use crate::transform::JointPose;
use crate::Result;

/// Public API: parse a stored skeleton JSON document into a validated Skeleton.
///
/// Notes:
/// - `parent` may be a joint index, a joint name, or null/absent for the root.
///   Names must refer to an earlier joint.
/// - `inverseBindPose` is a column-major 4x4 array, given on every joint or
///   on none. When absent, inverse binds are derived from each joint's
///   `rest` transform; a partial set is an `InvalidHierarchy` error.
pub fn parse_stored_skeleton_json(s: &str, id: SkeletonId) -> Result<Skeleton> {
    let ss: StoredSkeleton = serde_json::from_str(s)?;

    let mut parents: Vec<Option<usize>> = Vec::with_capacity(ss.joints.len());
    for (idx, sj) in ss.joints.iter().enumerate() {
        let parent = match &sj.parent {
            None => None,
            Some(RawParent::Index(p)) => Some(*p),
            Some(RawParent::Name(name)) => {
                let found = ss.joints[..idx]
                    .iter()
                    .position(|j| j.name.as_deref() == Some(name.as_str()));
                match found {
                    Some(p) => Some(p),
                    None => {
                        return Err(SkeletalError::InvalidHierarchy {
                            joint: idx,
                            reason: format!("unknown parent '{name}'"),
                        });
                    }
                }
            }
        };
        parents.push(parent);
    }

    let authored = ss
        .joints
        .iter()
        .filter(|j| j.inverse_bind_pose.is_some())
        .count();
    if authored != 0 && authored != ss.joints.len() {
        let joint = ss
            .joints
            .iter()
            .position(|j| j.inverse_bind_pose.is_none())
            .unwrap_or(0);
        return Err(SkeletalError::InvalidHierarchy {
            joint,
            reason: "inverseBindPose must be given for all joints or none".into(),
        });
    }
    let inverse_binds: Vec<Mat4> = if authored != 0 {
        ss.joints
            .iter()
            .filter_map(|j| j.inverse_bind_pose.as_ref().map(Mat4::from_cols_array))
            .collect()
    } else {
        let rest: Vec<JointPose> = ss
            .joints
            .iter()
            .map(|j| j.rest.as_ref().map(to_joint_pose).unwrap_or_default())
            .collect();
        compute_inverse_bind_poses(&parents, &rest)?
    };

    let joints = ss
        .joints
        .into_iter()
        .zip(parents)
        .zip(inverse_binds)
        .map(|((sj, parent), inverse_bind_pose)| Joint {
            parent,
            inverse_bind_pose,
            debug_name: sj.name,
        })
        .collect();
    Skeleton::new(id, joints)
}

/// Public API: parse a stored clip JSON document for `skeleton`.
///
/// Every frame lists one transform per joint in skeleton order. Missing
/// components default to identity (`s` = 1, `r` = identity, `t` = 0).
/// Rotations are validated, not renormalized.
pub fn parse_stored_clip_json(s: &str, skeleton: &Skeleton) -> Result<AnimationClip> {
    parse_stored_clip_json_with_config(s, skeleton, &Config::default())
}

pub fn parse_stored_clip_json_with_config(
    s: &str,
    skeleton: &Skeleton,
    cfg: &Config,
) -> Result<AnimationClip> {
    let sc: StoredClip = serde_json::from_str(s)?;
    let samples = sc
        .frames
        .iter()
        .map(|frame| AnimationSample::new(frame.iter().map(to_joint_pose).collect()))
        .collect();
    AnimationClip::with_config(sc.name, skeleton, sc.fps, sc.looping, samples, cfg)
}

fn to_joint_pose(raw: &RawJointPose) -> JointPose {
    JointPose {
        scale: Vec3::from_array(raw.s),
        rotation: Quat::from_array(raw.r),
        translation: Vec3::from_array(raw.t),
    }
}

// ----- JSON schema (serde) -----

#[derive(Debug, Deserialize)]
struct StoredSkeleton {
    pub joints: Vec<StoredJoint>,
}

#[derive(Debug, Deserialize)]
struct StoredJoint {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub parent: Option<RawParent>,
    #[serde(default, rename = "inverseBindPose")]
    pub inverse_bind_pose: Option<[f32; 16]>,
    #[serde(default)]
    pub rest: Option<RawJointPose>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawParent {
    Index(usize),
    Name(String),
}

#[derive(Debug, Deserialize)]
struct StoredClip {
    pub name: String,
    pub fps: f32,
    #[serde(default)]
    pub looping: bool,
    pub frames: Vec<Vec<RawJointPose>>,
}

#[derive(Debug, Deserialize)]
struct RawJointPose {
    #[serde(default = "unit_scale")]
    pub s: [f32; 3],
    #[serde(default = "identity_rotation")]
    pub r: [f32; 4],
    #[serde(default)]
    pub t: [f32; 3],
}

fn unit_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

fn identity_rotation() -> [f32; 4] {
    [0.0, 0.0, 0.0, 1.0]
}

#[cfg(test)]
mod tests {
    use super::*;

    const SKELETON: &str = r#"{
        "name": "arm",
        "joints": [
            { "name": "shoulder" },
            { "name": "elbow", "parent": "shoulder", "rest": { "t": [0, 1, 0] } },
            { "name": "wrist", "parent": 1, "rest": { "t": [0, 1, 0] } }
        ]
    }"#;

    #[test]
    fn parents_by_name_or_index() {
        let skel = parse_stored_skeleton_json(SKELETON, SkeletonId(2)).unwrap();
        assert_eq!(skel.id(), SkeletonId(2));
        assert_eq!(skel.parent(1).unwrap(), Some(0));
        assert_eq!(skel.parent(2).unwrap(), Some(1));
        assert_eq!(skel.find_joint("wrist"), Some(2));
        let p = skel.joints()[2]
            .inverse_bind_pose
            .transform_point3(Vec3::new(0.0, 2.0, 0.0));
        assert!(p.abs_diff_eq(Vec3::ZERO, 1e-6));
    }

    #[test]
    fn unknown_parent_name_is_hierarchy_error() {
        let json = r#"{ "joints": [ { "name": "a" }, { "name": "b", "parent": "zzz" } ] }"#;
        assert!(matches!(
            parse_stored_skeleton_json(json, SkeletonId(0)),
            Err(SkeletalError::InvalidHierarchy { joint: 1, .. })
        ));
    }

    #[test]
    fn clip_defaults_missing_components() {
        let skel = parse_stored_skeleton_json(SKELETON, SkeletonId(0)).unwrap();
        let json = r#"{ "name": "idle", "fps": 10, "frames": [ [ {}, {}, { "t": [1, 0, 0] } ] ] }"#;
        let clip = parse_stored_clip_json(json, &skel).unwrap();
        assert_eq!(clip.frame_count(), 1);
        assert!(!clip.is_looping());
        let wrist = clip.samples()[0].joints[2];
        assert_eq!(wrist.translation, Vec3::X);
        assert_eq!(wrist.rotation, Quat::IDENTITY);
        assert_eq!(wrist.scale, Vec3::ONE);
    }

    #[test]
    fn authored_inverse_binds_are_kept() {
        let json = r#"{ "joints": [
            { "name": "a", "inverseBindPose": [1,0,0,0, 0,1,0,0, 0,0,1,0, 5,0,0,1] },
            { "name": "b", "parent": 0, "rest": { "t": [9, 9, 9] },
              "inverseBindPose": [1,0,0,0, 0,1,0,0, 0,0,1,0, 0,-1,0,1] }
        ] }"#;
        let skel = parse_stored_skeleton_json(json, SkeletonId(0)).unwrap();
        assert_eq!(
            skel.joints()[0].inverse_bind_pose,
            Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0))
        );
        // `rest` does not override an authored matrix.
        assert_eq!(
            skel.joints()[1].inverse_bind_pose,
            Mat4::from_translation(Vec3::new(0.0, -1.0, 0.0))
        );
    }

    #[test]
    fn partial_inverse_binds_are_rejected() {
        let json = r#"{ "joints": [
            { "name": "a", "inverseBindPose": [1,0,0,0, 0,1,0,0, 0,0,1,0, 5,0,0,1] },
            { "name": "b", "parent": 0 }
        ] }"#;
        assert!(matches!(
            parse_stored_skeleton_json(json, SkeletonId(0)),
            Err(SkeletalError::InvalidHierarchy { joint: 1, .. })
        ));
    }

    #[test]
    fn malformed_json_is_parse_error() {
        assert!(matches!(
            parse_stored_skeleton_json("{", SkeletonId(0)),
            Err(SkeletalError::Parse { .. })
        ));
    }
}
