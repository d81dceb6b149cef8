use std::f32::consts::FRAC_PI_4;

use vizij_skeletal_core::{
    parse_stored_clip_json, parse_stored_skeleton_json, sample, Quat, SkeletalError, SkeletonId,
    Vec3,
};
use vizij_test_fixtures::{clips, skeletons};

fn load_skeleton(name: &str) -> vizij_skeletal_core::Skeleton {
    let json = skeletons::json(name).expect("skeleton fixture");
    parse_stored_skeleton_json(&json, SkeletonId(0)).expect("skeleton parses")
}

#[test]
fn every_skeleton_fixture_parses() {
    for key in skeletons::keys() {
        let skel = load_skeleton(&key);
        assert!(skel.joint_count() > 0, "{key} has no joints");
        for i in 1..skel.joint_count() {
            let parent = skel.parent(i).unwrap().expect("non-root has a parent");
            assert!(parent < i, "{key}: joint {i} listed before its parent");
        }
    }
}

#[test]
fn every_clip_fixture_matches_its_skeleton() {
    for key in clips::keys() {
        let (skel_json, clip_json) = clips::with_skeleton(&key).unwrap();
        let skel = parse_stored_skeleton_json(&skel_json, SkeletonId(0)).unwrap();
        let clip =
            parse_stored_clip_json(&clip_json, &skel).unwrap_or_else(|e| panic!("{key}: {e}"));
        assert_eq!(clip.joint_count(), skel.joint_count());
    }
}

#[test]
fn arm_inverse_binds_come_from_rest_pose() {
    let skel = load_skeleton("arm");
    let wrist = skel.find_joint("wrist").unwrap();
    // Wrist rests two units out along +X; its inverse bind brings it home.
    let p = skel.joints()[wrist]
        .inverse_bind_pose
        .transform_point3(Vec3::new(2.0, 0.0, 0.0));
    assert!(p.abs_diff_eq(Vec3::ZERO, 1e-6));
}

#[test]
fn arm_wave_poses_the_wrist() {
    let skel = load_skeleton("arm");
    let clip = parse_stored_clip_json(&clips::json("arm-wave").unwrap(), &skel).unwrap();
    assert!(clip.is_looping());
    assert!((clip.duration() - 2.0).abs() < 1e-6);

    let elbow = skel.find_joint("elbow").unwrap();
    let wrist = skel.find_joint("wrist").unwrap();

    // Frame 2 sits at t = 1: elbow bent a quarter turn.
    let pose = sample(&clip, 1.0);
    let globals = pose.global_transforms(&skel).unwrap();
    let tip = globals[wrist].transform_point3(Vec3::ZERO);
    assert!(tip.abs_diff_eq(Vec3::new(1.0, 1.0, 0.0), 1e-5), "{tip:?}");

    // Halfway between frames 0 and 1.
    let q = sample(&clip, 0.25).locals()[elbow].rotation;
    let expected = Quat::from_rotation_z(FRAC_PI_4 * 0.5);
    assert!(q.dot(expected).abs() > 1.0 - 1e-5);
}

#[test]
fn arm_reach_holds_final_frame() {
    let skel = load_skeleton("arm");
    let clip = parse_stored_clip_json(&clips::json("arm-reach").unwrap(), &skel).unwrap();
    let wrist = skel.find_joint("wrist").unwrap();
    let end = sample(&clip, 30.0);
    assert_eq!(end.locals()[wrist].translation, Vec3::new(2.0, 0.0, 0.0));
}

#[test]
fn raw_fixture_shape_is_plain_json() {
    let doc: serde_json::Value = clips::load("arm-wave").unwrap();
    assert_eq!(doc["fps"], 2);
    assert_eq!(doc["frames"].as_array().map(Vec::len), Some(4));
}

#[test]
fn clip_against_wrong_skeleton_is_rejected() {
    let skel = load_skeleton("biped-lite");
    let err = parse_stored_clip_json(&clips::json("arm-wave").unwrap(), &skel).unwrap_err();
    assert!(matches!(
        err,
        SkeletalError::DimensionMismatch {
            expected: 7,
            found: 3
        }
    ));
}
