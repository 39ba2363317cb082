use common::sampler::up_vector;
use common::{
    FeatureSampler, Handedness, Pose, TransformConfig, TransformFeature, TransformJointData,
    UpVectorType,
};
use glam::{Quat, Vec3};
use std::f32::consts::{FRAC_PI_2, PI};

const EPS_DEG: f32 = 0.1;

fn joints(handedness: Handedness, wrist: Pose, head: Pose) -> TransformJointData {
    TransformJointData {
        is_valid: true,
        handedness,
        center_eye_pose: head,
        wrist_pose: wrist,
        tracking_system_up: Vec3::Y,
        tracking_system_forward: Vec3::Z,
    }
}

fn level_head() -> Pose {
    Pose::new(Vec3::new(0.0, 1.6, 0.0), Quat::IDENTITY)
}

fn wrist(rotation: Quat) -> Pose {
    Pose::new(Vec3::new(0.0, 1.0, 0.0), rotation)
}

fn world() -> TransformConfig {
    TransformConfig::new(1).with_up_vector(UpVectorType::World)
}

fn assert_deg(value: Option<f32>, expected: f32) {
    let value = value.expect("feature should have a value");
    assert!(
        (value - expected).abs() < EPS_DEG,
        "expected {} degrees, got {}",
        expected,
        value
    );
}

#[test]
fn right_palm_faces_down_at_rest() {
    let sampler = FeatureSampler::new();
    let j = joints(Handedness::Right, wrist(Quat::IDENTITY), level_head());

    assert_deg(sampler.sample(TransformFeature::PalmDown, &j, &world()), 0.0);
    assert_deg(sampler.sample(TransformFeature::PalmUp, &j, &world()), 180.0);
    assert_deg(sampler.sample(TransformFeature::FingersUp, &j, &world()), 90.0);
    assert_deg(sampler.sample(TransformFeature::WristUp, &j, &world()), 90.0);
}

#[test]
fn left_hand_is_mirrored() {
    let sampler = FeatureSampler::new();
    let j = joints(Handedness::Left, wrist(Quat::IDENTITY), level_head());

    assert_deg(sampler.sample(TransformFeature::PalmUp, &j, &world()), 0.0);
    assert_eq!(sampler.hand_vector(TransformFeature::WristUp, &j), Some(-Vec3::X));
}

#[test]
fn up_vector_follows_the_selected_source() {
    let rolled_head = Pose::new(Vec3::new(0.0, 1.6, 0.0), Quat::from_rotation_z(FRAC_PI_2));
    let mut j = joints(Handedness::Right, wrist(Quat::IDENTITY), rolled_head);
    j.tracking_system_up = Vec3::X;
    let sampler = FeatureSampler::new();

    let head = TransformConfig::new(1).with_up_vector(UpVectorType::Head);
    let tracking = TransformConfig::new(1).with_up_vector(UpVectorType::Tracking);

    assert!(up_vector(&j, UpVectorType::Head).abs_diff_eq(-Vec3::X, 1e-5));
    assert_eq!(up_vector(&j, UpVectorType::Tracking), Vec3::X);
    assert_eq!(up_vector(&j, UpVectorType::World), Vec3::Y);

    // Thumb side points along +X.
    assert_deg(sampler.sample(TransformFeature::WristUp, &j, &head), 180.0);
    assert_deg(sampler.sample(TransformFeature::WristUp, &j, &tracking), 0.0);
    assert_deg(sampler.sample(TransformFeature::WristUp, &j, &world()), 90.0);
}

#[test]
fn palm_towards_face_uses_the_head_position() {
    let sampler = FeatureSampler::new();
    let facing_up = joints(Handedness::Right, wrist(Quat::from_rotation_z(PI)), level_head());
    let facing_down = joints(Handedness::Right, wrist(Quat::IDENTITY), level_head());

    assert_deg(
        sampler.sample(TransformFeature::PalmTowardsFace, &facing_up, &world()),
        0.0,
    );
    assert_deg(
        sampler.sample(TransformFeature::PalmAwayFromFace, &facing_up, &world()),
        180.0,
    );
    assert_deg(
        sampler.sample(TransformFeature::PalmTowardsFace, &facing_down, &world()),
        180.0,
    );
}

#[test]
fn position_offset_moves_the_head_anchor() {
    let sampler = FeatureSampler::new();
    let head = level_head();
    let hand = Pose::new(head.position, Quat::from_rotation_x(-FRAC_PI_2));
    let j = joints(Handedness::Right, hand, head);

    // Wrist and head coincide: there is no direction to face.
    assert_eq!(sampler.sample(TransformFeature::PalmTowardsFace, &j, &world()), None);

    let mut ahead = world();
    ahead.position_offset = Vec3::new(0.0, 0.0, 0.5);
    assert_deg(sampler.sample(TransformFeature::PalmTowardsFace, &j, &ahead), 0.0);
}

#[test]
fn rotation_offset_tilts_the_target() {
    let sampler = FeatureSampler::new();
    let j = joints(Handedness::Right, wrist(Quat::IDENTITY), level_head());

    let mut tilted = world();
    tilted.rotation_offset = Vec3::new(0.0, 0.0, 90.0);

    let target = sampler
        .target_vector(TransformFeature::WristUp, &j, &tilted)
        .unwrap();
    assert!(target.abs_diff_eq(-Vec3::X, 1e-5));
    assert_deg(sampler.sample(TransformFeature::WristUp, &j, &tilted), 180.0);
}

#[test]
fn invalid_joints_have_no_value() {
    let sampler = FeatureSampler::new();
    let mut j = joints(Handedness::Right, wrist(Quat::IDENTITY), level_head());
    j.is_valid = false;

    for feature in TransformFeature::ALL {
        assert_eq!(sampler.sample(feature, &j, &world()), None);
        assert_eq!(sampler.hand_vector(feature, &j), None);
        assert_eq!(sampler.target_vector(feature, &j, &world()), None);
    }
}
