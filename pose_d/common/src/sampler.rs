//! Scalar values of transform features.
//!
//! Every feature is the angle, in degrees, between a vector derived from the
//! wrist pose and a reference vector derived from the head, the tracking
//! space or the world. The geometry of each feature can be swapped out with
//! [`FeatureSampler::with_geometry`].

use crate::TransformConfig;
use api::{Handedness, TransformFeature, TransformJointData, UpVectorType};
use glam::{EulerRot, Mat3, Quat, Vec3};

/// Geometry of one feature.
pub trait FeatureGeometry: Send + Sync {
    fn hand_vector(&self, joints: &TransformJointData) -> Vec3;

    fn target_vector(&self, joints: &TransformJointData, config: &TransformConfig) -> Vec3;

    fn value(&self, joints: &TransformJointData, config: &TransformConfig) -> f32 {
        let hand = self.hand_vector(joints);
        let target = self.target_vector(joints, config);
        hand.angle_between(target).to_degrees()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HandAxis {
    Fingers,
    Palm,
    Thumb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reference {
    Up,
    Down,
    TowardsHead,
    AwayFromHead,
}

/// Built-in geometry: a wrist axis against a reference direction.
#[derive(Debug, Clone, Copy)]
struct AxisGeometry {
    hand: HandAxis,
    reference: Reference,
}

impl AxisGeometry {
    fn for_feature(feature: TransformFeature) -> Self {
        use HandAxis::*;
        use Reference::*;

        let (hand, reference) = match feature {
            TransformFeature::WristUp => (Thumb, Up),
            TransformFeature::WristDown => (Thumb, Down),
            TransformFeature::PalmDown => (Palm, Down),
            TransformFeature::PalmUp => (Palm, Up),
            TransformFeature::PalmTowardsFace => (Palm, TowardsHead),
            TransformFeature::PalmAwayFromFace => (Palm, AwayFromHead),
            TransformFeature::FingersUp => (Fingers, Up),
            TransformFeature::FingersDown => (Fingers, Down),
            TransformFeature::PinchClear => (Thumb, TowardsHead),
        };
        Self { hand, reference }
    }
}

impl FeatureGeometry for AxisGeometry {
    fn hand_vector(&self, joints: &TransformJointData) -> Vec3 {
        let wrist = &joints.wrist_pose;
        let mirror = match joints.handedness {
            Handedness::Right => 1.0,
            Handedness::Left => -1.0,
        };
        match self.hand {
            HandAxis::Fingers => wrist.forward(),
            HandAxis::Palm => -wrist.up() * mirror,
            HandAxis::Thumb => wrist.right() * mirror,
        }
    }

    fn target_vector(&self, joints: &TransformJointData, config: &TransformConfig) -> Vec3 {
        let raw = match self.reference {
            Reference::Up => up_vector(joints, config.up_vector_type),
            Reference::Down => -up_vector(joints, config.up_vector_type),
            Reference::TowardsHead => head_anchor(joints, config) - joints.wrist_pose.position,
            Reference::AwayFromHead => joints.wrist_pose.position - head_anchor(joints, config),
        };
        offset_rotation(joints, config) * raw
    }
}

pub fn up_vector(joints: &TransformJointData, up: UpVectorType) -> Vec3 {
    match up {
        UpVectorType::Head => joints.center_eye_pose.up(),
        UpVectorType::Tracking => joints.tracking_system_up,
        UpVectorType::World => Vec3::Y,
    }
}

/// Orientation the rotation offset is expressed in.
fn reference_basis(joints: &TransformJointData, up: UpVectorType) -> Quat {
    match up {
        UpVectorType::Head => joints.center_eye_pose.rotation,
        UpVectorType::Tracking => look_rotation(
            joints.tracking_system_forward,
            joints.tracking_system_up,
        ),
        UpVectorType::World => Quat::IDENTITY,
    }
}

/// Rotation mapping +Z to `forward` and +Y as close to `up` as possible.
fn look_rotation(forward: Vec3, up: Vec3) -> Quat {
    let z = forward.normalize_or_zero();
    let x = up.cross(z).normalize_or_zero();
    if z == Vec3::ZERO || x == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    let y = z.cross(x);
    Quat::from_mat3(&Mat3::from_cols(x, y, z))
}

fn offset_rotation(joints: &TransformJointData, config: &TransformConfig) -> Quat {
    if config.rotation_offset == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    let r = config.rotation_offset;
    let offset = Quat::from_euler(
        EulerRot::XYZ,
        r.x.to_radians(),
        r.y.to_radians(),
        r.z.to_radians(),
    );
    let basis = reference_basis(joints, config.up_vector_type);
    basis * offset * basis.inverse()
}

fn head_anchor(joints: &TransformJointData, config: &TransformConfig) -> Vec3 {
    joints.center_eye_pose.transform_point(config.position_offset)
}

/// Computes feature values from joint data.
pub struct FeatureSampler {
    geometry: Vec<Box<dyn FeatureGeometry>>,
}

impl Default for FeatureSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureSampler {
    pub fn new() -> Self {
        Self {
            geometry: TransformFeature::ALL
                .iter()
                .map(|&f| Box::new(AxisGeometry::for_feature(f)) as Box<dyn FeatureGeometry>)
                .collect(),
        }
    }

    pub fn with_geometry(mut self, feature: TransformFeature, geometry: Box<dyn FeatureGeometry>) -> Self {
        self.geometry[feature.index()] = geometry;
        self
    }

    fn geometry(&self, feature: TransformFeature) -> &dyn FeatureGeometry {
        self.geometry[feature.index()].as_ref()
    }

    /// `None` for invalid joints or a value that is not finite.
    pub fn sample(
        &self,
        feature: TransformFeature,
        joints: &TransformJointData,
        config: &TransformConfig,
    ) -> Option<f32> {
        if !joints.is_valid {
            return None;
        }
        let value = self.geometry(feature).value(joints, config);
        value.is_finite().then_some(value)
    }

    pub fn hand_vector(&self, feature: TransformFeature, joints: &TransformJointData) -> Option<Vec3> {
        if !joints.is_valid {
            return None;
        }
        Some(self.geometry(feature).hand_vector(joints))
    }

    pub fn target_vector(
        &self,
        feature: TransformFeature,
        joints: &TransformJointData,
        config: &TransformConfig,
    ) -> Option<Vec3> {
        if !joints.is_valid {
            return None;
        }
        Some(self.geometry(feature).target_vector(joints, config))
    }
}
