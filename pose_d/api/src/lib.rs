use anyhow::Result;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Local +Y in world space.
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Local +Z in world space.
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    /// Local +X in world space.
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation * local
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Handedness {
    Left,
    #[default]
    Right,
}

/// Which vector the transform features treat as "up".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpVectorType {
    #[default]
    Head,
    Tracking,
    World,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(usize)]
pub enum TransformFeature {
    WristUp = 0,
    WristDown,
    PalmDown,
    PalmUp,
    PalmTowardsFace,
    PalmAwayFromFace,
    FingersUp,
    FingersDown,
    PinchClear,
}

impl TransformFeature {
    pub const COUNT: usize = 9;

    pub const ALL: [TransformFeature; TransformFeature::COUNT] = [
        TransformFeature::WristUp,
        TransformFeature::WristDown,
        TransformFeature::PalmDown,
        TransformFeature::PalmUp,
        TransformFeature::PalmTowardsFace,
        TransformFeature::PalmAwayFromFace,
        TransformFeature::FingersUp,
        TransformFeature::FingersDown,
        TransformFeature::PinchClear,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<usize> for TransformFeature {
    type Error = ();

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::ALL.get(value).copied().ok_or(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureStateActiveMode {
    Is,
    IsNot,
}

/// One sample from a hand tracking source.
///
/// `wrist_pose` and `center_eye_pose` are `None` while the hand or the HMD
/// is not tracked. `data_version` must increase with every new sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandFrame {
    pub data_version: u64,
    #[serde(default)]
    pub time: f64,
    #[serde(default)]
    pub handedness: Handedness,
    #[serde(default)]
    pub wrist_pose: Option<Pose>,
    #[serde(default)]
    pub center_eye_pose: Option<Pose>,
    #[serde(default = "default_tracking_up")]
    pub tracking_up: Vec3,
    #[serde(default = "default_tracking_forward")]
    pub tracking_forward: Vec3,
}

fn default_tracking_up() -> Vec3 {
    Vec3::Y
}

fn default_tracking_forward() -> Vec3 {
    Vec3::Z
}

impl Default for HandFrame {
    fn default() -> Self {
        Self {
            data_version: 0,
            time: 0.0,
            handedness: Handedness::default(),
            wrist_pose: None,
            center_eye_pose: None,
            tracking_up: default_tracking_up(),
            tracking_forward: default_tracking_forward(),
        }
    }
}

/// Snapshot of the joints the transform features are computed from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformJointData {
    pub is_valid: bool,
    pub handedness: Handedness,
    pub center_eye_pose: Pose,
    pub wrist_pose: Pose,
    pub tracking_system_up: Vec3,
    pub tracking_system_forward: Vec3,
}

impl Default for TransformJointData {
    fn default() -> Self {
        Self {
            is_valid: false,
            handedness: Handedness::default(),
            center_eye_pose: Pose::IDENTITY,
            wrist_pose: Pose::IDENTITY,
            tracking_system_up: Vec3::Y,
            tracking_system_forward: Vec3::Z,
        }
    }
}

impl TransformJointData {
    /// Refreshes the snapshot from a frame. Poses of an invalid frame are
    /// left untouched, only the validity flag drops.
    pub fn update_from(&mut self, frame: &HandFrame) {
        match (frame.wrist_pose, frame.center_eye_pose) {
            (Some(wrist), Some(center_eye)) => {
                self.is_valid = true;
                self.handedness = frame.handedness;
                self.wrist_pose = wrist;
                self.center_eye_pose = center_eye;
                self.tracking_system_up = frame.tracking_up;
                self.tracking_system_forward = frame.tracking_forward;
            }
            _ => self.is_valid = false,
        }
    }
}

pub trait HandTrackingSource {
    fn initialize(&mut self) -> Result<()>;
    /// Fills `frame` with the next sample. Returns `false` once the source is exhausted.
    fn update(&mut self, frame: &mut HandFrame) -> Result<bool>;
    fn unload(&mut self);
}
