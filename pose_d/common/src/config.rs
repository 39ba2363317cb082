use crate::thresholds::{FeatureThresholds, StateBand, ThresholdSpec};
use crate::ConfigId;
use api::{TransformFeature, UpVectorType};
use glam::Vec3;
use log::error;
use serde::{Deserialize, Serialize};

/// A monitored relation between the wrist and a reference frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    pub instance_id: ConfigId,
    /// Offset of the head anchor, in head space.
    pub position_offset: Vec3,
    /// Euler angles in degrees, applied in the up vector's frame.
    pub rotation_offset: Vec3,
    pub up_vector_type: UpVectorType,
    pub feature_thresholds: Option<FeatureThresholds>,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            instance_id: 0,
            position_offset: Vec3::ZERO,
            rotation_offset: Vec3::ZERO,
            up_vector_type: UpVectorType::default(),
            feature_thresholds: None,
        }
    }
}

impl TransformConfig {
    pub fn new(instance_id: ConfigId) -> Self {
        Self {
            instance_id,
            ..Default::default()
        }
    }

    pub fn with_thresholds(mut self, thresholds: FeatureThresholds) -> Self {
        self.feature_thresholds = Some(thresholds);
        self
    }

    pub fn with_up_vector(mut self, up_vector_type: UpVectorType) -> Self {
        self.up_vector_type = up_vector_type;
        self
    }

    pub fn thresholds_for(&self, feature: TransformFeature) -> Option<&ThresholdSpec> {
        self.feature_thresholds.as_ref()?.get(feature)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Only evaluate features when they are queried. Callers then have to
    /// query every tick or transitions between two queries are lost.
    pub disable_proactive_evaluation: bool,
}

/// A feature the app queries every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureWatch {
    pub config_id: ConfigId,
    pub feature: TransformFeature,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoseConfig {
    pub provider: ProviderSettings,

    #[serde(default = "default_configs")]
    pub configs: Vec<TransformConfig>,

    #[serde(default = "default_watches")]
    pub watches: Vec<FeatureWatch>,

    #[serde(default = "default_frames_path")]
    pub frames_path: String,

    pub realtime: bool,
}

fn default_palm_up_thresholds() -> FeatureThresholds {
    let bands = vec![
        StateBand::below("PalmUp", 45.0, 60.0),
        StateBand::above("PalmAway", 75.0, 60.0),
    ];
    let mut thresholds = FeatureThresholds::new();
    match ThresholdSpec::new(bands) {
        Ok(spec) => {
            thresholds.insert(TransformFeature::PalmUp, spec);
        }
        Err(e) => error!("Built-in PalmUp thresholds are invalid: {}", e),
    }
    thresholds
}

fn default_configs() -> Vec<TransformConfig> {
    vec![TransformConfig::new(1).with_thresholds(default_palm_up_thresholds())]
}

fn default_watches() -> Vec<FeatureWatch> {
    vec![FeatureWatch {
        config_id: 1,
        feature: TransformFeature::PalmUp,
    }]
}

fn default_frames_path() -> String {
    "frames.jsonl".to_string()
}

impl Default for PoseConfig {
    fn default() -> Self {
        Self {
            provider: ProviderSettings::default(),
            configs: default_configs(),
            watches: default_watches(),
            frames_path: default_frames_path(),
            realtime: false,
        }
    }
}
