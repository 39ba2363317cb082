pub use api::{
    FeatureStateActiveMode, HandFrame, Handedness, Pose, TransformFeature, TransformJointData,
    UpVectorType,
};

mod config;
pub mod config_store;
mod error;
mod provider;
mod quantizer;
mod registry;
pub mod sampler;
mod thresholds;

pub type ConfigId = u32;

pub use config::{FeatureWatch, PoseConfig, ProviderSettings, TransformConfig};
pub use error::FeatureStateError;
pub use provider::{StateTransition, TransformFeatureStateProvider};
pub use quantizer::{FeatureStateQuantizer, StateChange, TickContext};
pub use registry::{ConfigRegistry, RegistryChange, TransformStateInfo};
pub use sampler::{FeatureGeometry, FeatureSampler};
pub use thresholds::{Bounds, FeatureThresholds, StateBand, ThresholdSpec, TransitionThreshold};
