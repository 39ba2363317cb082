use crate::ConfigId;
use api::TransformFeature;

/// Caller and configuration errors. Untracked hands or HMDs are not errors,
/// they surface as `None` values instead.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FeatureStateError {
    #[error("Config {0} is already registered")]
    DuplicateConfig(ConfigId),
    #[error("Config {0} is not registered")]
    UnknownConfig(ConfigId),
    #[error("Config {config_id} has no thresholds for {feature:?}")]
    NotConfigured {
        config_id: ConfigId,
        feature: TransformFeature,
    },
    #[error("Invalid thresholds: {reason}")]
    InvalidThresholds { reason: String },
    #[error("Tick {got} does not follow tick {last}")]
    NonMonotonicTick { last: u64, got: u64 },
}

impl FeatureStateError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidThresholds {
            reason: reason.into(),
        }
    }
}
