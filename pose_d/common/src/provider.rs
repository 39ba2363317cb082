use crate::error::FeatureStateError;
use crate::quantizer::{StateChange, TickContext};
use crate::registry::{ConfigRegistry, RegistryChange};
use crate::sampler::FeatureSampler;
use crate::{ConfigId, ProviderSettings, TransformConfig};
use api::{FeatureStateActiveMode, HandFrame, TransformFeature, TransformJointData};
use glam::Vec3;
use log::{debug, info, warn};

/// A committed state change, queued until the caller drains it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTransition {
    pub config_id: ConfigId,
    pub feature: TransformFeature,
    pub from: Option<String>,
    pub to: Option<String>,
    pub tick_id: u64,
}

/// Quantizes transform features of one hand into named states.
///
/// Driven by the caller: `tick` once per new hand frame, then any number of
/// queries. Values are only computed while both the wrist and the HMD are
/// tracked; otherwise every read reports no value.
pub struct TransformFeatureStateProvider {
    settings: ProviderSettings,
    sampler: FeatureSampler,
    joints: TransformJointData,
    registry: ConfigRegistry,
    transitions: Vec<StateTransition>,
}

impl TransformFeatureStateProvider {
    pub fn new(settings: ProviderSettings) -> Self {
        Self::with_sampler(settings, FeatureSampler::new())
    }

    pub fn with_sampler(settings: ProviderSettings, sampler: FeatureSampler) -> Self {
        info!(
            "Transform feature state provider started (proactive evaluation: {})",
            !settings.disable_proactive_evaluation
        );
        Self {
            settings,
            sampler,
            joints: TransformJointData::default(),
            registry: ConfigRegistry::new(),
            transitions: Vec::new(),
        }
    }

    pub fn settings(&self) -> &ProviderSettings {
        &self.settings
    }

    pub fn registry(&self) -> &ConfigRegistry {
        &self.registry
    }

    pub fn joint_data(&self) -> &TransformJointData {
        &self.joints
    }

    pub fn is_hand_data_valid(&self) -> bool {
        self.joints.is_valid
    }

    pub fn register_config(&mut self, config: TransformConfig) -> Result<(), FeatureStateError> {
        self.registry.register(config)
    }

    pub fn unregister_config(&mut self, config: &TransformConfig) -> Result<TransformConfig, FeatureStateError> {
        self.registry.unregister(config.instance_id)
    }

    pub fn set_config(&mut self, config: TransformConfig) -> Result<TransformConfig, FeatureStateError> {
        self.registry.set_config(config)
    }

    pub fn config(&self, config_id: ConfigId) -> Result<&TransformConfig, FeatureStateError> {
        self.registry.config(config_id)
    }

    /// Takes in a new hand frame and advances every registered config to it.
    /// A frame whose `data_version` does not increase is rejected untouched.
    pub fn tick(&mut self, frame: &HandFrame) -> Result<(), FeatureStateError> {
        self.registry.check_tick(frame.data_version)?;

        let was_valid = self.joints.is_valid;
        self.joints.update_from(frame);
        if was_valid && !self.joints.is_valid {
            warn!(
                "Hand data became invalid at version {} (wrist: {}, hmd: {})",
                frame.data_version,
                frame.wrist_pose.is_some(),
                frame.center_eye_pose.is_some()
            );
        } else if !was_valid && self.joints.is_valid {
            debug!("Hand data valid again at version {}", frame.data_version);
        }

        let ctx = TickContext::new(frame.data_version, frame.time);
        let changes = self.registry.update_all(
            ctx,
            !self.settings.disable_proactive_evaluation,
            &self.sampler,
            &self.joints,
        )?;
        for RegistryChange {
            config_id,
            feature,
            change,
        } in changes
        {
            self.record(config_id, feature, change);
        }
        Ok(())
    }

    /// Forgets every config and all joint data.
    pub fn shutdown(&mut self) {
        info!(
            "Shutting down transform feature state provider ({} config(s))",
            self.registry.len()
        );
        self.registry.clear();
        self.joints = TransformJointData::default();
        self.transitions.clear();
    }

    /// Transitions committed since the last call, oldest first.
    pub fn drain_transitions(&mut self) -> Vec<StateTransition> {
        std::mem::take(&mut self.transitions)
    }

    fn record(&mut self, config_id: ConfigId, feature: TransformFeature, change: StateChange) {
        let tick_id = self.registry.tick().map_or(0, |t| t.tick_id);
        debug!(
            "Config {} {:?}: {:?} -> {:?} at tick {}",
            config_id, feature, change.from, change.to, tick_id
        );
        self.transitions.push(StateTransition {
            config_id,
            feature,
            from: change.from,
            to: change.to,
            tick_id,
        });
    }

    fn evaluate(&mut self, config_id: ConfigId, feature: TransformFeature) -> Result<(), FeatureStateError> {
        let change = self
            .registry
            .evaluate(config_id, feature, &self.sampler, &self.joints)?;
        if let Some(change) = change {
            self.record(config_id, feature, change);
        }
        Ok(())
    }

    /// State of the feature, evaluated for the current tick if needed.
    /// `None` while the hand data is invalid or no state has been entered.
    pub fn current_state(
        &mut self,
        config_id: ConfigId,
        feature: TransformFeature,
    ) -> Result<Option<String>, FeatureStateError> {
        self.evaluate(config_id, feature)?;
        if !self.is_hand_data_valid() {
            return Ok(None);
        }
        Ok(self.registry.state_of(config_id, feature)?.map(str::to_owned))
    }

    pub fn is_state_active(
        &mut self,
        config_id: ConfigId,
        feature: TransformFeature,
        mode: FeatureStateActiveMode,
        state: &str,
    ) -> Result<bool, FeatureStateError> {
        let current = self.current_state(config_id, feature)?;
        let is = current.as_deref() == Some(state);
        Ok(match mode {
            FeatureStateActiveMode::Is => is,
            FeatureStateActiveMode::IsNot => !is,
        })
    }

    /// Raw feature value; `None` while the hand data is invalid.
    pub fn feature_value(
        &self,
        config_id: ConfigId,
        feature: TransformFeature,
    ) -> Result<Option<f32>, FeatureStateError> {
        let config = self.registry.config(config_id)?;
        Ok(self.sampler.sample(feature, &self.joints, config))
    }

    /// The hand or target vector of a feature together with the wrist
    /// position, for visualizing it. Both are `None` while the hand data is
    /// invalid.
    pub fn feature_vector_and_wrist_pos(
        &self,
        config_id: ConfigId,
        feature: TransformFeature,
        is_hand_vector: bool,
    ) -> Result<(Option<Vec3>, Option<Vec3>), FeatureStateError> {
        let config = self.registry.config(config_id)?;
        if !self.is_hand_data_valid() {
            return Ok((None, None));
        }
        let vector = if is_hand_vector {
            self.sampler.hand_vector(feature, &self.joints)
        } else {
            self.sampler.target_vector(feature, &self.joints, config)
        };
        Ok((vector, Some(self.joints.wrist_pose.position)))
    }
}
