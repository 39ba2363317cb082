use crate::error::FeatureStateError;
use crate::quantizer::{FeatureStateQuantizer, StateChange, TickContext};
use crate::sampler::FeatureSampler;
use crate::{ConfigId, TransformConfig};
use api::{TransformFeature, TransformJointData};
use log::{info, trace};
use std::collections::BTreeMap;

/// A registered config and the hysteresis state of each of its features.
#[derive(Debug, Clone)]
pub struct TransformStateInfo {
    pub config: TransformConfig,
    states: [FeatureStateQuantizer; TransformFeature::COUNT],
}

impl TransformStateInfo {
    fn new(config: TransformConfig) -> Self {
        Self {
            config,
            states: std::array::from_fn(|_| FeatureStateQuantizer::new()),
        }
    }

    pub fn quantizer(&self, feature: TransformFeature) -> &FeatureStateQuantizer {
        &self.states[feature.index()]
    }

    fn evaluate(
        &mut self,
        feature: TransformFeature,
        ctx: TickContext,
        sampler: &FeatureSampler,
        joints: &TransformJointData,
    ) -> Result<Option<StateChange>, FeatureStateError> {
        let spec = self.config.thresholds_for(feature).ok_or(
            FeatureStateError::NotConfigured {
                config_id: self.config.instance_id,
                feature,
            },
        )?;
        let quantizer = &mut self.states[feature.index()];
        if quantizer.is_fresh(ctx.tick_id) {
            return Ok(None);
        }

        match sampler.sample(feature, joints, &self.config) {
            Some(value) => {
                #[cfg(feature = "xtralog")]
                trace!(
                    "Config {} {:?} = {:.3} at tick {}",
                    self.config.instance_id,
                    feature,
                    value,
                    ctx.tick_id
                );
                Ok(quantizer.evaluate(ctx, value, spec))
            }
            None => {
                quantizer.skip(ctx.tick_id);
                Ok(None)
            }
        }
    }
}

/// A state change produced while updating the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryChange {
    pub config_id: ConfigId,
    pub feature: TransformFeature,
    pub change: StateChange,
}

#[derive(Debug, Default)]
pub struct ConfigRegistry {
    entries: BTreeMap<ConfigId, TransformStateInfo>,
    tick: Option<TickContext>,
}

impl ConfigRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, config_id: ConfigId) -> bool {
        self.entries.contains_key(&config_id)
    }

    pub fn ids(&self) -> impl Iterator<Item = ConfigId> + '_ {
        self.entries.keys().copied()
    }

    pub fn tick(&self) -> Option<TickContext> {
        self.tick
    }

    pub fn register(&mut self, config: TransformConfig) -> Result<(), FeatureStateError> {
        let id = config.instance_id;
        if self.entries.contains_key(&id) {
            return Err(FeatureStateError::DuplicateConfig(id));
        }
        self.entries.insert(id, TransformStateInfo::new(config));
        info!("Registered transform config {}", id);
        Ok(())
    }

    pub fn unregister(&mut self, config_id: ConfigId) -> Result<TransformConfig, FeatureStateError> {
        let info = self
            .entries
            .remove(&config_id)
            .ok_or(FeatureStateError::UnknownConfig(config_id))?;
        info!("Unregistered transform config {}", config_id);
        Ok(info.config)
    }

    pub fn info(&self, config_id: ConfigId) -> Result<&TransformStateInfo, FeatureStateError> {
        self.entries
            .get(&config_id)
            .ok_or(FeatureStateError::UnknownConfig(config_id))
    }

    fn info_mut(&mut self, config_id: ConfigId) -> Result<&mut TransformStateInfo, FeatureStateError> {
        self.entries
            .get_mut(&config_id)
            .ok_or(FeatureStateError::UnknownConfig(config_id))
    }

    pub fn config(&self, config_id: ConfigId) -> Result<&TransformConfig, FeatureStateError> {
        Ok(&self.info(config_id)?.config)
    }

    /// Replaces the config registered under `config.instance_id` and returns
    /// the old one. Features whose current state no longer exists in the new
    /// thresholds start over from unset; every feature is re-evaluated on its
    /// next read.
    pub fn set_config(&mut self, config: TransformConfig) -> Result<TransformConfig, FeatureStateError> {
        let info = self.info_mut(config.instance_id)?;
        for feature in TransformFeature::ALL {
            let quantizer = &mut info.states[feature.index()];
            let keep = match (config.thresholds_for(feature), quantizer.current()) {
                (Some(spec), Some(state)) => spec.band(state).is_some(),
                (Some(_), None) => true,
                (None, _) => false,
            };
            if keep {
                quantizer.invalidate();
            } else {
                quantizer.reset();
            }
        }
        Ok(std::mem::replace(&mut info.config, config))
    }

    /// Current state without evaluating. `None` is unset.
    pub fn state_of(
        &self,
        config_id: ConfigId,
        feature: TransformFeature,
    ) -> Result<Option<&str>, FeatureStateError> {
        let info = self.info(config_id)?;
        if info.config.thresholds_for(feature).is_none() {
            return Err(FeatureStateError::NotConfigured { config_id, feature });
        }
        Ok(info.quantizer(feature).current())
    }

    /// Lazily evaluates a feature for the current tick and marks it as
    /// touched, which opts it into proactive evaluation.
    pub fn evaluate(
        &mut self,
        config_id: ConfigId,
        feature: TransformFeature,
        sampler: &FeatureSampler,
        joints: &TransformJointData,
    ) -> Result<Option<StateChange>, FeatureStateError> {
        let tick = self.tick;
        let info = self.info_mut(config_id)?;
        if info.config.thresholds_for(feature).is_none() {
            return Err(FeatureStateError::NotConfigured { config_id, feature });
        }
        info.states[feature.index()].touch();
        match tick {
            Some(ctx) => info.evaluate(feature, ctx, sampler, joints),
            None => Ok(None),
        }
    }

    /// Fails unless `tick_id` follows the last tick.
    pub fn check_tick(&self, tick_id: u64) -> Result<(), FeatureStateError> {
        match self.tick {
            Some(last) if tick_id <= last.tick_id => Err(FeatureStateError::NonMonotonicTick {
                last: last.tick_id,
                got: tick_id,
            }),
            _ => Ok(()),
        }
    }

    /// Advances to a new tick. With `proactive` set, every touched feature
    /// is evaluated right away and the resulting changes are returned.
    pub fn update_all(
        &mut self,
        ctx: TickContext,
        proactive: bool,
        sampler: &FeatureSampler,
        joints: &TransformJointData,
    ) -> Result<Vec<RegistryChange>, FeatureStateError> {
        self.check_tick(ctx.tick_id)?;
        self.tick = Some(ctx);
        trace!("Registry tick {} (proactive: {})", ctx.tick_id, proactive);

        let mut changes = Vec::new();
        if !proactive {
            return Ok(changes);
        }

        for (&config_id, info) in self.entries.iter_mut() {
            for feature in TransformFeature::ALL {
                if !info.quantizer(feature).is_touched() || info.config.thresholds_for(feature).is_none() {
                    continue;
                }
                if let Some(change) = info.evaluate(feature, ctx, sampler, joints)? {
                    changes.push(RegistryChange {
                        config_id,
                        feature,
                        change,
                    });
                }
            }
        }
        Ok(changes)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.tick = None;
    }
}
