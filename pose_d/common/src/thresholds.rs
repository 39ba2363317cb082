use crate::error::FeatureStateError;
use api::TransformFeature;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Inclusive scalar range. A missing bound is open-ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f32>,
}

impl Bounds {
    pub const UNBOUNDED: Self = Self {
        min: None,
        max: None,
    };

    pub fn at_least(min: f32) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    pub fn at_most(max: f32) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }

    pub fn between(min: f32, max: f32) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn contains(&self, value: f32) -> bool {
        self.lo() <= value && value <= self.hi()
    }

    fn lo(&self) -> f32 {
        self.min.unwrap_or(f32::NEG_INFINITY)
    }

    fn hi(&self) -> f32 {
        self.max.unwrap_or(f32::INFINITY)
    }

    fn contains_range(&self, other: &Bounds) -> bool {
        self.lo() <= other.lo() && other.hi() <= self.hi()
    }

    fn overlaps(&self, other: &Bounds) -> bool {
        self.lo() <= other.hi() && other.lo() <= self.hi()
    }

    fn check(&self, what: &str, state: &str) -> Result<(), FeatureStateError> {
        if self.min.is_some_and(f32::is_nan) || self.max.is_some_and(f32::is_nan) {
            return Err(FeatureStateError::invalid(format!(
                "{} range of '{}' has a NaN bound",
                what, state
            )));
        }
        if self.lo() > self.hi() {
            return Err(FeatureStateError::invalid(format!(
                "{} range of '{}' has min > max",
                what, state
            )));
        }
        Ok(())
    }
}

/// A named state with its hysteresis band: the value has to reach `enter`
/// to switch into the state and has to leave `exit` to switch out of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateBand {
    pub state: String,
    pub enter: Bounds,
    pub exit: Bounds,
}

impl StateBand {
    pub fn new(state: impl Into<String>, enter: Bounds, exit: Bounds) -> Self {
        Self {
            state: state.into(),
            enter,
            exit,
        }
    }

    /// Entered at `value >= enter`, left once `value < exit`.
    pub fn above(state: impl Into<String>, enter: f32, exit: f32) -> Self {
        Self::new(state, Bounds::at_least(enter), Bounds::at_least(exit))
    }

    /// Entered at `value <= enter`, left once `value > exit`.
    pub fn below(state: impl Into<String>, enter: f32, exit: f32) -> Self {
        Self::new(state, Bounds::at_most(enter), Bounds::at_most(exit))
    }
}

/// Two adjacent states on an ascending scale: the value moves from `lower`
/// to `upper` once it rises above `to_upper_above` and back once it falls
/// below `to_lower_below`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionThreshold {
    pub lower: String,
    pub upper: String,
    pub to_lower_below: f32,
    pub to_upper_above: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum ThresholdDef {
    Bands {
        bands: Vec<StateBand>,
        #[serde(default)]
        min_time_in_state: f32,
    },
    Transitions {
        transitions: Vec<TransitionThreshold>,
        #[serde(default)]
        min_time_in_state: f32,
    },
}

/// Ordered, validated state bands for one feature. Bands are matched in
/// declaration order.
///
/// A spec built from a transition chain is a ladder: once a state is set,
/// leaving its exit range moves to the neighbouring rung in the direction
/// the value went, so the feature never falls back to unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ThresholdDef", into = "ThresholdDef")]
pub struct ThresholdSpec {
    bands: Vec<StateBand>,
    min_time_in_state: f32,
    ladder: Option<Vec<TransitionThreshold>>,
}

impl ThresholdSpec {
    pub fn new(bands: Vec<StateBand>) -> Result<Self, FeatureStateError> {
        Self::with_min_time_in_state(bands, 0.0)
    }

    pub fn with_min_time_in_state(
        bands: Vec<StateBand>,
        min_time_in_state: f32,
    ) -> Result<Self, FeatureStateError> {
        let spec = Self {
            bands,
            min_time_in_state,
            ladder: None,
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Builds the bands of an ascending chain of two-state thresholds. Each
    /// threshold's `upper` state must be the next threshold's `lower` state.
    pub fn from_transitions(
        transitions: &[TransitionThreshold],
        min_time_in_state: f32,
    ) -> Result<Self, FeatureStateError> {
        let Some(first) = transitions.first() else {
            return Err(FeatureStateError::invalid("no transitions given"));
        };

        let mut bands = Vec::with_capacity(transitions.len() + 1);
        let mut state = first.lower.clone();
        let mut enter_min = None;
        let mut exit_min = None;

        for (i, t) in transitions.iter().enumerate() {
            if t.lower != state {
                return Err(FeatureStateError::invalid(format!(
                    "transition {} starts at '{}' but the chain is at '{}'",
                    i, t.lower, state
                )));
            }
            if t.to_lower_below.is_nan()
                || t.to_upper_above.is_nan()
                || t.to_lower_below >= t.to_upper_above
            {
                return Err(FeatureStateError::invalid(format!(
                    "transition '{}' -> '{}' needs to_lower_below < to_upper_above",
                    t.lower, t.upper
                )));
            }
            bands.push(StateBand::new(
                state,
                Bounds {
                    min: enter_min,
                    max: Some(t.to_lower_below),
                },
                Bounds {
                    min: exit_min,
                    max: Some(t.to_upper_above),
                },
            ));
            state = t.upper.clone();
            enter_min = Some(t.to_upper_above);
            exit_min = Some(t.to_lower_below);
        }
        bands.push(StateBand::new(
            state,
            Bounds {
                min: enter_min,
                max: None,
            },
            Bounds {
                min: exit_min,
                max: None,
            },
        ));

        let mut spec = Self::with_min_time_in_state(bands, min_time_in_state)?;
        spec.ladder = Some(transitions.to_vec());
        Ok(spec)
    }

    pub fn is_ladder(&self) -> bool {
        self.ladder.is_some()
    }

    pub fn bands(&self) -> &[StateBand] {
        &self.bands
    }

    pub fn min_time_in_state(&self) -> f32 {
        self.min_time_in_state
    }

    pub fn band(&self, state: &str) -> Option<&StateBand> {
        self.bands.iter().find(|b| b.state == state)
    }

    /// First declared band whose enter range holds `value`.
    pub fn entered_band(&self, value: f32) -> Option<&StateBand> {
        self.bands.iter().find(|b| b.enter.contains(value))
    }

    /// Band to hold for `value` when `current` is set: `current` itself while
    /// its exit range holds. Ladders then walk rung by rung towards the
    /// value; other specs return `None` and fall back to the enter ranges.
    pub fn held_band(&self, current: &str, value: f32) -> Option<&StateBand> {
        let mut i = self.bands.iter().position(|b| b.state == current)?;
        loop {
            let band = &self.bands[i];
            if band.exit.contains(value) {
                return Some(band);
            }
            if !self.is_ladder() {
                return None;
            }
            if value > band.exit.hi() && i + 1 < self.bands.len() {
                i += 1;
            } else if value < band.exit.lo() && i > 0 {
                i -= 1;
            } else {
                return None;
            }
        }
    }

    pub fn validate(&self) -> Result<(), FeatureStateError> {
        if self.bands.is_empty() {
            return Err(FeatureStateError::invalid("no state bands"));
        }
        if !self.min_time_in_state.is_finite() || self.min_time_in_state < 0.0 {
            return Err(FeatureStateError::invalid(format!(
                "min_time_in_state must be a non-negative number, got {}",
                self.min_time_in_state
            )));
        }

        for (i, band) in self.bands.iter().enumerate() {
            if band.state.is_empty() {
                return Err(FeatureStateError::invalid(format!(
                    "band {} has an empty state name",
                    i
                )));
            }
            band.enter.check("enter", &band.state)?;
            band.exit.check("exit", &band.state)?;
            if !band.exit.contains_range(&band.enter) {
                return Err(FeatureStateError::invalid(format!(
                    "exit range of '{}' does not cover its enter range",
                    band.state
                )));
            }

            for other in &self.bands[..i] {
                if other.state == band.state {
                    return Err(FeatureStateError::invalid(format!(
                        "state '{}' is declared twice",
                        band.state
                    )));
                }
                if other.enter.overlaps(&band.enter) {
                    return Err(FeatureStateError::invalid(format!(
                        "enter ranges of '{}' and '{}' overlap",
                        other.state, band.state
                    )));
                }
            }
        }
        Ok(())
    }
}

impl TryFrom<ThresholdDef> for ThresholdSpec {
    type Error = FeatureStateError;

    fn try_from(def: ThresholdDef) -> Result<Self, Self::Error> {
        match def {
            ThresholdDef::Bands {
                bands,
                min_time_in_state,
            } => Self::with_min_time_in_state(bands, min_time_in_state),
            ThresholdDef::Transitions {
                transitions,
                min_time_in_state,
            } => Self::from_transitions(&transitions, min_time_in_state),
        }
    }
}

impl From<ThresholdSpec> for ThresholdDef {
    fn from(spec: ThresholdSpec) -> Self {
        match spec.ladder {
            Some(transitions) => ThresholdDef::Transitions {
                transitions,
                min_time_in_state: spec.min_time_in_state,
            },
            None => ThresholdDef::Bands {
                bands: spec.bands,
                min_time_in_state: spec.min_time_in_state,
            },
        }
    }
}

/// Threshold specs keyed by feature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureThresholds(BTreeMap<TransformFeature, ThresholdSpec>);

impl FeatureThresholds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, feature: TransformFeature, spec: ThresholdSpec) -> Self {
        self.insert(feature, spec);
        self
    }

    pub fn insert(&mut self, feature: TransformFeature, spec: ThresholdSpec) -> Option<ThresholdSpec> {
        self.0.insert(feature, spec)
    }

    pub fn get(&self, feature: TransformFeature) -> Option<&ThresholdSpec> {
        self.0.get(&feature)
    }

    pub fn contains(&self, feature: TransformFeature) -> bool {
        self.0.contains_key(&feature)
    }

    pub fn features(&self) -> impl Iterator<Item = TransformFeature> + '_ {
        self.0.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_are_inclusive() {
        let b = Bounds::between(0.2, 0.4);
        assert!(b.contains(0.2));
        assert!(b.contains(0.4));
        assert!(!b.contains(0.41));
        assert!(Bounds::UNBOUNDED.contains(f32::MAX));
    }

    #[test]
    fn touching_ranges_overlap() {
        assert!(Bounds::at_most(0.5).overlaps(&Bounds::at_least(0.5)));
        assert!(!Bounds::at_most(0.49).overlaps(&Bounds::at_least(0.5)));
    }

    #[test]
    fn nan_bound_is_rejected() {
        let err = Bounds::at_least(f32::NAN).check("enter", "Open").unwrap_err();
        assert!(matches!(err, FeatureStateError::InvalidThresholds { .. }));
    }
}
