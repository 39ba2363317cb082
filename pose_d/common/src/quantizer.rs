use crate::thresholds::ThresholdSpec;

/// Identifies one evaluation cycle. `tick_id` must strictly increase,
/// `time` is the frame time in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickContext {
    pub tick_id: u64,
    pub time: f64,
}

impl TickContext {
    pub fn new(tick_id: u64, time: f64) -> Self {
        Self { tick_id, time }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChange {
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
struct PendingState {
    target: Option<String>,
    since: f64,
}

/// Hysteresis state of a single feature.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureStateQuantizer {
    current: Option<String>,
    last_tick: Option<u64>,
    touched: bool,
    pending: Option<PendingState>,
}

impl FeatureStateQuantizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn last_tick(&self) -> Option<u64> {
        self.last_tick
    }

    pub fn is_touched(&self) -> bool {
        self.touched
    }

    pub fn touch(&mut self) {
        self.touched = true;
    }

    pub fn is_fresh(&self, tick_id: u64) -> bool {
        self.last_tick == Some(tick_id)
    }

    /// Marks the tick as evaluated without a value, keeping the state.
    pub fn skip(&mut self, tick_id: u64) {
        self.last_tick = Some(tick_id);
    }

    /// Forces the next evaluation to run, even within the same tick, and
    /// drops any pending transition.
    pub fn invalidate(&mut self) {
        self.last_tick = None;
        self.pending = None;
    }

    pub fn reset(&mut self) {
        *self = Self {
            touched: self.touched,
            ..Self::default()
        };
    }

    /// State the band rules ask for, ignoring `min_time_in_state`.
    pub fn desired_state<'a>(&self, value: f32, spec: &'a ThresholdSpec) -> Option<&'a str> {
        if let Some(band) = self.current.as_deref().and_then(|s| spec.held_band(s, value)) {
            return Some(band.state.as_str());
        }
        spec.entered_band(value).map(|b| b.state.as_str())
    }

    /// Feeds one value. A second call within the same tick is a no-op.
    pub fn evaluate(
        &mut self,
        ctx: TickContext,
        value: f32,
        spec: &ThresholdSpec,
    ) -> Option<StateChange> {
        if self.is_fresh(ctx.tick_id) {
            return None;
        }
        self.last_tick = Some(ctx.tick_id);

        let desired = self.desired_state(value, spec).map(str::to_owned);
        if desired == self.current {
            self.pending = None;
            return None;
        }

        let min_time = f64::from(spec.min_time_in_state());
        if self.current.is_some() && min_time > 0.0 {
            let pending_since = match &self.pending {
                Some(p) if p.target == desired => Some(p.since),
                _ => None,
            };
            let Some(since) = pending_since else {
                self.pending = Some(PendingState {
                    target: desired,
                    since: ctx.time,
                });
                return None;
            };
            if ctx.time - since < min_time {
                return None;
            }
        }

        self.pending = None;
        let from = std::mem::replace(&mut self.current, desired);
        Some(StateChange {
            from,
            to: self.current.clone(),
        })
    }
}
