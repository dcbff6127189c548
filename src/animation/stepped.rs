use crate::animation::keyframe::{SampleCtx, bracket};
use crate::foundation::error::{KeyreelError, KeyreelResult};

/// One discrete step of a [`SteppedProperty`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Step<T> {
    pub time: f64,
    pub value: T,
}

/// Property authored as discrete steps (no easing), e.g. a gradient definition.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct SteppedProperty<T> {
    pub steps: Vec<Step<T>>,
}

impl<T> SteppedProperty<T> {
    pub fn new(steps: Vec<Step<T>>) -> Self {
        Self { steps }
    }

    pub fn constant(value: T) -> Self {
        Self::new(vec![Step { time: 0.0, value }])
    }

    pub fn validate(&self) -> KeyreelResult<()> {
        if self.steps.is_empty() {
            return Err(KeyreelError::animation(
                "stepped property must have at least one step",
            ));
        }
        if !self.steps.windows(2).all(|w| w[0].time <= w[1].time) {
            return Err(KeyreelError::animation("step times must be non-decreasing"));
        }
        Ok(())
    }

    /// Value of the step in effect at `ctx`, holding the first step before it starts.
    pub fn sample(&self, ctx: SampleCtx) -> KeyreelResult<&T> {
        if self.steps.is_empty() {
            return Err(KeyreelError::animation(
                "cannot sample a stepped property with no steps",
            ));
        }
        let b = bracket(self.steps.iter().map(|s| s.time), ctx.local_time());
        Ok(&self.steps[b.left].value)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/stepped.rs"]
mod tests;
