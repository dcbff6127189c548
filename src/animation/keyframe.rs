use crate::animation::bezier::solve_time;
use crate::foundation::core::{Sample, Vec2};
use crate::foundation::error::{KeyreelError, KeyreelResult};
use crate::foundation::math::cubic_coord;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
/// Sampling context provided to property evaluators.
///
/// `time` is the playback position of the frame being drawn; `nested_offset` is the accumulated
/// start offset of the nested compositions currently being traversed. Properties are looked up in
/// their own composition's local timeline, `time - nested_offset`.
pub struct SampleCtx {
    /// Playback position in milliseconds.
    pub time: f64,
    /// Sum of enclosing nested-composition start offsets.
    pub nested_offset: f64,
}

impl SampleCtx {
    /// Context for a top-level (non-nested) lookup.
    pub fn at(time: f64) -> Self {
        Self {
            time,
            nested_offset: 0.0,
        }
    }

    pub fn local_time(self) -> f64 {
        self.time - self.nested_offset
    }
}

/// Bezier easing handle of a keyframe, relative to the keyframe's own time and value.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ControlPoint {
    #[serde(default)]
    pub time: f64,
    #[serde(default)]
    pub value: Vec<f64>,
}

impl ControlPoint {
    /// Handle ordinate for component `n`; absent components read as 0.
    pub fn component(&self, n: usize) -> f64 {
        self.value.get(n).copied().unwrap_or(0.0)
    }
}

/// One authored `(time, value)` anchor.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Keyframe {
    pub time: f64,
    pub value: Vec<f64>,
    /// Incoming handle.
    #[serde(default)]
    pub cp1: ControlPoint,
    /// Outgoing handle.
    #[serde(default)]
    pub cp2: ControlPoint,
}

impl Keyframe {
    /// Keyframe without easing handles.
    pub fn new(time: f64, value: impl Into<Vec<f64>>) -> Self {
        Self {
            time,
            value: value.into(),
            cp1: ControlPoint::default(),
            cp2: ControlPoint::default(),
        }
    }

    pub fn with_cp1(mut self, time: f64, value: impl Into<Vec<f64>>) -> Self {
        self.cp1 = ControlPoint {
            time,
            value: value.into(),
        };
        self
    }

    pub fn with_cp2(mut self, time: f64, value: impl Into<Vec<f64>>) -> Self {
        self.cp2 = ControlPoint {
            time,
            value: value.into(),
        };
        self
    }

    fn component(&self, n: usize) -> f64 {
        self.value.get(n).copied().unwrap_or(0.0)
    }
}

/// Indices of the keyframes bracketing a lookup position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Bracket {
    pub(crate) left: usize,
    pub(crate) right: Option<usize>,
}

/// Locate the keys around `position` in a time-sorted sequence.
///
/// `left` is the last key with `time <= position`; the scan stops at the first key with
/// `time >= position`, which becomes `right` (and also `left` when nothing precedes it).
pub(crate) fn bracket(times: impl IntoIterator<Item = f64>, position: f64) -> Bracket {
    let mut left = None;
    let mut right = None;
    for (i, time) in times.into_iter().enumerate() {
        if time <= position {
            left = Some(i);
        }
        if time >= position {
            left.get_or_insert(i);
            right = Some(i);
            break;
        }
    }
    Bracket {
        // Only an unordered position (NaN) leaves `left` unset.
        left: left.unwrap_or(0),
        right,
    }
}

/// Time-indexed numeric vector with hold semantics at both ends.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct AnimatedProperty {
    /// Keyframes sorted by non-decreasing `time`.
    pub keys: Vec<Keyframe>,
}

impl AnimatedProperty {
    pub fn new(keys: Vec<Keyframe>) -> Self {
        Self { keys }
    }

    /// Property holding `value` at every time.
    pub fn constant(value: impl Into<Vec<f64>>) -> Self {
        Self::new(vec![Keyframe::new(0.0, value)])
    }

    /// Validate static invariants: at least one key, sorted times, uniform component count.
    pub fn validate(&self) -> KeyreelResult<()> {
        let Some(first) = self.keys.first() else {
            return Err(KeyreelError::animation(
                "animated property must have at least one keyframe",
            ));
        };
        if !self.keys.windows(2).all(|w| w[0].time <= w[1].time) {
            return Err(KeyreelError::animation(
                "keyframe times must be non-decreasing",
            ));
        }
        if self.keys.iter().any(|k| k.value.len() != first.value.len()) {
            return Err(KeyreelError::animation(
                "all keyframes of a property must have the same number of components",
            ));
        }
        Ok(())
    }

    /// Sample the property at `ctx`, easing between keyframes.
    pub fn sample(&self, ctx: SampleCtx) -> KeyreelResult<Sample> {
        if self.keys.is_empty() {
            return Err(KeyreelError::animation(
                "cannot sample an animated property with no keyframes",
            ));
        }
        let position = ctx.local_time();
        let Bracket { left, right } = bracket(self.keys.iter().map(|k| k.time), position);
        let a = &self.keys[left];
        let Some(right) = right else {
            return Ok(Sample::from_slice(&a.value));
        };
        let b = &self.keys[right];
        if a.time == b.time {
            return Ok(Sample::from_slice(&a.value));
        }

        let components = a.value.len();
        let eased = (0..components.max(a.cp2.value.len()))
            .any(|n| a.cp2.component(n) != 0.0 || b.cp1.component(n) != 0.0);
        if !eased {
            let span = b.time - a.time;
            return Ok((0..components)
                .map(|n| {
                    (b.component(n) * (position - a.time) + a.value[n] * (b.time - position))
                        / span
                })
                .collect());
        }

        let solve = solve_time(
            a.time,
            a.time + a.cp2.time,
            b.time + b.cp1.time,
            b.time,
            position,
        );
        let t = solve.t;
        Ok((0..components)
            .map(|n| {
                let av = a.value[n];
                let bv = b.component(n);
                cubic_coord(t, av, av + a.cp2.component(n), bv + b.cp1.component(n), bv)
            })
            .collect())
    }

    /// Return the bracketing left keyframe's value without interpolation.
    pub fn sample_step(&self, ctx: SampleCtx) -> KeyreelResult<&[f64]> {
        if self.keys.is_empty() {
            return Err(KeyreelError::animation(
                "cannot sample an animated property with no keyframes",
            ));
        }
        let b = bracket(self.keys.iter().map(|k| k.time), ctx.local_time());
        Ok(&self.keys[b.left].value)
    }

    /// First component of the sampled value (0 when the value is empty).
    pub fn sample_scalar(&self, ctx: SampleCtx) -> KeyreelResult<f64> {
        Ok(self.sample(ctx)?.first().copied().unwrap_or(0.0))
    }

    /// First two components of the sampled value as a vector.
    pub fn sample_vec2(&self, ctx: SampleCtx) -> KeyreelResult<Vec2> {
        let v = self.sample(ctx)?;
        Ok(vec2_of(&v))
    }
}

pub(crate) fn vec2_of(v: &[f64]) -> Vec2 {
    Vec2::new(
        v.first().copied().unwrap_or(0.0),
        v.get(1).copied().unwrap_or(0.0),
    )
}

impl From<Vec<Keyframe>> for AnimatedProperty {
    fn from(keys: Vec<Keyframe>) -> Self {
        Self::new(keys)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/keyframe.rs"]
mod tests;
