use crate::animation::keyframe::SampleCtx;
use crate::foundation::core::Rgba8;
use crate::foundation::error::KeyreelResult;
use crate::scene::model::Effect;

/// An [`Effect`] evaluated at one instant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Fx {
    Blur { sigma: f64 },
    Opacity { value: f64 },
    Tint { color: Rgba8, amount: f64 },
}

impl Fx {
    /// Effects that leave the buffer unchanged are skipped by the renderer.
    pub fn is_noop(&self) -> bool {
        match *self {
            Self::Blur { sigma } => !(sigma > 0.0),
            Self::Opacity { value } => value >= 1.0,
            Self::Tint { amount, .. } => !(amount > 0.0),
        }
    }
}

pub fn resolve_effect(effect: &Effect, ctx: SampleCtx) -> KeyreelResult<Fx> {
    Ok(match effect {
        Effect::Blur { radius } => Fx::Blur {
            sigma: radius.sample_scalar(ctx)?,
        },
        Effect::Opacity { value } => Fx::Opacity {
            value: value.sample_scalar(ctx)?.clamp(0.0, 1.0),
        },
        Effect::Tint { color, amount } => Fx::Tint {
            color: Rgba8::from_unit_rgb(&color.sample(ctx)?),
            amount: amount.sample_scalar(ctx)?.clamp(0.0, 1.0),
        },
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/effects.rs"]
mod tests;
