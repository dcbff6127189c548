use crate::foundation::core::{Affine, Point, Rect, Rgba8};
use crate::foundation::math::distance;
use crate::scene::model::{Gradient, GradientKind};

/// Gradient stop in brush space. Offsets are not clamped to `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorStop {
    pub offset: f64,
    pub color: Rgba8,
}

/// Concrete fill handed to a drawing surface.
#[derive(Clone, Debug, PartialEq)]
pub enum Brush {
    Solid(Rgba8),
    Linear {
        start: Point,
        end: Point,
        stops: Vec<ColorStop>,
    },
    /// Disc centered on `center`; stop offsets are fractions of `radius`.
    Radial {
        center: Point,
        radius: f64,
        /// Factor already applied to the authored stop positions.
        stop_scale: f64,
        stops: Vec<ColorStop>,
    },
}

impl Brush {
    /// Distance from the center at which a radial brush reaches its authored last stop.
    pub fn effective_radius(&self) -> Option<f64> {
        match self {
            Self::Radial {
                radius, stop_scale, ..
            } => Some(radius * stop_scale),
            _ => None,
        }
    }
}

fn box_point(bounds: Rect, frac: [f64; 2]) -> Point {
    Point::new(
        bounds.x0 + bounds.width() * frac[0],
        bounds.y0 + bounds.height() * frac[1],
    )
}

/// Map `gradient` onto `bounds`.
///
/// Radial gradients measure the `from -> to` distance against the distance from `from` to the box
/// corner opposite the center, and scale the stop positions by that ratio. Identical `from` and
/// `to` points collapse every stop onto the center.
pub fn resolve_gradient(gradient: &Gradient, bounds: Rect) -> Brush {
    let start = box_point(bounds, gradient.from);
    let [fx, fy] = gradient.from;
    let [tx, ty] = gradient.to;

    let scaled = |scale: f64| -> Vec<ColorStop> {
        gradient
            .stops
            .iter()
            .map(|s| ColorStop {
                offset: s.position * scale,
                color: s.color,
            })
            .collect()
    };

    match gradient.kind {
        GradientKind::Linear => Brush::Linear {
            start,
            end: box_point(bounds, gradient.to),
            stops: scaled(1.0),
        },
        GradientKind::Radial => {
            // Fold `from` into the positive quadrant of [-0.5, 0.5] and measure to the far corner.
            let extent = distance((fx - 0.5).abs(), (fy - 0.5).abs(), -0.5, -0.5);
            let stop_scale = distance(fx, fy, tx, ty) / extent;
            let (w, h) = (bounds.width(), bounds.height());
            let radius = if w > h { w * extent } else { h * extent };
            Brush::Radial {
                center: start,
                radius,
                stop_scale,
                stops: scaled(stop_scale),
            }
        }
    }
}

/// Scale applied to the surface before filling with a radial brush on a `width x height` box, so
/// the brush disc renders as an ellipse filling the box.
pub fn radial_correction(kind: GradientKind, width: f64, height: f64) -> Affine {
    if kind != GradientKind::Radial || width == height {
        return Affine::IDENTITY;
    }
    if width > height {
        Affine::scale_non_uniform(1.0, height / width)
    } else {
        Affine::scale_non_uniform(width / height, 1.0)
    }
}

/// Stretch `bounds` to a square in the space produced by [`radial_correction`].
///
/// Linear gradients and square boxes are returned unchanged.
pub fn square_bounds(kind: GradientKind, bounds: Rect) -> Rect {
    if kind != GradientKind::Radial {
        return bounds;
    }
    let (w, h) = (bounds.width(), bounds.height());
    if w == h {
        return bounds;
    }
    let mut out = bounds;
    if w > h {
        out.y0 *= w / h;
        out.y1 = out.y0 + w;
    } else {
        out.x0 *= h / w;
        out.x1 = out.x0 + h;
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/paint/gradient.rs"]
mod tests;
