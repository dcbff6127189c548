use crate::foundation::core::Rect;

/// Cubic Bezier coordinate at parameter `t` for one axis.
pub(crate) fn cubic_coord(t: f64, p0: f64, p1: f64, p2: f64, p3: f64) -> f64 {
    let mt = 1.0 - t;
    mt * mt * mt * p0 + 3.0 * t * mt * mt * p1 + 3.0 * t * t * mt * p2 + t * t * t * p3
}

pub(crate) fn distance(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    let dx = x2 - x1;
    let dy = y2 - y1;
    (dx * dx + dy * dy).sqrt()
}

/// Grow `bounds` so it contains `(x, y)`.
///
/// Unlike `Rect::union_pt` this keeps the running box unnormalized, so a box seeded from a single
/// point stays well-defined.
pub(crate) fn expand_to_include(bounds: &mut Rect, x: f64, y: f64) {
    if x < bounds.x0 {
        bounds.x0 = x;
    }
    if x > bounds.x1 {
        bounds.x1 = x;
    }
    if y < bounds.y0 {
        bounds.y0 = y;
    }
    if y > bounds.y1 {
        bounds.y1 = y;
    }
}

pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

pub(crate) fn mul_div255_u8(x: u16, y: u16) -> u8 {
    mul_div255_u16(x, y) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
