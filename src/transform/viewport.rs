use crate::foundation::core::{Affine, Canvas, Vec2};

/// Map the active composition's unit-height space onto the output raster.
///
/// Composition space is centered on the origin and spans `[-aspect / 2, aspect / 2] x [-0.5, 0.5]`.
/// The fitted area keeps the raster width when the composition is at least as wide as the raster
/// and the raster height otherwise; it is anchored at the raster's top-left corner.
pub fn viewport_affine(canvas: Canvas, composition_aspect: f64) -> Affine {
    let frame_aspect = canvas.aspect();
    let mut width = f64::from(canvas.width);
    let mut height = f64::from(canvas.height);
    if composition_aspect >= frame_aspect {
        height = width / composition_aspect;
    } else {
        width = height * composition_aspect;
    }
    Affine::scale_non_uniform(width / composition_aspect, height)
        * Affine::translate(Vec2::new(composition_aspect / 2.0, 0.5))
}

#[cfg(test)]
#[path = "../../tests/unit/transform/viewport.rs"]
mod tests;
