use crate::foundation::core::{Affine, BezPath, Canvas, Rect, Rgba8};
use crate::foundation::error::KeyreelResult;
use crate::media::frame::MediaFrame;
use crate::paint::gradient::Brush;
use crate::render::effects::Fx;

/// How a popped layer is combined with the layer beneath it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayerBlend {
    /// Source-over at the current global alpha, inside the current clip.
    Over,
    /// Keep the destination only where the layer has coverage (alpha multiply).
    DestinationIn,
}

/// Text draw request in the current transform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextRun<'a> {
    pub text: &'a str,
    pub font: Option<&'a str>,
    /// Em size in the current coordinate space.
    pub size: f64,
    pub color: Rgba8,
}

/// Immediate-mode 2D surface the scene renderer draws onto.
///
/// State (transform, global alpha, clip) follows the usual save/restore discipline. Layers are
/// off-screen buffers the size of the canvas; drawing targets the top layer until it is popped.
pub trait DrawSurface {
    fn canvas(&self) -> Canvas;

    /// Push a copy of the current state.
    fn save(&mut self);

    /// Pop the state pushed by the matching [`DrawSurface::save`].
    fn restore(&mut self) -> KeyreelResult<()>;

    fn set_transform(&mut self, transform: Affine);

    fn transform(&self) -> Affine;

    /// Post-multiply the current transform.
    fn concat(&mut self, transform: Affine) {
        let t = self.transform();
        self.set_transform(t * transform);
    }

    /// Intersect the clip with `rect` in the current transform.
    fn clip_rect(&mut self, rect: Rect);

    /// Drop every clip in the current state. A later `restore` brings them back.
    fn reset_clip(&mut self);

    /// Set (not multiply) the alpha applied to subsequent draws.
    fn set_global_alpha(&mut self, alpha: f64);

    fn global_alpha(&self) -> f64;

    /// Fill `path` with the even-odd rule. The brush is placed by `transform * paint_transform`.
    fn fill_path(&mut self, path: &BezPath, brush: &Brush, paint_transform: Affine)
    -> KeyreelResult<()>;

    fn stroke_path(&mut self, path: &BezPath, width: f64, color: Rgba8) -> KeyreelResult<()>;

    fn fill_rect(&mut self, rect: Rect, brush: &Brush, paint_transform: Affine)
    -> KeyreelResult<()>;

    /// Make the whole top layer transparent, ignoring transform and clip.
    fn clear(&mut self) -> KeyreelResult<()>;

    /// Start drawing into a fresh transparent layer.
    fn push_layer(&mut self) -> KeyreelResult<()>;

    /// Combine the top layer into the one beneath and discard it.
    fn pop_layer(&mut self, blend: LayerBlend) -> KeyreelResult<()>;

    /// Gaussian blur of the top layer with `sigma` in device pixels.
    fn blur_layer(&mut self, sigma: f64) -> KeyreelResult<()>;

    /// Apply a post-effect to the top layer.
    fn apply_effect(&mut self, fx: &Fx) -> KeyreelResult<()>;

    /// Blit `frame` with its top-left corner at the origin of the current transform.
    fn draw_image(&mut self, frame: &MediaFrame) -> KeyreelResult<()>;

    fn draw_text(&mut self, run: &TextRun<'_>) -> KeyreelResult<()>;
}

/// Run `f` between `save` and `restore`; the state is restored even when `f` fails.
pub fn with_saved<S, R>(
    surface: &mut S,
    f: impl FnOnce(&mut S) -> KeyreelResult<R>,
) -> KeyreelResult<R>
where
    S: DrawSurface + ?Sized,
{
    surface.save();
    let out = f(surface);
    let restored = surface.restore();
    let out = out?;
    restored?;
    Ok(out)
}

/// Run `f` inside a fresh layer and pop it with `blend`.
///
/// When `f` fails the layer is cleared and popped as a no-op so the layer stack stays balanced.
pub fn with_layer<S, R>(
    surface: &mut S,
    blend: LayerBlend,
    f: impl FnOnce(&mut S) -> KeyreelResult<R>,
) -> KeyreelResult<R>
where
    S: DrawSurface + ?Sized,
{
    surface.push_layer()?;
    let out = f(surface);
    let blend = match out {
        Ok(_) => blend,
        Err(_) => {
            let _ = surface.clear();
            LayerBlend::Over
        }
    };
    let popped = surface.pop_layer(blend);
    let out = out?;
    popped?;
    Ok(out)
}
