use std::sync::Arc;

use kurbo::Shape as _;
use smallvec::SmallVec;

use crate::foundation::core::{Affine, BezPath, Canvas, Rect, Rgba8};
use crate::foundation::error::{KeyreelError, KeyreelResult};
use crate::media::frame::MediaFrame;
use crate::paint::gradient::{Brush, ColorStop};
use crate::render::blur::blur_rgba8_premul_in_place;
use crate::render::composite::{
    destination_in_in_place, over_in_place, premultiply_in_place, scale_alpha_in_place,
    tint_in_place, unpremultiply_in_place,
};
use crate::render::effects::Fx;
use crate::render::surface::{DrawSurface, LayerBlend, TextRun};
use crate::render::surface_pool::{SurfacePool, SurfacePoolOpts};
use crate::render::text::{TextLayoutEngine, first_baseline, positioned_glyphs};

/// Read-back of a rendered frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameRgba {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

impl FrameRgba {
    /// Convert to straight alpha, as image encoders expect.
    pub fn into_straight(mut self) -> Self {
        if self.premultiplied {
            unpremultiply_in_place(&mut self.data);
            self.premultiplied = false;
        }
        self
    }
}

#[derive(Clone, Debug)]
struct State {
    transform: Affine,
    alpha: f64,
    /// Clip rectangles with the transform current when each was installed.
    clips: SmallVec<[(Affine, Rect); 4]>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            transform: Affine::IDENTITY,
            alpha: 1.0,
            clips: SmallVec::new(),
        }
    }
}

/// Raster [`DrawSurface`] on `vello_cpu`.
///
/// Vector draws are encoded into a `vello_cpu` context and rasterized lazily: before any pixel
/// access the pending commands are rendered into a scratch pixmap and composited over the top
/// layer. Layers are pooled pixmaps the size of the canvas; `layers[0]` is the output.
pub struct CpuSurface {
    canvas: Canvas,
    ctx: vello_cpu::RenderContext,
    pool: SurfacePool,
    layers: Vec<vello_cpu::Pixmap>,
    scratch: vello_cpu::Pixmap,
    state: State,
    saved: Vec<State>,
    pending: bool,
    text: TextLayoutEngine,
    text_warned: bool,
}

impl CpuSurface {
    pub fn new(canvas: Canvas) -> KeyreelResult<Self> {
        Self::with_pool(canvas, SurfacePoolOpts::default())
    }

    pub fn with_pool(canvas: Canvas, opts: SurfacePoolOpts) -> KeyreelResult<Self> {
        if canvas.width == 0 || canvas.height == 0 {
            return Err(KeyreelError::render("surface width and height must be > 0"));
        }
        let mut pool = SurfacePool::new(opts);
        let mut target = pool.borrow(canvas.width, canvas.height)?;
        clear_pixmap_to_transparent(&mut target);
        let scratch = pool.borrow(canvas.width, canvas.height)?;
        let ctx = vello_cpu::RenderContext::new(target.width(), target.height());
        Ok(Self {
            canvas,
            ctx,
            pool,
            layers: vec![target],
            scratch,
            state: State::default(),
            saved: Vec::new(),
            pending: false,
            text: TextLayoutEngine::new(),
            text_warned: false,
        })
    }

    /// Make a font available to text objects and return its family name.
    ///
    /// Text names a family with its `font` field; unknown or missing names use the first
    /// registered font.
    pub fn register_font(&mut self, bytes: Vec<u8>) -> KeyreelResult<String> {
        self.text.register_font(bytes)
    }

    pub fn register_font_file(
        &mut self,
        path: impl AsRef<std::path::Path>,
    ) -> KeyreelResult<String> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| KeyreelError::validation(format!("read font {}: {e}", path.display())))?;
        self.register_font(bytes)
    }

    pub fn pool(&self) -> &SurfacePool {
        &self.pool
    }

    /// Premultiplied RGBA8 of the output layer.
    pub fn data(&mut self) -> KeyreelResult<&[u8]> {
        self.settle()?;
        Ok(self.layers[0].data_as_u8_slice())
    }

    /// Premultiplied pixel of the output layer.
    pub fn pixel(&mut self, x: u32, y: u32) -> KeyreelResult<[u8; 4]> {
        if x >= self.canvas.width || y >= self.canvas.height {
            return Err(KeyreelError::render(format!(
                "pixel ({x}, {y}) outside {}x{} surface",
                self.canvas.width, self.canvas.height
            )));
        }
        let width = self.canvas.width as usize;
        let data = self.data()?;
        let i = (y as usize * width + x as usize) * 4;
        Ok([data[i], data[i + 1], data[i + 2], data[i + 3]])
    }

    /// Copy out the output layer. Fails while layers are still pushed.
    pub fn finish(&mut self) -> KeyreelResult<FrameRgba> {
        if self.layers.len() != 1 {
            return Err(KeyreelError::render(format!(
                "{} layer(s) still pushed at finish",
                self.layers.len() - 1
            )));
        }
        let data = self.data()?.to_vec();
        Ok(FrameRgba {
            width: self.canvas.width,
            height: self.canvas.height,
            data,
            premultiplied: true,
        })
    }

    fn top_mut(&mut self) -> &mut vello_cpu::Pixmap {
        let last = self.layers.len() - 1;
        &mut self.layers[last]
    }

    /// Rasterize pending vector commands onto the top layer.
    fn settle(&mut self) -> KeyreelResult<()> {
        if !self.pending {
            return Ok(());
        }
        self.pending = false;
        self.ctx.flush();
        clear_pixmap_to_transparent(&mut self.scratch);
        self.ctx.render_to_pixmap(&mut self.scratch);
        self.ctx.reset();

        let last = self.layers.len() - 1;
        over_in_place(
            self.layers[last].data_as_u8_slice_mut(),
            self.scratch.data_as_u8_slice(),
            1.0,
        )
    }

    /// Encode one draw under the current transform, clip and global alpha.
    fn encode(
        &mut self,
        paint_transform: Affine,
        draw: impl FnOnce(&mut vello_cpu::RenderContext),
    ) {
        self.encode_in(self.state.transform, paint_transform, draw);
    }

    /// Like [`CpuSurface::encode`] with an explicit geometry transform.
    fn encode_in(
        &mut self,
        transform: Affine,
        paint_transform: Affine,
        draw: impl FnOnce(&mut vello_cpu::RenderContext),
    ) {
        let alpha = self.state.alpha.clamp(0.0, 1.0);
        if alpha <= 0.0 {
            return;
        }

        let ctx = &mut self.ctx;
        for (t, r) in &self.state.clips {
            ctx.set_transform(affine_to_cpu(*t));
            ctx.push_clip_layer(&rect_to_cpu(*r));
        }
        ctx.set_transform(affine_to_cpu(transform));
        ctx.set_paint_transform(affine_to_cpu(paint_transform));
        ctx.set_fill_rule(vello_cpu::peniko::Fill::EvenOdd);
        if alpha < 1.0 {
            ctx.push_opacity_layer(alpha as f32);
        }
        draw(ctx);
        if alpha < 1.0 {
            ctx.pop_layer();
        }
        for _ in &self.state.clips {
            ctx.pop_layer();
        }
        self.pending = true;
    }

    /// Coverage of the current clip as an alpha pixmap, or `None` when nothing is clipped.
    fn clip_coverage(&mut self) -> KeyreelResult<Option<vello_cpu::Pixmap>> {
        if self.state.clips.is_empty() {
            return Ok(None);
        }
        let mut coverage = self.pool.borrow(self.canvas.width, self.canvas.height)?;
        clear_pixmap_to_transparent(&mut coverage);

        let ctx = &mut self.ctx;
        for (t, r) in &self.state.clips {
            ctx.set_transform(affine_to_cpu(*t));
            ctx.push_clip_layer(&rect_to_cpu(*r));
        }
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(255, 255, 255, 255));
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(self.canvas.width),
            f64::from(self.canvas.height),
        ));
        for _ in &self.state.clips {
            ctx.pop_layer();
        }
        ctx.flush();
        ctx.render_to_pixmap(&mut coverage);
        ctx.reset();
        Ok(Some(coverage))
    }
}

impl DrawSurface for CpuSurface {
    fn canvas(&self) -> Canvas {
        self.canvas
    }

    fn save(&mut self) {
        self.saved.push(self.state.clone());
    }

    fn restore(&mut self) -> KeyreelResult<()> {
        self.state = self
            .saved
            .pop()
            .ok_or_else(|| KeyreelError::render("restore without matching save"))?;
        Ok(())
    }

    fn set_transform(&mut self, transform: Affine) {
        self.state.transform = transform;
    }

    fn transform(&self) -> Affine {
        self.state.transform
    }

    fn clip_rect(&mut self, rect: Rect) {
        self.state.clips.push((self.state.transform, rect));
    }

    fn reset_clip(&mut self) {
        self.state.clips.clear();
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.state.alpha = alpha;
    }

    fn global_alpha(&self) -> f64 {
        self.state.alpha
    }

    fn fill_path(
        &mut self,
        path: &BezPath,
        brush: &Brush,
        paint_transform: Affine,
    ) -> KeyreelResult<()> {
        let path = bezpath_to_cpu(path);
        self.encode(paint_transform, |ctx| {
            set_brush(ctx, brush);
            ctx.fill_path(&path);
        });
        Ok(())
    }

    fn stroke_path(&mut self, path: &BezPath, width: f64, color: Rgba8) -> KeyreelResult<()> {
        if !(width > 0.0) {
            return Ok(());
        }
        let path = bezpath_to_cpu(path);
        let stroke = vello_cpu::kurbo::Stroke::new(width)
            .with_join(vello_cpu::kurbo::Join::Miter)
            .with_caps(vello_cpu::kurbo::Cap::Butt)
            .with_miter_limit(10.0);
        self.encode(Affine::IDENTITY, |ctx| {
            ctx.set_paint(color_to_cpu(color));
            ctx.set_stroke(stroke);
            ctx.stroke_path(&path);
        });
        Ok(())
    }

    fn fill_rect(&mut self, rect: Rect, brush: &Brush, paint_transform: Affine) -> KeyreelResult<()> {
        let rect = vello_cpu::kurbo::Rect::new(rect.x0, rect.y0, rect.x1, rect.y1);
        self.encode(paint_transform, |ctx| {
            set_brush(ctx, brush);
            ctx.fill_rect(&rect);
        });
        Ok(())
    }

    fn clear(&mut self) -> KeyreelResult<()> {
        self.settle()?;
        clear_pixmap_to_transparent(self.top_mut());
        Ok(())
    }

    fn push_layer(&mut self) -> KeyreelResult<()> {
        self.settle()?;
        let mut layer = self.pool.borrow(self.canvas.width, self.canvas.height)?;
        clear_pixmap_to_transparent(&mut layer);
        self.layers.push(layer);
        Ok(())
    }

    fn pop_layer(&mut self, blend: LayerBlend) -> KeyreelResult<()> {
        if self.layers.len() < 2 {
            return Err(KeyreelError::render("pop_layer without matching push_layer"));
        }
        self.settle()?;
        let Some(mut src) = self.layers.pop() else {
            return Err(KeyreelError::render("layer stack is empty"));
        };

        let result = match blend {
            LayerBlend::Over => {
                let coverage = self.clip_coverage()?;
                let mut out = Ok(());
                if let Some(coverage) = coverage {
                    out = destination_in_in_place(
                        src.data_as_u8_slice_mut(),
                        coverage.data_as_u8_slice(),
                    );
                    self.pool.release(coverage);
                }
                let alpha = self.state.alpha;
                out.and_then(|()| {
                    over_in_place(
                        self.top_mut().data_as_u8_slice_mut(),
                        src.data_as_u8_slice(),
                        alpha,
                    )
                })
            }
            LayerBlend::DestinationIn => destination_in_in_place(
                self.top_mut().data_as_u8_slice_mut(),
                src.data_as_u8_slice(),
            ),
        };
        self.pool.release(src);
        result
    }

    fn blur_layer(&mut self, sigma: f64) -> KeyreelResult<()> {
        self.settle()?;
        let (w, h) = (self.canvas.width, self.canvas.height);
        blur_rgba8_premul_in_place(self.top_mut().data_as_u8_slice_mut(), w, h, sigma)
    }

    fn apply_effect(&mut self, fx: &Fx) -> KeyreelResult<()> {
        self.settle()?;
        match *fx {
            Fx::Blur { sigma } => self.blur_layer(sigma),
            Fx::Opacity { value } => {
                scale_alpha_in_place(self.top_mut().data_as_u8_slice_mut(), value);
                Ok(())
            }
            Fx::Tint { color, amount } => {
                tint_in_place(self.top_mut().data_as_u8_slice_mut(), color, amount);
                Ok(())
            }
        }
    }

    fn draw_image(&mut self, frame: &MediaFrame) -> KeyreelResult<()> {
        if frame.width == 0 || frame.height == 0 {
            return Ok(());
        }
        let mut premul = frame.rgba.as_slice().to_vec();
        premultiply_in_place(&mut premul);
        let pixmap = pixmap_from_premul_bytes(&premul, frame.width, frame.height)?;
        let image = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };
        let rect = vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(frame.width),
            f64::from(frame.height),
        );
        self.encode(Affine::IDENTITY, |ctx| {
            ctx.set_paint(image);
            ctx.fill_rect(&rect);
        });
        Ok(())
    }

    fn draw_text(&mut self, run: &TextRun<'_>) -> KeyreelResult<()> {
        let Some(font) = self.text.resolve(run.font).cloned() else {
            if !self.text_warned {
                self.text_warned = true;
                tracing::warn!(
                    text = run.text,
                    font = run.font.unwrap_or("default"),
                    "no font registered; text objects are skipped"
                );
            }
            return Ok(());
        };
        if run.text.is_empty() {
            return Ok(());
        }

        // Shape at the device size so hinting sees whole pixels, then scale back.
        let scale = self.state.transform.determinant().abs().sqrt();
        let size_px = run.size * scale;
        if !(size_px > 0.0) || !size_px.is_finite() {
            return Ok(());
        }
        let layout = self
            .text
            .layout(run.text, &font.family, size_px as f32, run.color.into())?;
        let transform = self.state.transform
            * Affine::scale(1.0 / scale)
            * Affine::translate((0.0, -f64::from(first_baseline(&layout))));

        self.encode_in(transform, Affine::IDENTITY, |ctx| {
            ctx.set_fill_rule(vello_cpu::peniko::Fill::NonZero);
            for line in layout.lines() {
                for item in line.items() {
                    let parley::layout::PositionedLayoutItem::GlyphRun(glyph_run) = item else {
                        continue;
                    };
                    let brush = glyph_run.style().brush;
                    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                        brush.r, brush.g, brush.b, brush.a,
                    ));
                    ctx.glyph_run(&font.data)
                        .font_size(glyph_run.run().font_size())
                        .fill_glyphs(positioned_glyphs(&glyph_run));
                }
            }
        });
        Ok(())
    }
}

fn clear_pixmap_to_transparent(pixmap: &mut vello_cpu::Pixmap) {
    pixmap.data_as_u8_slice_mut().fill(0);
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let pt = |p: kurbo::Point| vello_cpu::kurbo::Point::new(p.x, p.y);
    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(pt(p)),
            PathEl::LineTo(p) => out.line_to(pt(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(pt(p1), pt(p2)),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(pt(p1), pt(p2), pt(p3)),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn rect_to_cpu(rect: Rect) -> vello_cpu::kurbo::BezPath {
    bezpath_to_cpu(&rect.to_path(0.1))
}

fn color_to_cpu(c: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

/// Stops clamped to `[0, 1]` and ordered, as the rasterizer requires.
fn stops_to_cpu(
    stops: &[ColorStop],
    offset_scale: f64,
) -> Vec<(f32, vello_cpu::peniko::Color)> {
    let mut out: Vec<(f32, vello_cpu::peniko::Color)> = stops
        .iter()
        .map(|s| {
            let offset = (s.offset * offset_scale).clamp(0.0, 1.0) as f32;
            (offset, color_to_cpu(s.color))
        })
        .collect();
    out.sort_by(|a, b| a.0.total_cmp(&b.0));
    out
}

fn last_stop_color(stops: &[ColorStop]) -> Rgba8 {
    stops.last().map(|s| s.color).unwrap_or(Rgba8::BLACK)
}

fn set_brush(ctx: &mut vello_cpu::RenderContext, brush: &Brush) {
    use vello_cpu::kurbo::Point;
    use vello_cpu::peniko::Gradient;

    match brush {
        Brush::Solid(c) => ctx.set_paint(color_to_cpu(*c)),
        Brush::Linear { stops, .. } if stops.len() < 2 => {
            ctx.set_paint(color_to_cpu(last_stop_color(stops)));
        }
        Brush::Linear { start, end, stops } => {
            let stops = stops_to_cpu(stops, 1.0);
            ctx.set_paint(
                Gradient::new_linear(Point::new(start.x, start.y), Point::new(end.x, end.y))
                    .with_stops(stops.as_slice()),
            );
        }
        Brush::Radial {
            center,
            radius,
            stop_scale,
            stops,
        } => {
            // Drawn at the effective radius with the authored positions; a collapsed radius
            // paints the last stop everywhere.
            let effective = radius * stop_scale;
            if !(effective > 0.0 && effective.is_finite()) || stops.len() < 2 {
                ctx.set_paint(color_to_cpu(last_stop_color(stops)));
                return;
            }
            let stops = stops_to_cpu(stops, 1.0 / stop_scale);
            ctx.set_paint(
                Gradient::new_radial(Point::new(center.x, center.y), effective as f32)
                    .with_stops(stops.as_slice()),
            );
        }
    }
}

fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> KeyreelResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| KeyreelError::render("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| KeyreelError::render("image height exceeds u16"))?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(KeyreelError::render("image byte length mismatch"));
    }
    let pixels = bytes
        .chunks_exact(4)
        .map(|px| vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]]))
        .collect();
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, true))
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
