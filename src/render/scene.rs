use crate::animation::keyframe::SampleCtx;
use crate::foundation::core::{Affine, Rgba8};
use crate::foundation::error::{KeyreelError, KeyreelResult};
use crate::geometry::path::{build_path, compute_bounds};
use crate::media::provider::MediaProvider;
use crate::paint::gradient::{Brush, radial_correction, resolve_gradient, square_bounds};
use crate::render::effects::{Fx, resolve_effect};
use crate::render::surface::{DrawSurface, LayerBlend, TextRun, with_layer, with_saved};
use crate::scene::model::{Mask, Shape, Text};
use crate::scene::project::{Object, ObjectKind, ObjectRef, Project};
use crate::transform::nested::{NestedStack, nested_steps};
use crate::transform::object::object_affine;
use crate::transform::viewport::viewport_affine;

/// Traversal switches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SceneOpts {
    /// Skip video and sound objects entirely.
    pub media_skip: bool,
    /// Clip nested compositions to their frame.
    pub clip_nested: bool,
}

impl Default for SceneOpts {
    fn default() -> Self {
        Self {
            media_skip: false,
            clip_nested: true,
        }
    }
}

/// What one object list produced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrawOutcome {
    /// Objects dispatched from this list (nested lists not included).
    pub drawn: usize,
    /// A fullscreen object ended the list early.
    pub short_circuited: bool,
}

/// Draws a project's object tree at one instant.
pub struct SceneRenderer<'a> {
    project: &'a Project,
    media: &'a mut dyn MediaProvider,
    time: f64,
    opts: SceneOpts,
}

impl<'a> SceneRenderer<'a> {
    pub fn new(project: &'a Project, media: &'a mut dyn MediaProvider, time: f64) -> Self {
        Self {
            project,
            media,
            time,
            opts: SceneOpts::default(),
        }
    }

    pub fn with_opts(mut self, opts: SceneOpts) -> Self {
        self.opts = opts;
        self
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// Draw the visible objects of `composition` back to front.
    ///
    /// Stops after the first drawn fullscreen object: it is opaque and covers everything listed
    /// after it.
    pub fn draw_objects<S: DrawSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        nested: &mut NestedStack,
        composition: usize,
    ) -> KeyreelResult<DrawOutcome> {
        let project = self.project;
        let comp = project.composition(composition).ok_or_else(|| {
            KeyreelError::evaluation(format!("composition {composition} out of range"))
        })?;

        let mut outcome = DrawOutcome::default();
        for (index, object) in comp.objects.iter().enumerate() {
            if self.opts.media_skip && object.is_media() {
                tracing::trace!(object = %object.id, "media skipped");
                continue;
            }
            if !object.is_visible_at(self.time, nested.offset()) {
                continue;
            }

            let r = ObjectRef {
                composition,
                object: index,
            };
            self.draw_object(surface, nested, r)?;
            outcome.drawn += 1;

            if object.is_fullscreen {
                let skipped = comp.objects.len() - index - 1;
                tracing::debug!(object = %object.id, skipped, "fullscreen object ends list");
                outcome.short_circuited = true;
                break;
            }
        }
        Ok(outcome)
    }

    /// Draw one object with its effects and masks.
    pub fn draw_object<S: DrawSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        nested: &mut NestedStack,
        r: ObjectRef,
    ) -> KeyreelResult<()> {
        let object = self.object(r)?;
        with_saved(surface, |s| {
            s.set_transform(Affine::IDENTITY);
            if !object.has_effects() {
                return self.draw_no_effect(s, nested, r);
            }

            let ctx = nested.sample_ctx(self.time);
            let fxs = object
                .effects
                .iter()
                .map(|e| resolve_effect(e, ctx))
                .collect::<KeyreelResult<Vec<Fx>>>()?;
            // The layer pop carries the inherited alpha, so the content is drawn at full alpha.
            with_layer(s, LayerBlend::Over, |s| {
                with_saved(s, |s| {
                    s.set_global_alpha(1.0);
                    self.draw_no_effect(s, nested, r)?;
                    for fx in fxs.iter().filter(|fx| !fx.is_noop()) {
                        s.apply_effect(fx)?;
                    }
                    Ok(())
                })
            })
        })
    }

    fn draw_no_effect<S: DrawSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        nested: &mut NestedStack,
        r: ObjectRef,
    ) -> KeyreelResult<()> {
        let object = self.object(r)?;
        with_saved(surface, |s| {
            self.enter_composition_space(s, nested)?;
            if !object.has_masks() {
                return self.draw_no_mask(s, nested, r);
            }
            for mask in &object.masks {
                with_layer(s, LayerBlend::Over, |s| {
                    with_saved(s, |s| {
                        self.draw_no_mask(s, nested, r)?;
                        self.draw_mask(s, mask, nested.sample_ctx(self.time))
                    })
                })?;
            }
            Ok(())
        })
    }

    /// Viewport followed by every enclosing instance's step, clipped per instance if enabled.
    fn enter_composition_space<S: DrawSurface + ?Sized>(
        &self,
        surface: &mut S,
        nested: &NestedStack,
    ) -> KeyreelResult<()> {
        surface.concat(viewport_affine(
            self.project.canvas,
            self.project.active().aspect,
        ));
        for step in nested_steps(self.project, nested, self.time)? {
            surface.concat(step.transform);
            if self.opts.clip_nested {
                surface.clip_rect(step.clip);
            }
        }
        Ok(())
    }

    fn draw_no_mask<S: DrawSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        nested: &mut NestedStack,
        r: ObjectRef,
    ) -> KeyreelResult<()> {
        let object = self.object(r)?;
        if matches!(object.kind, ObjectKind::Dummy | ObjectKind::Sound) {
            return Ok(());
        }

        let ctx = nested.sample_ctx(self.time);
        match &object.transform {
            Some(t) => surface.concat(object_affine(self.project, t, ctx)?),
            None => surface.set_transform(Affine::IDENTITY),
        }
        surface.set_global_alpha(object.opacity.sample_scalar(ctx)?);

        match &object.kind {
            ObjectKind::Shape(Some(shape)) => draw_shape(surface, shape, ctx),
            ObjectKind::Text(Some(text)) => draw_text(surface, text, ctx),
            ObjectKind::Image { source_matrix } => {
                self.draw_bitmap(surface, object, *source_matrix, false, ctx)
            }
            ObjectKind::Video {
                source_matrix,
                alpha_stacked,
            } => self.draw_bitmap(surface, object, *source_matrix, *alpha_stacked, ctx),
            ObjectKind::Composition { child, .. } => {
                let child = *child;
                nested
                    .enter(r, object.start, |nested| {
                        self.draw_objects(surface, nested, child)
                    })
                    .map(|_| ())
            }
            ObjectKind::Shape(None) | ObjectKind::Text(None) => Ok(()),
            ObjectKind::Sound | ObjectKind::Dummy => Ok(()),
        }
    }

    /// Multiply the current layer's alpha by the mask coverage.
    ///
    /// The mask is filled in the object's transform; a positive feather blurs its edge with that
    /// gaussian sigma in device pixels. A feathered mask is filled unclipped so its blur sees the
    /// whole shape; the enclosing pass still clips the result.
    fn draw_mask<S: DrawSurface + ?Sized>(
        &self,
        surface: &mut S,
        mask: &Mask,
        ctx: SampleCtx,
    ) -> KeyreelResult<()> {
        let path = build_path(&mask.vertex_list, ctx)?;
        let feather = mask.feather.sample_scalar(ctx)?;
        let black = Brush::Solid(Rgba8::BLACK);
        with_saved(surface, |s| {
            s.set_global_alpha(1.0);
            with_layer(s, LayerBlend::DestinationIn, |s| {
                if !(feather > 0.0) {
                    return s.fill_path(&path, &black, Affine::IDENTITY);
                }
                with_saved(s, |s| {
                    s.reset_clip();
                    s.fill_path(&path, &black, Affine::IDENTITY)
                })?;
                s.blur_layer(feather)
            })
        })
    }

    fn draw_bitmap<S: DrawSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        object: &Object,
        source_matrix: Option<Affine>,
        alpha_stacked: bool,
        ctx: SampleCtx,
    ) -> KeyreelResult<()> {
        let Some(frame) = self.media.frame(&object.id, ctx.local_time()) else {
            tracing::warn!(object = %object.id, time = ctx.local_time(), "media frame unavailable");
            return Ok(());
        };
        let frame = if alpha_stacked {
            match frame.unstack_alpha() {
                Ok(f) => f,
                Err(e) => {
                    tracing::warn!(object = %object.id, error = %e, "alpha-stacked frame skipped");
                    return Ok(());
                }
            }
        } else {
            frame
        };

        with_saved(surface, |s| {
            match source_matrix {
                Some(m) => s.concat(m),
                None => s.set_transform(Affine::IDENTITY),
            }
            s.draw_image(&frame)
        })
    }

    fn object(&self, r: ObjectRef) -> KeyreelResult<&'a Object> {
        let project: &'a Project = self.project;
        project
            .object(r)
            .ok_or_else(|| KeyreelError::evaluation("object reference out of range"))
    }
}

fn draw_shape<S: DrawSurface + ?Sized>(
    surface: &mut S,
    shape: &Shape,
    ctx: SampleCtx,
) -> KeyreelResult<()> {
    let path = build_path(&shape.vertex_list, ctx)?;
    let stroke_width = shape.stroke_width.sample_scalar(ctx)?;

    let (brush, paint_transform) = match (&shape.color, &shape.gradient) {
        (Some(color), _) => (
            Brush::Solid(Rgba8::from_unit_rgb(&color.sample(ctx)?)),
            Affine::IDENTITY,
        ),
        (None, Some(gradient)) => {
            let gradient = gradient.sample(ctx)?;
            let bounds = compute_bounds(&shape.vertex_list, stroke_width, ctx)?;
            (
                resolve_gradient(gradient, square_bounds(gradient.kind, bounds)),
                radial_correction(gradient.kind, bounds.width(), bounds.height()),
            )
        }
        (None, None) => (Brush::Solid(Rgba8::BLACK), Affine::IDENTITY),
    };
    surface.fill_path(&path, &brush, paint_transform)?;

    if stroke_width > 0.0 {
        let color = Rgba8::from_unit_rgb(&shape.stroke_color.sample(ctx)?);
        surface.stroke_path(&path, stroke_width, color)?;
    }
    Ok(())
}

fn draw_text<S: DrawSurface + ?Sized>(
    surface: &mut S,
    text: &Text,
    ctx: SampleCtx,
) -> KeyreelResult<()> {
    let run = TextRun {
        text: &text.text,
        font: text.font.as_deref(),
        size: text.size.sample_scalar(ctx)?,
        color: Rgba8::from_unit_rgb(&text.color.sample(ctx)?),
    };
    surface.draw_text(&run)
}

#[cfg(test)]
#[path = "../../tests/unit/render/scene.rs"]
mod tests;
