use crate::foundation::core::Affine;
use crate::foundation::error::{KeyreelError, KeyreelResult};
use crate::media::provider::MediaProvider;
use crate::paint::gradient::{Brush, radial_correction, resolve_gradient, square_bounds};
use crate::render::cpu::CpuSurface;
use crate::render::scene::{DrawOutcome, SceneOpts, SceneRenderer};
use crate::render::surface::{DrawSurface, with_saved};
use crate::render::surface_pool::SurfacePoolOpts;
use crate::scene::project::{Background, Project};
use crate::transform::nested::NestedStack;

/// Options for a [`RenderSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSessionOpts {
    pub media_skip: bool,
    pub clip_nested: bool,
    pub pool: SurfacePoolOpts,
}

impl Default for RenderSessionOpts {
    fn default() -> Self {
        Self {
            media_skip: false,
            clip_nested: true,
            pool: SurfacePoolOpts::default(),
        }
    }
}

impl RenderSessionOpts {
    /// Skip video and sound objects, for previews without decoded media.
    pub fn with_media_skip(mut self, media_skip: bool) -> Self {
        self.media_skip = media_skip;
        self
    }

    pub fn with_clip_nested(mut self, clip_nested: bool) -> Self {
        self.clip_nested = clip_nested;
        self
    }

    pub fn with_pool(mut self, pool: SurfacePoolOpts) -> Self {
        self.pool = pool;
        self
    }

    fn scene(self) -> SceneOpts {
        SceneOpts {
            media_skip: self.media_skip,
            clip_nested: self.clip_nested,
        }
    }
}

/// Renders frames of one loaded project.
///
/// The session owns the nested-composition stack, which is empty between frames.
#[derive(Debug, Clone)]
pub struct RenderSession {
    project: Project,
    nested: NestedStack,
    opts: RenderSessionOpts,
}

impl RenderSession {
    pub fn new(project: Project, opts: RenderSessionOpts) -> Self {
        Self {
            project,
            nested: NestedStack::new(),
            opts,
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn opts(&self) -> RenderSessionOpts {
        self.opts
    }

    /// CPU surface sized to the project raster, using the session's pool limits.
    pub fn create_cpu_surface(&self) -> KeyreelResult<CpuSurface> {
        CpuSurface::with_pool(self.project.canvas, self.opts.pool)
    }

    /// Clear `surface` and draw the active composition at `time` milliseconds.
    #[tracing::instrument(skip(self, surface, media))]
    pub fn render_frame<S: DrawSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        media: &mut dyn MediaProvider,
        time: f64,
    ) -> KeyreelResult<DrawOutcome> {
        if surface.canvas() != self.project.canvas {
            return Err(KeyreelError::render(format!(
                "surface is {}x{}, project raster is {}x{}",
                surface.canvas().width,
                surface.canvas().height,
                self.project.canvas.width,
                self.project.canvas.height
            )));
        }

        clear_background(surface, &self.project.background)?;
        let outcome = SceneRenderer::new(&self.project, media, time)
            .with_opts(self.opts.scene())
            .draw_objects(surface, &mut self.nested, self.project.active)?;
        tracing::debug!(drawn = outcome.drawn, short_circuited = outcome.short_circuited, "frame drawn");
        Ok(outcome)
    }
}

/// Reset transform and alpha, then clear or fill the whole raster.
pub fn clear_background<S: DrawSurface + ?Sized>(
    surface: &mut S,
    background: &Background,
) -> KeyreelResult<()> {
    let canvas = surface.canvas();
    with_saved(surface, |s| {
        s.set_transform(Affine::IDENTITY);
        s.set_global_alpha(1.0);
        s.clear()?;
        match background {
            Background::Transparent => Ok(()),
            Background::Solid(color) => {
                s.fill_rect(canvas.rect(), &Brush::Solid(*color), Affine::IDENTITY)
            }
            Background::Gradient(gradient) => {
                let raster = canvas.rect();
                s.concat(radial_correction(
                    gradient.kind,
                    raster.width(),
                    raster.height(),
                ));
                let bounds = square_bounds(gradient.kind, raster);
                s.fill_rect(bounds, &resolve_gradient(gradient, bounds), Affine::IDENTITY)
            }
        }
    })
}

#[cfg(test)]
#[path = "../../tests/unit/session/render_session.rs"]
mod tests;
