use crate::foundation::core::{Affine, BezPath, Canvas, Rect, Rgba8};
use crate::foundation::error::{KeyreelError, KeyreelResult};
use crate::media::frame::MediaFrame;
use crate::paint::gradient::Brush;
use crate::render::effects::Fx;
use crate::render::surface::{DrawSurface, LayerBlend, TextRun};

/// One recorded draw or layer operation, with the state it ran under.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    FillPath {
        path: BezPath,
        brush: Brush,
        transform: Affine,
        paint_transform: Affine,
        alpha: f64,
    },
    StrokePath {
        path: BezPath,
        width: f64,
        color: Rgba8,
        transform: Affine,
        alpha: f64,
    },
    FillRect {
        rect: Rect,
        brush: Brush,
        transform: Affine,
        alpha: f64,
    },
    Image {
        width: u32,
        height: u32,
        transform: Affine,
        alpha: f64,
    },
    Text {
        text: String,
        size: f64,
        color: Rgba8,
        transform: Affine,
        alpha: f64,
    },
    ClipRect {
        rect: Rect,
        transform: Affine,
    },
    ResetClip,
    Clear,
    PushLayer,
    PopLayer(LayerBlend),
    Blur {
        sigma: f64,
    },
    Effect(Fx),
}

impl DrawCommand {
    /// Commands that put pixels on the surface.
    pub fn is_draw(&self) -> bool {
        matches!(
            self,
            Self::FillPath { .. }
                | Self::StrokePath { .. }
                | Self::FillRect { .. }
                | Self::Image { .. }
                | Self::Text { .. }
        )
    }
}

#[derive(Clone, Copy, Debug)]
struct State {
    transform: Affine,
    alpha: f64,
}

impl Default for State {
    fn default() -> Self {
        Self {
            transform: Affine::IDENTITY,
            alpha: 1.0,
        }
    }
}

/// Surface that rasterizes nothing and logs every call.
#[derive(Clone, Debug)]
pub struct RecordingSurface {
    canvas: Canvas,
    state: State,
    saved: Vec<State>,
    layers: usize,
    commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new(canvas: Canvas) -> Self {
        Self {
            canvas,
            state: State::default(),
            saved: Vec::new(),
            layers: 0,
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn draws(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands.iter().filter(|c| c.is_draw())
    }

    /// Open `save`s not yet restored.
    pub fn save_depth(&self) -> usize {
        self.saved.len()
    }

    /// Pushed layers not yet popped.
    pub fn layer_depth(&self) -> usize {
        self.layers
    }
}

impl DrawSurface for RecordingSurface {
    fn canvas(&self) -> Canvas {
        self.canvas
    }

    fn save(&mut self) {
        self.saved.push(self.state);
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
        self.commands.push(DrawCommand::ClipRect {
            rect,
            transform: self.state.transform,
        });
    }

    fn reset_clip(&mut self) {
        self.commands.push(DrawCommand::ResetClip);
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
        self.commands.push(DrawCommand::FillPath {
            path: path.clone(),
            brush: brush.clone(),
            transform: self.state.transform,
            paint_transform,
            alpha: self.state.alpha,
        });
        Ok(())
    }

    fn stroke_path(&mut self, path: &BezPath, width: f64, color: Rgba8) -> KeyreelResult<()> {
        self.commands.push(DrawCommand::StrokePath {
            path: path.clone(),
            width,
            color,
            transform: self.state.transform,
            alpha: self.state.alpha,
        });
        Ok(())
    }

    fn fill_rect(&mut self, rect: Rect, brush: &Brush, _paint_transform: Affine) -> KeyreelResult<()> {
        self.commands.push(DrawCommand::FillRect {
            rect,
            brush: brush.clone(),
            transform: self.state.transform,
            alpha: self.state.alpha,
        });
        Ok(())
    }

    fn clear(&mut self) -> KeyreelResult<()> {
        self.commands.push(DrawCommand::Clear);
        Ok(())
    }

    fn push_layer(&mut self) -> KeyreelResult<()> {
        self.layers += 1;
        self.commands.push(DrawCommand::PushLayer);
        Ok(())
    }

    fn pop_layer(&mut self, blend: LayerBlend) -> KeyreelResult<()> {
        self.layers = self
            .layers
            .checked_sub(1)
            .ok_or_else(|| KeyreelError::render("pop_layer without matching push_layer"))?;
        self.commands.push(DrawCommand::PopLayer(blend));
        Ok(())
    }

    fn blur_layer(&mut self, sigma: f64) -> KeyreelResult<()> {
        self.commands.push(DrawCommand::Blur { sigma });
        Ok(())
    }

    fn apply_effect(&mut self, fx: &Fx) -> KeyreelResult<()> {
        self.commands.push(DrawCommand::Effect(*fx));
        Ok(())
    }

    fn draw_image(&mut self, frame: &MediaFrame) -> KeyreelResult<()> {
        self.commands.push(DrawCommand::Image {
            width: frame.width,
            height: frame.height,
            transform: self.state.transform,
            alpha: self.state.alpha,
        });
        Ok(())
    }

    fn draw_text(&mut self, run: &TextRun<'_>) -> KeyreelResult<()> {
        self.commands.push(DrawCommand::Text {
            text: run.text.to_owned(),
            size: run.size,
            color: run.color,
            transform: self.state.transform,
            alpha: self.state.alpha,
        });
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/recording.rs"]
mod tests;
