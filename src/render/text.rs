use crate::foundation::core::Rgba8;
use crate::foundation::error::{KeyreelError, KeyreelResult};

/// RGBA8 brush carried through Parley layouts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextBrush {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl From<Rgba8> for TextBrush {
    fn from(c: Rgba8) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        }
    }
}

/// Font registered with a [`TextLayoutEngine`].
#[derive(Clone)]
pub struct RegisteredFont {
    pub family: String,
    pub data: vello_cpu::peniko::FontData,
}

/// Shapes plain text with Parley against fonts registered from raw bytes.
///
/// No system fonts are loaded, so output only depends on the registered files.
pub struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrush>,
    fonts: Vec<RegisteredFont>,
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayoutEngine {
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            fonts: Vec::new(),
        }
    }

    /// Register a TrueType/OpenType font and return its family name.
    pub fn register_font(&mut self, bytes: Vec<u8>) -> KeyreelResult<String> {
        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(bytes.clone()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| KeyreelError::validation("no font families registered from font bytes"))?;
        let family = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| KeyreelError::validation("registered font family has no name"))?
            .to_owned();

        tracing::debug!(family = %family, bytes = bytes.len(), "font registered");
        self.fonts.push(RegisteredFont {
            family: family.clone(),
            data: vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(bytes), 0),
        });
        Ok(family)
    }

    pub fn fonts(&self) -> &[RegisteredFont] {
        &self.fonts
    }

    /// Font for a requested family name, falling back to the first registered font.
    pub fn resolve(&self, requested: Option<&str>) -> Option<&RegisteredFont> {
        if let Some(name) = requested {
            let found = self
                .fonts
                .iter()
                .find(|f| f.family.eq_ignore_ascii_case(name));
            if found.is_some() {
                return found;
            }
            tracing::debug!(font = name, "font family not registered, using fallback");
        }
        self.fonts.first()
    }

    /// Lay out `text` on a single unbounded line per paragraph.
    pub fn layout(
        &mut self,
        text: &str,
        family: &str,
        size_px: f32,
        brush: TextBrush,
    ) -> KeyreelResult<parley::Layout<TextBrush>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(KeyreelError::validation("text size must be finite and > 0"));
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family.to_owned())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrush> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }
}

/// Baseline of the first line, or 0 for an empty layout.
pub fn first_baseline(layout: &parley::Layout<TextBrush>) -> f32 {
    layout
        .lines()
        .next()
        .map(|line| line.metrics().baseline)
        .unwrap_or(0.0)
}

/// Glyphs of one run placed in layout coordinates.
pub fn positioned_glyphs<'a>(
    run: &'a parley::layout::GlyphRun<'a, TextBrush>,
) -> impl Iterator<Item = vello_cpu::Glyph> + 'a {
    let baseline = run.baseline();
    let mut x = run.offset();
    run.glyphs().map(move |g| {
        let glyph = vello_cpu::Glyph {
            id: g.id,
            x: x + g.x,
            y: baseline - g.y,
        };
        x += g.advance;
        glyph
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/text.rs"]
mod tests;
