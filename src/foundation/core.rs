use smallvec::SmallVec;

use crate::foundation::error::{KeyreelError, KeyreelResult};

pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};

/// Evaluated value of an animated property (1 component for scalars, 2 for points, 3 for RGB).
pub type Sample = SmallVec<[f64; 4]>;

/// Output raster size in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    pub fn aspect(self) -> f64 {
        f64::from(self.width) / f64::from(self.height.max(1))
    }

    pub fn rect(self) -> Rect {
        Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }

    pub fn byte_len(self) -> usize {
        (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(4)
    }
}

/// Straight-alpha RGBA8 color.
///
/// Serialized as a CSS-style hex string (`#rgb`, `#rrggbb` or `#rrggbbaa`), which is how gradient
/// stops and project backgrounds are authored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const BLACK: Self = Self::new(0, 0, 0, 255);
    pub const WHITE: Self = Self::new(255, 255, 255, 255);
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Convert an animated RGB value in `[0, 1]` to an opaque color.
    ///
    /// Components are rounded to the nearest byte; missing components read as 0.
    pub fn from_unit_rgb(value: &[f64]) -> Self {
        fn channel(v: Option<&f64>) -> u8 {
            let v = v.copied().unwrap_or(0.0);
            if !v.is_finite() {
                return 0;
            }
            (v * 255.0).round().clamp(0.0, 255.0) as u8
        }

        Self::new(
            channel(value.first()),
            channel(value.get(1)),
            channel(value.get(2)),
            255,
        )
    }

    pub fn parse_hex(s: &str) -> KeyreelResult<Self> {
        let hex = s
            .trim()
            .strip_prefix('#')
            .ok_or_else(|| KeyreelError::validation(format!("color '{s}' must start with '#'")))?;

        let nibble = |i: usize| -> KeyreelResult<u8> {
            let c = hex.as_bytes()[i] as char;
            c.to_digit(16)
                .map(|d| d as u8)
                .ok_or_else(|| KeyreelError::validation(format!("invalid hex digit in '{s}'")))
        };
        let byte = |i: usize| -> KeyreelResult<u8> { Ok(nibble(i)? << 4 | nibble(i + 1)?) };

        match hex.len() {
            3 => {
                let r = nibble(0)?;
                let g = nibble(1)?;
                let b = nibble(2)?;
                Ok(Self::new(r << 4 | r, g << 4 | g, b << 4 | b, 255))
            }
            6 => Ok(Self::new(byte(0)?, byte(2)?, byte(4)?, 255)),
            8 => Ok(Self::new(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => Err(KeyreelError::validation(format!(
                "color '{s}' must have 3, 6 or 8 hex digits"
            ))),
        }
    }

    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl TryFrom<String> for Rgba8 {
    type Error = KeyreelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_hex(&value)
    }
}

impl From<Rgba8> for String {
    fn from(value: Rgba8) -> Self {
        value.to_hex()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
