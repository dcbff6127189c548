use std::sync::Arc;

use crate::foundation::error::{KeyreelError, KeyreelResult};

/// Decoded straight-alpha RGBA8 bitmap supplied for image and video objects.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaFrame {
    pub width: u32,
    pub height: u32,
    pub rgba: Arc<Vec<u8>>,
}

impl MediaFrame {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> KeyreelResult<Self> {
        let expected = (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4);
        if rgba.len() != expected {
            return Err(KeyreelError::validation(format!(
                "media frame {width}x{height} expects {expected} bytes, got {}",
                rgba.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba: Arc::new(rgba),
        })
    }

    /// Frame filled with one color.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let px = (width as usize) * (height as usize);
        Self {
            width,
            height,
            rgba: Arc::new(rgba.repeat(px)),
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + x as usize) * 4;
        let p = self.rgba.get(i..i + 4)?;
        Some([p[0], p[1], p[2], p[3]])
    }

    /// Recombine a frame whose alpha is stored as a second image below the color image.
    ///
    /// The result is `width x height / 2`: color from the top half, alpha from the blue channel of
    /// the pixel at the same position in the bottom half.
    pub fn unstack_alpha(&self) -> KeyreelResult<Self> {
        let half = self.height / 2;
        if half == 0 {
            return Err(KeyreelError::evaluation(
                "alpha-stacked frame needs a height of at least 2",
            ));
        }
        let row = self.width as usize * 4;
        let plane = row * half as usize;
        let (color, alpha) = self.rgba.split_at(plane);

        let mut out = color.to_vec();
        for (dst, src) in out.chunks_exact_mut(4).zip(alpha.chunks_exact(4)) {
            dst[3] = src[2];
        }
        Self::new(self.width, half, out)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/media/frame.rs"]
mod tests;
