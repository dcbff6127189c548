use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::foundation::error::KeyreelResult;
use crate::media::frame::MediaFrame;

/// Source of decoded pixels for image and video objects.
pub trait MediaProvider {
    /// Frame for `object_id` at `time` (milliseconds in the object's own composition timeline).
    ///
    /// `None` means the frame is not available; the renderer skips the blit.
    fn frame(&mut self, object_id: &str, time: f64) -> Option<MediaFrame>;
}

/// Provider with no media at all.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoMedia;

impl MediaProvider for NoMedia {
    fn frame(&mut self, _object_id: &str, _time: f64) -> Option<MediaFrame> {
        None
    }
}

/// Provider backed by frames registered up front; the same frame is returned at any time.
#[derive(Debug, Default, Clone)]
pub struct InMemoryMedia {
    frames: HashMap<String, MediaFrame>,
}

impl InMemoryMedia {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, object_id: impl Into<String>, frame: MediaFrame) {
        self.frames.insert(object_id.into(), frame);
    }

    pub fn with_frame(mut self, object_id: impl Into<String>, frame: MediaFrame) -> Self {
        self.insert(object_id, frame);
        self
    }
}

impl MediaProvider for InMemoryMedia {
    fn frame(&mut self, object_id: &str, _time: f64) -> Option<MediaFrame> {
        self.frames.get(object_id).cloned()
    }
}

/// Still images loaded from `<root>/<object id>.{png,jpg,jpeg}` on first use.
#[derive(Debug)]
pub struct DirMediaProvider {
    root: PathBuf,
    cache: HashMap<String, Option<MediaFrame>>,
}

const STILL_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

impl DirMediaProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: HashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn locate(&self, object_id: &str) -> Option<PathBuf> {
        STILL_EXTENSIONS
            .iter()
            .map(|ext| self.root.join(format!("{object_id}.{ext}")))
            .find(|p| p.is_file())
    }

    fn load(&self, object_id: &str) -> KeyreelResult<Option<MediaFrame>> {
        let Some(path) = self.locate(object_id) else {
            return Ok(None);
        };
        let bytes =
            std::fs::read(&path).with_context(|| format!("read media '{}'", path.display()))?;
        Ok(Some(decode_still(&bytes)?))
    }
}

impl MediaProvider for DirMediaProvider {
    fn frame(&mut self, object_id: &str, _time: f64) -> Option<MediaFrame> {
        if let Some(cached) = self.cache.get(object_id) {
            return cached.clone();
        }
        let loaded = match self.load(object_id) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(object_id, error = %e, "failed to load media");
                None
            }
        };
        self.cache.insert(object_id.to_owned(), loaded.clone());
        loaded
    }
}

/// Decode an encoded still (PNG, JPEG) into a straight-alpha frame.
pub fn decode_still(bytes: &[u8]) -> KeyreelResult<MediaFrame> {
    let img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    MediaFrame::new(width, height, rgba.into_raw())
}

#[cfg(test)]
#[path = "../../tests/unit/media/provider.rs"]
mod tests;
