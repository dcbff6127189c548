use std::collections::HashMap;

use crate::foundation::error::{KeyreelError, KeyreelResult};

/// Limits for pixmaps retained between layer pushes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfacePoolOpts {
    /// Maximum bytes retained across all sizes.
    pub max_pool_bytes: usize,
    /// Maximum number of retained pixmaps per size.
    pub max_surfaces_per_bucket: usize,
}

impl Default for SurfacePoolOpts {
    fn default() -> Self {
        Self {
            max_pool_bytes: 256 * 1024 * 1024,
            max_surfaces_per_bucket: 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct SurfaceKey {
    w: u16,
    h: u16,
}

impl SurfaceKey {
    fn byte_len(self) -> usize {
        usize::from(self.w) * usize::from(self.h) * 4
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SurfacePoolStats {
    pub retained_surfaces: usize,
    pub retained_bytes: usize,
    pub alloc_surfaces: u64,
    pub alloc_bytes: u64,
    pub dropped_on_release: u64,
}

/// Bounded pool of CPU pixmaps keyed by size.
///
/// Pixmaps come back with whatever content they were released with; callers clear them.
pub struct SurfacePool {
    opts: SurfacePoolOpts,
    stats: SurfacePoolStats,
    buckets: HashMap<SurfaceKey, Vec<vello_cpu::Pixmap>>,
}

impl SurfacePool {
    pub fn new(opts: SurfacePoolOpts) -> Self {
        Self {
            opts,
            stats: SurfacePoolStats::default(),
            buckets: HashMap::new(),
        }
    }

    pub fn stats(&self) -> SurfacePoolStats {
        self.stats.clone()
    }

    pub fn borrow(&mut self, width: u32, height: u32) -> KeyreelResult<vello_cpu::Pixmap> {
        let key = key_for(width, height)?;
        if let Some(p) = self.buckets.get_mut(&key).and_then(Vec::pop) {
            self.stats.retained_surfaces = self.stats.retained_surfaces.saturating_sub(1);
            self.stats.retained_bytes = self.stats.retained_bytes.saturating_sub(key.byte_len());
            return Ok(p);
        }

        self.stats.alloc_surfaces = self.stats.alloc_surfaces.saturating_add(1);
        self.stats.alloc_bytes = self.stats.alloc_bytes.saturating_add(key.byte_len() as u64);
        Ok(vello_cpu::Pixmap::new(key.w, key.h))
    }

    pub fn release(&mut self, pixmap: vello_cpu::Pixmap) {
        let key = SurfaceKey {
            w: pixmap.width(),
            h: pixmap.height(),
        };
        let bytes = key.byte_len();
        if self.opts.max_pool_bytes == 0
            || self.opts.max_surfaces_per_bucket == 0
            || self.stats.retained_bytes.saturating_add(bytes) > self.opts.max_pool_bytes
        {
            self.stats.dropped_on_release = self.stats.dropped_on_release.saturating_add(1);
            return;
        }

        let bucket = self.buckets.entry(key).or_default();
        if bucket.len() >= self.opts.max_surfaces_per_bucket {
            self.stats.dropped_on_release = self.stats.dropped_on_release.saturating_add(1);
            return;
        }

        bucket.push(pixmap);
        self.stats.retained_surfaces = self.stats.retained_surfaces.saturating_add(1);
        self.stats.retained_bytes = self.stats.retained_bytes.saturating_add(bytes);
    }
}

fn key_for(width: u32, height: u32) -> KeyreelResult<SurfaceKey> {
    let w: u16 = width
        .try_into()
        .map_err(|_| KeyreelError::render(format!("surface width exceeds u16: {width}")))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| KeyreelError::render(format!("surface height exceeds u16: {height}")))?;
    Ok(SurfaceKey { w, h })
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface_pool.rs"]
mod tests;
