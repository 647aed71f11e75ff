use crate::foundation::error::StrataResult;
use crate::render::device::{Device, TargetDesc, TextureFilter, TextureFormat, TextureId};

/// Format and sampling options for a pooled target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TargetOptions {
    /// Storage format.
    pub format: TextureFormat,
    /// Filter when minifying.
    pub min_filter: TextureFilter,
    /// Filter when magnifying.
    pub mag_filter: TextureFilter,
}

impl Default for TargetOptions {
    fn default() -> Self {
        Self {
            format: TextureFormat::Rgba16Float,
            min_filter: TextureFilter::Linear,
            mag_filter: TextureFilter::Linear,
        }
    }
}

impl TargetOptions {
    /// Replace the format.
    pub fn with_format(mut self, format: TextureFormat) -> Self {
        self.format = format;
        self
    }

    /// Use one filter for both minification and magnification.
    pub fn with_filter(mut self, filter: TextureFilter) -> Self {
        self.min_filter = filter;
        self.mag_filter = filter;
        self
    }
}

/// Exact-match reuse key: `(width, height, format, min_filter, mag_filter)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PoolKey {
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// Format and filtering.
    pub options: TargetOptions,
}

impl PoolKey {
    fn desc(self) -> TargetDesc {
        TargetDesc {
            width: self.width,
            height: self.height,
            format: self.options.format,
            min_filter: self.options.min_filter,
            mag_filter: self.options.mag_filter,
        }
    }
}

/// A pooled render target lent out by [`RenderTargetPool::acquire`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RenderTarget {
    /// Device texture.
    pub texture: TextureId,
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// Key the target was pooled under.
    pub key: PoolKey,
}

/// Pool counters; `live` and `free` are computed at snapshot time.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PoolStats {
    /// Device allocations performed by the pool.
    pub allocations: u64,
    /// Acquisitions satisfied by a free entry.
    pub reuses: u64,
    /// Targets handed back.
    pub releases: u64,
    /// Device textures the pool destroyed.
    pub destroyed: u64,
    /// Entries lent out.
    pub live: usize,
    /// Entries waiting for reuse.
    pub free: usize,
}

struct Entry {
    target: RenderTarget,
    in_use: bool,
}

/// Reuse cache of device render targets keyed by size, format and filtering.
///
/// Entries are never evicted implicitly; they go away on [`purge_free`](Self::purge_free),
/// [`purge_stale`](Self::purge_stale) or [`teardown`](Self::teardown). Contents of a reused
/// target are stale: clearing is the caller's job.
#[derive(Default)]
pub struct RenderTargetPool {
    entries: Vec<Entry>,
    stats: PoolStats,
}

impl RenderTargetPool {
    /// An empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counter snapshot.
    pub fn stats(&self) -> PoolStats {
        let mut stats = self.stats.clone();
        stats.live = self.entries.iter().filter(|e| e.in_use).count();
        stats.free = self.entries.len() - stats.live;
        stats
    }

    /// Entries owned, lent out or free.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the pool owns nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lend a free target with the exact key, or allocate one. Zero sizes are bumped to one texel.
    pub fn acquire(
        &mut self,
        device: &mut dyn Device,
        width: u32,
        height: u32,
        options: TargetOptions,
    ) -> StrataResult<RenderTarget> {
        let key = PoolKey {
            width: width.max(1),
            height: height.max(1),
            options,
        };
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| !e.in_use && e.target.key == key)
        {
            entry.in_use = true;
            self.stats.reuses += 1;
            return Ok(entry.target);
        }

        let texture = device.create_target(&key.desc())?;
        let target = RenderTarget {
            texture,
            width: key.width,
            height: key.height,
            key,
        };
        self.entries.push(Entry {
            target,
            in_use: true,
        });
        self.stats.allocations += 1;
        tracing::trace!(
            width = key.width,
            height = key.height,
            format = ?options.format,
            "pool allocated target"
        );
        Ok(target)
    }

    /// Return `target` for reuse. Double releases and foreign targets are ignored.
    pub fn release(&mut self, target: RenderTarget) {
        match self
            .entries
            .iter_mut()
            .find(|e| e.target.texture == target.texture)
        {
            Some(entry) if entry.in_use => {
                entry.in_use = false;
                self.stats.releases += 1;
            }
            Some(_) => {
                tracing::warn!(texture = ?target.texture, "double release of pooled target")
            }
            None => tracing::warn!(
                texture = ?target.texture,
                "release of a target the pool does not own"
            ),
        }
    }

    /// Whether `target` is currently lent out.
    pub fn is_in_use(&self, target: &RenderTarget) -> bool {
        self.entries
            .iter()
            .any(|e| e.in_use && e.target.texture == target.texture)
    }

    /// Destroy every free entry; returns how many were destroyed.
    pub fn purge_free(&mut self, device: &mut dyn Device) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| {
            if e.in_use {
                true
            } else {
                device.destroy_texture(e.target.texture);
                false
            }
        });
        let n = before - self.entries.len();
        self.stats.destroyed += n as u64;
        n
    }

    /// Destroy free entries whose size no in-use entry shares; returns how many were destroyed.
    ///
    /// Run after a viewport change so targets left at an old size do not pile up.
    pub fn purge_stale(&mut self, device: &mut dyn Device) -> usize {
        let live: Vec<(u32, u32)> = self
            .entries
            .iter()
            .filter(|e| e.in_use)
            .map(|e| (e.target.width, e.target.height))
            .collect();
        let before = self.entries.len();
        self.entries.retain(|e| {
            if e.in_use || live.contains(&(e.target.width, e.target.height)) {
                true
            } else {
                device.destroy_texture(e.target.texture);
                false
            }
        });
        let n = before - self.entries.len();
        self.stats.destroyed += n as u64;
        if n > 0 {
            tracing::debug!(destroyed = n, "pool purged stale targets");
        }
        n
    }

    /// Destroy every entry, live or free.
    pub fn teardown(&mut self, device: &mut dyn Device) {
        let live = self.entries.iter().filter(|e| e.in_use).count();
        if live > 0 {
            tracing::debug!(live, "pool teardown with targets still in use");
        }
        self.stats.destroyed += self.entries.len() as u64;
        for e in self.entries.drain(..) {
            device.destroy_texture(e.target.texture);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/target_pool.rs"]
mod tests;
