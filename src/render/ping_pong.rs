use crate::foundation::error::StrataResult;
use crate::render::device::{Device, TextureId};
use crate::render::target_pool::{RenderTarget, RenderTargetPool, TargetOptions};

/// Two pooled targets used alternately as read source and write destination.
#[derive(Debug)]
pub struct PingPong {
    read: RenderTarget,
    write: RenderTarget,
}

impl PingPong {
    /// Acquire two distinct targets of one size, returning the first if the second fails.
    pub fn acquire(
        device: &mut dyn Device,
        pool: &mut RenderTargetPool,
        width: u32,
        height: u32,
        options: TargetOptions,
    ) -> StrataResult<Self> {
        let read = pool.acquire(device, width, height, options)?;
        let write = match pool.acquire(device, width, height, options) {
            Ok(t) => t,
            Err(e) => {
                pool.release(read);
                return Err(e);
            }
        };
        debug_assert_ne!(read.texture, write.texture);
        Ok(Self { read, write })
    }

    /// Pair two targets the caller already acquired from the same pool.
    pub(crate) fn from_pair(read: RenderTarget, write: RenderTarget) -> Self {
        debug_assert_ne!(read.texture, write.texture);
        Self { read, write }
    }

    /// Target read this step.
    pub fn read(&self) -> RenderTarget {
        self.read
    }

    /// Target written this step.
    pub fn write(&self) -> RenderTarget {
        self.write
    }

    /// Texture read this step.
    pub fn read_texture(&self) -> TextureId {
        self.read.texture
    }

    /// Texture written this step.
    pub fn write_texture(&self) -> TextureId {
        self.write.texture
    }

    /// Size shared by both targets.
    pub fn size(&self) -> (u32, u32) {
        (self.read.width, self.read.height)
    }

    /// Exchange roles; no texel data moves.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.read, &mut self.write);
        debug_assert_ne!(self.read.texture, self.write.texture);
    }

    /// Reacquire both targets at a new size. Returns `false` (and keeps both textures) when the
    /// size already matches.
    pub fn resize(
        &mut self,
        device: &mut dyn Device,
        pool: &mut RenderTargetPool,
        width: u32,
        height: u32,
    ) -> StrataResult<bool> {
        if self.size() == (width.max(1), height.max(1)) {
            return Ok(false);
        }
        let options = self.read.key.options;
        let fresh = Self::acquire(device, pool, width, height, options)?;
        let old = std::mem::replace(self, fresh);
        old.release(pool);
        Ok(true)
    }

    /// Fill both targets with one color.
    pub fn clear(&self, device: &mut dyn Device, rgba: [f32; 4]) -> StrataResult<()> {
        device.clear(self.read.texture, rgba)?;
        device.clear(self.write.texture, rgba)
    }

    /// Return both targets to the pool.
    pub fn release(self, pool: &mut RenderTargetPool) {
        pool.release(self.read);
        pool.release(self.write);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/ping_pong.rs"]
mod tests;
