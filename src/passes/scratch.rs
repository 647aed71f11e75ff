use crate::foundation::error::StrataResult;
use crate::passes::RenderCtx;
use crate::render::device::TextureId;
use crate::render::target_pool::RenderTarget;

/// A pass-private pooled target in the pipeline's working format that follows the pass's
/// output size.
#[derive(Debug, Default)]
pub(crate) struct Scratch {
    target: Option<RenderTarget>,
}

impl Scratch {
    /// Acquire (or reacquire at a new size) and return the texture.
    pub(crate) fn ensure(
        &mut self,
        ctx: &mut RenderCtx<'_>,
        width: u32,
        height: u32,
    ) -> StrataResult<TextureId> {
        let (width, height) = (width.max(1), height.max(1));
        let options = ctx.targets;
        if let Some(t) = self.target {
            if (t.width, t.height) == (width, height) && t.key.options == options {
                return Ok(t.texture);
            }
            ctx.pool.release(t);
            self.target = None;
        }
        let t = ctx.pool.acquire(&mut *ctx.device, width, height, options)?;
        self.target = Some(t);
        Ok(t.texture)
    }

    /// Follow a resize only when already allocated.
    pub(crate) fn resize(
        &mut self,
        ctx: &mut RenderCtx<'_>,
        width: u32,
        height: u32,
    ) -> StrataResult<()> {
        if self.target.is_some() {
            self.ensure(ctx, width, height)?;
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn texture(&self) -> Option<TextureId> {
        self.target.map(|t| t.texture)
    }

    pub(crate) fn release(&mut self, ctx: &mut RenderCtx<'_>) {
        if let Some(t) = self.target.take() {
            ctx.pool.release(t);
        }
    }
}
