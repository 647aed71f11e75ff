use crate::assets::media::MediaImage;
use crate::foundation::core::Rgba;
use crate::foundation::error::{StrataError, StrataResult};
use crate::layers::model::{LayerDescriptor, ShaderType};
use crate::layers::param::Param;
use crate::passes::base_quad::{BaseQuad, FitMode};
use crate::passes::factory::create_pass;
use crate::passes::{CompositeSettings, Pass, RenderCtx};
use crate::pipeline::opts::PipelineOpts;
use crate::render::device::{Device, DeviceStats, TextureId};
use crate::render::ping_pong::PingPong;
use crate::render::target_pool::{PoolStats, RenderTargetPool};

/// Lifecycle of a [`PipelineManager`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    /// Constructed; no targets yet.
    Uninitialized,
    /// Targets allocated; frames can be rendered.
    Ready,
    /// Torn down; every call fails or no-ops.
    Disposed,
}

/// What one [`PipelineManager::render`] call did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Visible passes whose output made it into the frame.
    pub passes_run: usize,
    /// Visible passes that failed and were skipped.
    pub passes_failed: usize,
}

struct Slot {
    layer: LayerDescriptor,
    pass: Box<dyn Pass>,
    /// Set while the pass keeps failing, so the failure is logged once per streak.
    failing: bool,
}

/// Owns the device, the target pool, the main ping-pong pair, the base quad and one pass per
/// layer, and runs them bottom-to-top every frame.
pub struct PipelineManager {
    opts: PipelineOpts,
    device: Box<dyn Device>,
    pool: RenderTargetPool,
    targets: Option<PingPong>,
    base: BaseQuad,
    slots: Vec<Slot>,
    size: (u32, u32),
    state: PipelineState,
    dirty: bool,
    /// Passes that size lazily release their old targets during the next frame.
    purge_pending: bool,
}

impl PipelineManager {
    /// Validate `opts` and wrap `device`. Nothing is allocated until [`init`](Self::init).
    pub fn new(device: Box<dyn Device>, opts: PipelineOpts) -> StrataResult<Self> {
        opts.validate()?;
        let base = BaseQuad::new(opts.fit, opts.background, opts.linear_working_space)?;
        Ok(Self {
            opts,
            device,
            pool: RenderTargetPool::new(),
            targets: None,
            base,
            slots: Vec::new(),
            size: (0, 0),
            state: PipelineState::Uninitialized,
            dirty: true,
            purge_pending: false,
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Options the pipeline was built with.
    pub fn opts(&self) -> &PipelineOpts {
        &self.opts
    }

    /// Viewport size in pixels.
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    fn ensure_live(&self, what: &str) -> StrataResult<()> {
        if self.state == PipelineState::Disposed {
            return Err(StrataError::state(format!("{what} after dispose")));
        }
        Ok(())
    }

    /// Allocate the surface and ping-pong pair; moves to [`PipelineState::Ready`].
    pub fn init(&mut self, width: u32, height: u32) -> StrataResult<()> {
        self.ensure_live("init")?;
        if self.state == PipelineState::Ready {
            return self.resize(width, height);
        }
        let (width, height) = (width.max(1), height.max(1));
        self.device.resize_surface(width, height)?;
        let targets = PingPong::acquire(
            &mut *self.device,
            &mut self.pool,
            width,
            height,
            self.opts.target_options(),
        )?;
        targets.clear(&mut *self.device, [0.0; 4])?;
        self.targets = Some(targets);
        self.size = (width, height);
        self.state = PipelineState::Ready;
        let mut ctx = RenderCtx::new(&mut *self.device, &mut self.pool, self.opts.target_options());
        for slot in &mut self.slots {
            if let Err(e) = slot.pass.resize(&mut ctx, width, height) {
                tracing::warn!(layer = %slot.layer.id, error = %e, "pass resize failed");
            }
        }
        self.dirty = true;
        tracing::debug!(
            backend = self.device.backend_name(),
            width,
            height,
            "pipeline ready"
        );
        Ok(())
    }

    /// Reconcile the live passes with `layers` by id. Survivors get the new params and
    /// composite settings; a survivor whose shader type changed is rebuilt. Pass order follows
    /// `layers`. Later duplicates of an id are ignored.
    pub fn sync_layers(&mut self, layers: &[LayerDescriptor]) -> StrataResult<()> {
        self.ensure_live("sync_layers")?;
        let mut old = std::mem::take(&mut self.slots);
        let mut next: Vec<Slot> = Vec::with_capacity(layers.len());
        let targets = self.opts.target_options();

        for layer in layers {
            if next.iter().any(|s| s.layer.id == layer.id) {
                tracing::warn!(layer = %layer.id, "duplicate layer id; keeping the first");
                continue;
            }
            let existing = old
                .iter()
                .position(|s| s.layer.id == layer.id)
                .map(|i| old.swap_remove(i));
            let slot = match existing {
                Some(mut slot) if slot.layer.shader_type == layer.shader_type => {
                    slot.pass.update_uniforms(&layer.params);
                    slot.pass.set_composite(CompositeSettings::from_layer(layer));
                    slot.layer = layer.clone();
                    slot
                }
                existing => {
                    if let Some(mut stale) = existing {
                        tracing::debug!(layer = %layer.id, "shader type changed; recreating pass");
                        let mut ctx = RenderCtx::new(&mut *self.device, &mut self.pool, targets);
                        stale.pass.dispose(&mut ctx);
                    }
                    let mut pass = create_pass(layer, &self.opts);
                    if self.state == PipelineState::Ready {
                        let mut ctx = RenderCtx::new(&mut *self.device, &mut self.pool, targets);
                        if let Err(e) = pass.resize(&mut ctx, self.size.0, self.size.1) {
                            tracing::warn!(layer = %layer.id, error = %e, "pass resize failed");
                        }
                    }
                    Slot {
                        layer: layer.clone(),
                        pass,
                        failing: false,
                    }
                }
            };
            next.push(slot);
        }

        for mut gone in old {
            tracing::debug!(layer = %gone.layer.id, "layer removed; disposing pass");
            let mut ctx = RenderCtx::new(&mut *self.device, &mut self.pool, targets);
            gone.pass.dispose(&mut ctx);
        }
        self.slots = next;
        self.dirty = true;
        Ok(())
    }

    /// Draw the base quad, run every visible pass in order through the ping-pong pair and
    /// present the result. A failing pass is skipped; the rest of the frame still composites.
    pub fn render(&mut self, time: f32, delta: f32) -> StrataResult<FrameReport> {
        if self.state != PipelineState::Ready {
            return Err(StrataError::state(format!(
                "render in state {:?}",
                self.state
            )));
        }
        let targets = self
            .targets
            .as_mut()
            .ok_or_else(|| StrataError::state("pipeline has no targets"))?;
        self.base.render(&mut *self.device, targets.read_texture())?;

        let mut report = FrameReport::default();
        let mut ctx = RenderCtx::new(&mut *self.device, &mut self.pool, self.opts.target_options());
        for slot in self.slots.iter_mut().filter(|s| s.layer.visible) {
            let (input, output) = (targets.read_texture(), targets.write_texture());
            debug_assert_ne!(input, output, "pass input aliases its output");
            match slot.pass.render(&mut ctx, input, output, time, delta) {
                Ok(()) => {
                    targets.swap();
                    report.passes_run += 1;
                    if slot.failing {
                        tracing::info!(layer = %slot.layer.id, "pass recovered");
                        slot.failing = false;
                    }
                }
                Err(e) => {
                    report.passes_failed += 1;
                    if !slot.failing {
                        tracing::warn!(
                            layer = %slot.layer.id,
                            shader = slot.layer.shader_type.name(),
                            error = %e,
                            "pass failed; skipping its contribution"
                        );
                        slot.failing = true;
                    }
                }
            }
        }

        ctx.device
            .present(targets.read_texture(), self.opts.linear_working_space)?;
        self.dirty = false;
        if self.purge_pending {
            self.pool.purge_stale(&mut *self.device);
            self.purge_pending = false;
        }
        Ok(report)
    }

    /// `true` when state changed since the last frame or a visible pass animates.
    pub fn needs_render(&self) -> bool {
        if self.state != PipelineState::Ready {
            return false;
        }
        self.dirty
            || self
                .slots
                .iter()
                .any(|s| s.layer.visible && s.pass.needs_continuous_render())
    }

    /// Render only when [`needs_render`](Self::needs_render); returns whether a frame was drawn.
    pub fn render_if_needed(&mut self, time: f32, delta: f32) -> StrataResult<Option<FrameReport>> {
        if !self.needs_render() {
            return Ok(None);
        }
        self.render(time, delta).map(Some)
    }

    /// Propagate a viewport size to the surface, the ping-pong pair and every pass. No-op when
    /// the size is unchanged.
    pub fn resize(&mut self, width: u32, height: u32) -> StrataResult<()> {
        self.ensure_live("resize")?;
        let (width, height) = (width.max(1), height.max(1));
        if self.state == PipelineState::Uninitialized {
            return self.init(width, height);
        }
        if self.size == (width, height) {
            return Ok(());
        }
        self.device.resize_surface(width, height)?;
        if let Some(targets) = self.targets.as_mut()
            && targets.resize(&mut *self.device, &mut self.pool, width, height)?
        {
            targets.clear(&mut *self.device, [0.0; 4])?;
        }
        self.size = (width, height);
        let mut ctx = RenderCtx::new(&mut *self.device, &mut self.pool, self.opts.target_options());
        for slot in &mut self.slots {
            if let Err(e) = slot.pass.resize(&mut ctx, width, height) {
                tracing::warn!(layer = %slot.layer.id, error = %e, "pass resize failed");
            }
        }
        self.pool.purge_stale(&mut *self.device);
        self.purge_pending = true;
        self.dirty = true;
        Ok(())
    }

    /// Push params to one layer without a full sync. Returns `false` for unknown ids.
    pub fn update_layer_params(&mut self, id: &str, params: &[Param]) -> bool {
        let Some(slot) = self.slots.iter_mut().find(|s| s.layer.id == id) else {
            tracing::debug!(layer = %id, "param update for unknown layer");
            return false;
        };
        slot.pass.update_uniforms(params);
        for p in params {
            match slot.layer.params.iter_mut().find(|q| q.key == p.key) {
                Some(q) => *q = p.clone(),
                None => slot.layer.params.push(p.clone()),
            }
        }
        self.dirty = true;
        true
    }

    fn interactive_slots(&mut self) -> impl Iterator<Item = &mut Slot> {
        self.slots
            .iter_mut()
            .filter(|s| s.layer.shader_type == ShaderType::Interactivity)
    }

    /// Forward pointer state to every interactivity layer; no-op without one.
    pub fn set_pointer_for_interactivity(
        &mut self,
        u: f32,
        v: f32,
        du: f32,
        dv: f32,
        active: bool,
    ) {
        for slot in self.interactive_slots() {
            if let Some(sink) = slot.pass.interactivity() {
                sink.set_pointer(u, v, du, dv, active);
            }
        }
    }

    /// Queue a click burst on every visible interactivity layer.
    pub fn add_click_for_interactivity(&mut self, u: f32, v: f32) {
        for slot in self.interactive_slots() {
            if let Some(sink) = slot.pass.interactivity() {
                sink.add_click(u, v);
            }
        }
    }

    /// Upload new base media and mark the frame dirty. On failure the previous media stays.
    pub fn set_media(&mut self, image: &MediaImage) -> StrataResult<()> {
        self.ensure_live("set_media")?;
        self.base.set_media(&mut *self.device, image)?;
        self.dirty = true;
        Ok(())
    }

    /// Decode and show an encoded image; on failure the previous media stays.
    pub fn load_image_bytes(&mut self, bytes: &[u8]) -> bool {
        if self.state == PipelineState::Disposed {
            return false;
        }
        let applied = self.base.load_image_bytes(&mut *self.device, bytes);
        self.dirty |= applied;
        applied
    }

    /// Refresh the base media with a video or webcam frame.
    pub fn update_frame(&mut self, image: &MediaImage) -> StrataResult<()> {
        self.ensure_live("update_frame")?;
        self.base.update_frame(&mut *self.device, image)?;
        self.dirty = true;
        Ok(())
    }

    /// Change how the media fits the viewport.
    pub fn set_fit(&mut self, fit: FitMode) {
        self.base.set_fit(fit);
        self.dirty = true;
    }

    /// Change the color behind contained media.
    pub fn set_background(&mut self, rgba: Rgba) {
        self.base.set_background(rgba);
        self.dirty = true;
    }

    /// The base quad.
    pub fn base(&self) -> &BaseQuad {
        &self.base
    }

    /// Layer ids in execution order.
    pub fn layer_ids(&self) -> Vec<&str> {
        self.slots.iter().map(|s| s.layer.id.as_str()).collect()
    }

    /// Pass of the layer with `id`.
    pub fn pass(&self, id: &str) -> Option<&dyn Pass> {
        self.slots
            .iter()
            .find(|s| s.layer.id == id)
            .map(|s| s.pass.as_ref())
    }

    /// Target pool counters.
    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// Device counters.
    pub fn device_stats(&self) -> DeviceStats {
        self.device.stats()
    }

    /// The device, for readbacks and direct uploads.
    pub fn device_mut(&mut self) -> &mut dyn Device {
        &mut *self.device
    }

    /// Textures of the main pair as `(current, next)`.
    pub fn ping_pong_textures(&self) -> Option<(TextureId, TextureId)> {
        self.targets
            .as_ref()
            .map(|t| (t.read_texture(), t.write_texture()))
    }

    /// Read the last presented frame back as normalized RGBA.
    pub fn read_surface(&mut self) -> StrataResult<Vec<[f32; 4]>> {
        self.device.read_surface()
    }

    /// Dispose every pass, release the pair, drop the media and tear the pool down. Safe to call
    /// more than once.
    pub fn dispose(&mut self) {
        if self.state == PipelineState::Disposed {
            return;
        }
        let targets = self.opts.target_options();
        {
            let mut ctx = RenderCtx::new(&mut *self.device, &mut self.pool, targets);
            for mut slot in self.slots.drain(..) {
                slot.pass.dispose(&mut ctx);
            }
        }
        if let Some(pair) = self.targets.take() {
            pair.release(&mut self.pool);
        }
        self.base.dispose(&mut *self.device);
        self.pool.teardown(&mut *self.device);
        self.state = PipelineState::Disposed;
        tracing::debug!("pipeline disposed");
    }
}

impl Drop for PipelineManager {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/manager.rs"]
mod tests;
