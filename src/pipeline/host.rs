use crate::assets::media::MediaImage;
use crate::foundation::error::{StrataError, StrataResult};
use crate::layers::model::LayerDescriptor;
use crate::layers::param::Param;
use crate::pipeline::frame_clock::FrameClock;
use crate::pipeline::manager::PipelineManager;
use crate::pipeline::opts::PipelineOpts;
use crate::render::cpu::CpuDevice;
use crate::render::device::Device;

/// Rendering backend requested at init.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Reference device that shades on the CPU.
    #[default]
    Cpu,
    /// wgpu device; needs the `gpu` feature and an adapter.
    Gpu,
}

/// The three host-visible states, plus `Loading` before `init` resolves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InitStatus {
    /// `init` has not resolved yet.
    Loading,
    /// Frames can be rendered.
    Ready,
    /// The requested GPU API is missing; reported, never raised.
    Unsupported,
    /// Bring-up failed; see [`Compositor::last_error`].
    Error,
}

/// Host-facing facade: device bring-up, frame entry points and frame timing.
///
/// Every frame API is a no-op until [`init`](Self::init) reports [`InitStatus::Ready`]. Layers
/// and the viewport size given before that are remembered and applied on init.
pub struct Compositor {
    opts: PipelineOpts,
    status: InitStatus,
    manager: Option<PipelineManager>,
    clock: FrameClock,
    size: (u32, u32),
    layers: Vec<LayerDescriptor>,
    last_error: Option<String>,
}

impl Compositor {
    /// A compositor in [`InitStatus::Loading`]; nothing is allocated before `init`.
    pub fn new(opts: PipelineOpts) -> Self {
        Self {
            opts,
            status: InitStatus::Loading,
            manager: None,
            clock: FrameClock::new(),
            size: (1, 1),
            layers: Vec::new(),
            last_error: None,
        }
    }

    /// Current bring-up state.
    pub fn status(&self) -> InitStatus {
        self.status
    }

    /// Detail of the failure behind [`InitStatus::Error`].
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    async fn open_device(backend: BackendKind) -> StrataResult<Option<Box<dyn Device>>> {
        match backend {
            BackendKind::Cpu => Ok(Some(Box::new(CpuDevice::default()))),
            #[cfg(feature = "gpu")]
            BackendKind::Gpu => Ok(crate::render::gpu::WgpuDevice::request()
                .await?
                .map(|d| Box::new(d) as Box<dyn Device>)),
            #[cfg(not(feature = "gpu"))]
            BackendKind::Gpu => Ok(None),
        }
    }

    fn start(&mut self, device: Box<dyn Device>) -> StrataResult<PipelineManager> {
        let mut manager = PipelineManager::new(device, self.opts.clone())?;
        manager.init(self.size.0, self.size.1)?;
        manager.sync_layers(&self.layers)?;
        Ok(manager)
    }

    /// Bring up the device and pipeline. Calling it again after `Ready` returns `Ready`.
    pub async fn init(&mut self, backend: BackendKind) -> InitStatus {
        if self.status == InitStatus::Ready {
            return self.status;
        }
        self.status = match Self::open_device(backend).await {
            Ok(Some(device)) => match self.start(device) {
                Ok(manager) => {
                    self.manager = Some(manager);
                    InitStatus::Ready
                }
                Err(e) => {
                    self.last_error = Some(e.to_string());
                    InitStatus::Error
                }
            },
            Ok(None) => InitStatus::Unsupported,
            Err(e) => {
                self.last_error = Some(e.to_string());
                InitStatus::Error
            }
        };
        match self.status {
            InitStatus::Error => tracing::warn!(
                ?backend,
                error = self.last_error.as_deref().unwrap_or(""),
                "compositor init failed"
            ),
            status => tracing::info!(?backend, ?status, "compositor init"),
        }
        self.status
    }

    fn ready(&mut self, what: &str) -> Option<&mut PipelineManager> {
        if self.manager.is_none() {
            tracing::debug!(call = what, status = ?self.status, "compositor not ready; ignored");
        }
        self.manager.as_mut()
    }

    /// Render one frame at host time `time` seconds.
    pub fn render(&mut self, time: f64, delta: f32) {
        let Some(manager) = self.ready("render") else {
            return;
        };
        match manager.render(time as f32, delta) {
            Ok(_) => self.clock.tick(time),
            Err(e) => tracing::warn!(error = %e, "frame failed"),
        }
    }

    /// Render only when something changed or a layer animates; returns whether a frame ran.
    pub fn render_if_needed(&mut self, time: f64, delta: f32) -> bool {
        let Some(manager) = self.ready("render_if_needed") else {
            return false;
        };
        match manager.render_if_needed(time as f32, delta) {
            Ok(Some(_)) => {
                self.clock.tick(time);
                true
            }
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(error = %e, "frame failed");
                false
            }
        }
    }

    /// Remember the viewport size and resize the pipeline when ready.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.size = (width.max(1), height.max(1));
        let (w, h) = self.size;
        if let Some(manager) = self.ready("resize")
            && let Err(e) = manager.resize(w, h)
        {
            tracing::warn!(error = %e, "resize failed");
        }
    }

    /// Remember the layer stack and sync it when ready.
    pub fn sync_layers(&mut self, layers: &[LayerDescriptor]) {
        self.layers = layers.to_vec();
        if let Some(manager) = self.ready("sync_layers")
            && let Err(e) = manager.sync_layers(layers)
        {
            tracing::warn!(error = %e, "layer sync failed");
        }
    }

    /// Merge params into the remembered layer and push them to its pass.
    pub fn update_layer_params(&mut self, id: &str, params: &[Param]) {
        if let Some(layer) = self.layers.iter_mut().find(|l| l.id == id) {
            for p in params {
                match layer.params.iter_mut().find(|q| q.key == p.key) {
                    Some(q) => *q = p.clone(),
                    None => layer.params.push(p.clone()),
                }
            }
        }
        if let Some(manager) = self.ready("update_layer_params") {
            manager.update_layer_params(id, params);
        }
    }

    /// Forward pointer state to every interactivity layer.
    pub fn set_pointer_for_interactivity(
        &mut self,
        u: f32,
        v: f32,
        du: f32,
        dv: f32,
        active: bool,
    ) {
        if let Some(manager) = self.manager.as_mut() {
            manager.set_pointer_for_interactivity(u, v, du, dv, active);
        }
    }

    /// Forward a click to every interactivity layer.
    pub fn add_click_for_interactivity(&mut self, u: f32, v: f32) {
        if let Some(manager) = self.ready("add_click_for_interactivity") {
            manager.add_click_for_interactivity(u, v);
        }
    }

    /// Replace the base media; fails before init.
    pub fn set_media(&mut self, image: &MediaImage) -> StrataResult<()> {
        match self.ready("set_media") {
            Some(manager) => manager.set_media(image),
            None => Err(StrataError::state("compositor is not ready")),
        }
    }

    /// Frames per second over the last second of host time.
    pub fn fps(&self) -> f32 {
        self.clock.fps()
    }

    /// The pipeline, once ready.
    pub fn manager(&self) -> Option<&PipelineManager> {
        self.manager.as_ref()
    }

    /// Mutable pipeline, once ready.
    pub fn manager_mut(&mut self) -> Option<&mut PipelineManager> {
        self.manager.as_mut()
    }

    /// Tear everything down. Later calls are no-ops until the next `init`.
    pub fn dispose(&mut self) {
        if let Some(mut manager) = self.manager.take() {
            manager.dispose();
        }
        self.clock.reset();
        self.status = InitStatus::Loading;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/host.rs"]
mod tests;
