use crate::fluid::config::FluidConfig;
use crate::foundation::core::Rgba;
use crate::foundation::error::{StrataError, StrataResult};
use crate::passes::base_quad::FitMode;
use crate::render::device::TextureFormat;
use crate::render::target_pool::TargetOptions;

/// Options for a [`PipelineManager`](crate::PipelineManager).
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PipelineOpts {
    /// Format of the main ping-pong pair and every pass-private target.
    pub working_format: TextureFormat,
    /// Decode media from sRGB on upload and re-encode on present.
    pub linear_working_space: bool,
    /// Shown where no media covers the viewport (straight RGBA).
    pub background: Rgba,
    /// How media fits the viewport.
    pub fit: FitMode,
    /// Fluid solver knobs shared by every interactivity layer.
    pub fluid: FluidConfig,
    /// Pending pointer splats kept per interactivity layer; older ones are dropped.
    pub max_splat_queue: usize,
    /// Pointer moves shorter than this many pixels do not splat.
    pub pointer_noise_px: f32,
}

impl Default for PipelineOpts {
    fn default() -> Self {
        Self {
            working_format: TextureFormat::Rgba16Float,
            linear_working_space: false,
            background: [0.0, 0.0, 0.0, 1.0],
            fit: FitMode::Cover,
            fluid: FluidConfig::default(),
            max_splat_queue: 64,
            pointer_noise_px: 1.0,
        }
    }
}

fn env_u32(name: &str) -> Option<u32> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse::<u32>().ok().filter(|&n| n > 0) {
        Some(n) => Some(n),
        None => {
            tracing::warn!(var = name, value = %raw, "ignoring invalid override");
            None
        }
    }
}

impl PipelineOpts {
    /// Parse camelCase JSON options; missing keys take their defaults.
    pub fn from_json_str(json: &str) -> StrataResult<Self> {
        let opts: Self = serde_json::from_str(json)
            .map_err(|e| StrataError::validation(format!("invalid pipeline options: {e}")))?;
        opts.validate()?;
        Ok(opts)
    }

    /// Apply `STRATA_PRESSURE_ITERATIONS`, `STRATA_SIM_RESOLUTION` and `STRATA_DYE_RESOLUTION`.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(n) = env_u32("STRATA_PRESSURE_ITERATIONS") {
            self.fluid.pressure_iterations = n;
        }
        if let Some(n) = env_u32("STRATA_SIM_RESOLUTION") {
            self.fluid.sim_resolution = n;
        }
        if let Some(n) = env_u32("STRATA_DYE_RESOLUTION") {
            self.fluid.dye_resolution = n;
        }
        self
    }

    /// Reject non-finite colors, empty queues and bad fluid knobs.
    pub fn validate(&self) -> StrataResult<()> {
        if !self.background.iter().all(|c| c.is_finite()) {
            return Err(StrataError::validation("background must be finite"));
        }
        if self.max_splat_queue == 0 {
            return Err(StrataError::validation("maxSplatQueue must be >= 1"));
        }
        if !(self.pointer_noise_px.is_finite() && self.pointer_noise_px >= 0.0) {
            return Err(StrataError::validation("pointerNoisePx must be finite and >= 0"));
        }
        self.fluid.validate()
    }

    /// Options for the ping-pong pair and pass-private targets.
    pub fn target_options(&self) -> TargetOptions {
        TargetOptions::default().with_format(self.working_format)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/opts.rs"]
mod tests;
