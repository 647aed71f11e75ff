//! The pass contract and its implementations.
//!
//! A pass reads the chain's running image from `input` and writes `input ⊕ effect` into
//! `output`, composited through the shared blend composer with its layer's opacity, blend mode
//! and filter mode.

pub(crate) mod ascii;
pub(crate) mod base_quad;
pub(crate) mod bloom;
pub(crate) mod chromatic;
pub(crate) mod compose;
pub(crate) mod effect_pass;
pub(crate) mod factory;
pub(crate) mod grain;
pub(crate) mod halftone;
pub(crate) mod mesh_gradient;
pub(crate) mod noise;
pub(crate) mod params;
pub(crate) mod pixelate;
pub(crate) mod progressive_blur;
pub(crate) mod scratch;
pub(crate) mod shapes;

#[cfg(test)]
#[path = "../../tests/unit/passes/support.rs"]
pub(crate) mod test_support;

use crate::fluid::pointer::Interactivity;
use crate::foundation::error::StrataResult;
use crate::layers::model::{BlendMode, FilterMode, LayerDescriptor, ShaderType};
use crate::layers::param::Param;
use crate::render::device::{Device, TextureId};
use crate::render::target_pool::{RenderTargetPool, TargetOptions};
use crate::shader::program::Program;

/// Device access handed to passes for one call. The pool is shared by every pass of a pipeline.
pub struct RenderCtx<'a> {
    /// Device the pass draws with.
    pub device: &'a mut dyn Device,
    /// Shared target pool.
    pub pool: &'a mut RenderTargetPool,
    /// Options for private intermediate targets (the pipeline's working format).
    pub targets: TargetOptions,
}

impl<'a> RenderCtx<'a> {
    /// Bundle device access for one call.
    pub fn new(
        device: &'a mut dyn Device,
        pool: &'a mut RenderTargetPool,
        targets: TargetOptions,
    ) -> Self {
        Self {
            device,
            pool,
            targets,
        }
    }
}

/// How a pass's effect is merged onto its input.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompositeSettings {
    /// Blend weight in `0..=1`.
    pub opacity: f32,
    /// Compositing formula.
    pub blend_mode: BlendMode,
    /// How the blended color is gated.
    pub filter_mode: FilterMode,
}

impl Default for CompositeSettings {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            blend_mode: BlendMode::Normal,
            filter_mode: FilterMode::Filter,
        }
    }
}

impl CompositeSettings {
    /// Settings carried by a layer descriptor.
    pub fn from_layer(layer: &LayerDescriptor) -> Self {
        Self {
            opacity: layer.opacity,
            blend_mode: layer.blend_mode,
            filter_mode: layer.filter_mode,
        }
    }

    /// Opacity clamped to `0..=1`, NaN treated as 0.
    pub fn clamped_opacity(&self) -> f32 {
        if self.opacity.is_nan() {
            0.0
        } else {
            self.opacity.clamp(0.0, 1.0)
        }
    }
}

/// One layer's effect stage.
///
/// Lifecycle: construct, [`build`](Pass::build) once fully constructed, then any number of
/// `update_uniforms`/`resize`/`render` calls, and finally [`dispose`](Pass::dispose).
pub trait Pass {
    /// Layer kind the pass renders.
    fn shader_type(&self) -> ShaderType;

    /// Second construction phase: compile the pass programs. Until this succeeds the pass
    /// renders as a passthrough.
    fn build(&mut self) -> StrataResult<()>;

    /// Write the composited effect of `input` into `output`. `input != output`.
    fn render(
        &mut self,
        ctx: &mut RenderCtx<'_>,
        input: TextureId,
        output: TextureId,
        time: f32,
        delta: f32,
    ) -> StrataResult<()>;

    /// Apply a parameter list. Unknown keys are ignored and values are clamped.
    fn update_uniforms(&mut self, params: &[Param]);

    /// Replace opacity, blend mode and filter mode.
    fn set_composite(&mut self, settings: CompositeSettings);

    /// Reallocate private targets for a new output size. No-op when the size is unchanged.
    fn resize(&mut self, ctx: &mut RenderCtx<'_>, width: u32, height: u32) -> StrataResult<()>;

    /// Whether the pass animates and needs a frame every tick.
    fn needs_continuous_render(&self) -> bool {
        false
    }

    /// Release every device resource the pass owns.
    fn dispose(&mut self, ctx: &mut RenderCtx<'_>);

    /// The pointer sink of interactivity passes.
    fn interactivity(&mut self) -> Option<&mut dyn Interactivity> {
        None
    }

    /// Compiled programs, for diagnostics and shader dumps.
    fn programs(&self) -> Vec<&Program>;
}
