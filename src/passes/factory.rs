use crate::fluid::pass::FluidPass;
use crate::layers::model::{LayerDescriptor, ShaderType};
use crate::layers::param::ParamSpec;
use crate::passes::ascii::Ascii;
use crate::passes::bloom::Bloom;
use crate::passes::chromatic::ChromaticAberration;
use crate::passes::effect_pass::{Effect, EffectPass, Passthrough};
use crate::passes::grain::Grain;
use crate::passes::halftone::Halftone;
use crate::passes::mesh_gradient::MeshGradient;
use crate::passes::noise::Noise;
use crate::passes::pixelate::Pixelate;
use crate::passes::progressive_blur::ProgressiveBlur;
use crate::passes::shapes::{Shape2d, Shape3d};
use crate::passes::{CompositeSettings, Pass};
use crate::pipeline::opts::PipelineOpts;

/// Parameter table of a shader type; empty for unknown types.
pub fn param_specs(shader_type: ShaderType) -> &'static [ParamSpec] {
    match shader_type {
        ShaderType::Halftone => Halftone::SPECS,
        ShaderType::Pixelate => Pixelate::SPECS,
        ShaderType::Ascii => Ascii::SPECS,
        ShaderType::Grain => Grain::SPECS,
        ShaderType::ChromaticAberration => ChromaticAberration::SPECS,
        ShaderType::ProgressiveBlur => ProgressiveBlur::SPECS,
        ShaderType::MeshGradient => MeshGradient::SPECS,
        ShaderType::Shape2d => Shape2d::SPECS,
        ShaderType::Shape3d => Shape3d::SPECS,
        ShaderType::Noise => Noise::SPECS,
        ShaderType::Bloom => Bloom::SPECS,
        ShaderType::Interactivity => FluidPass::SPECS,
        ShaderType::Unknown => Passthrough::SPECS,
    }
}

/// Construct the pass for `shader_type` without params or build.
pub fn instantiate(shader_type: ShaderType, opts: &PipelineOpts) -> Box<dyn Pass> {
    match shader_type {
        ShaderType::Halftone => Box::new(EffectPass::new(Halftone)),
        ShaderType::Pixelate => Box::new(EffectPass::new(Pixelate)),
        ShaderType::Ascii => Box::new(EffectPass::new(Ascii::default())),
        ShaderType::Grain => Box::new(EffectPass::new(Grain)),
        ShaderType::ChromaticAberration => Box::new(EffectPass::new(ChromaticAberration)),
        ShaderType::ProgressiveBlur => Box::new(ProgressiveBlur::new()),
        ShaderType::MeshGradient => Box::new(EffectPass::new(MeshGradient)),
        ShaderType::Shape2d => Box::new(EffectPass::new(Shape2d)),
        ShaderType::Shape3d => Box::new(EffectPass::new(Shape3d)),
        ShaderType::Noise => Box::new(EffectPass::new(Noise)),
        ShaderType::Bloom => Box::new(Bloom::new()),
        ShaderType::Interactivity => Box::new(FluidPass::new(
            opts.fluid.clone(),
            opts.max_splat_queue,
            opts.pointer_noise_px,
        )),
        ShaderType::Unknown => Box::new(EffectPass::new(Passthrough)),
    }
}

/// Construct, configure and build the pass for one layer.
///
/// A failed build is logged and leaves the pass rendering as a passthrough.
pub fn create_pass(layer: &LayerDescriptor, opts: &PipelineOpts) -> Box<dyn Pass> {
    if layer.shader_type == ShaderType::Unknown {
        tracing::warn!(layer = %layer.id, "unknown shader type; layer passes its input through");
    }
    let mut pass = instantiate(layer.shader_type, opts);
    pass.update_uniforms(&layer.params);
    pass.set_composite(CompositeSettings::from_layer(layer));
    if let Err(e) = pass.build() {
        tracing::warn!(
            layer = %layer.id,
            shader = layer.shader_type.name(),
            error = %e,
            "pass build failed; passing through"
        );
    }
    tracing::debug!(layer = %layer.id, shader = layer.shader_type.name(), "created pass");
    pass
}

#[cfg(test)]
#[path = "../../tests/unit/passes/factory.rs"]
mod tests;
