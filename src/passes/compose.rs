use crate::layers::model::FilterMode;
use crate::passes::CompositeSettings;
use crate::shader::ir::{Expr, Ty, blend, clamp, join, luminance, mix};
use crate::shader::uniforms::{UniformBlock, UniformHandle};

/// Uniform slots carrying a layer's composite settings, plus the graph tail that applies them.
///
/// Weight is `opacity * a` with `a = effect.a` in filter mode and `luminance(effect.rgb) *
/// effect.a` in mask mode; the output keeps the input's alpha.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Compose {
    opacity: UniformHandle,
    mode: UniformHandle,
    mask: UniformHandle,
}

impl Compose {
    pub(crate) fn declare(block: &mut UniformBlock) -> Self {
        Self {
            opacity: block.declare("layer_opacity", Ty::F32, [1.0, 0.0, 0.0, 0.0]),
            mode: block.declare("layer_blend", Ty::F32, [0.0; 4]),
            mask: block.declare("layer_mask", Ty::F32, [0.0; 4]),
        }
    }

    pub(crate) fn write(&self, block: &mut UniformBlock, settings: CompositeSettings) {
        block.set_f32(self.opacity, settings.clamped_opacity());
        block.set_f32(self.mode, settings.blend_mode.index() as f32);
        let mask = match settings.filter_mode {
            FilterMode::Filter => 0.0,
            FilterMode::Mask => 1.0,
        };
        block.set_f32(self.mask, mask);
    }

    /// `vec4(composite(base.rgb, effect.rgb, mode, weight), base.a)`.
    pub(crate) fn apply(&self, block: &UniformBlock, base: &Expr, effect: &Expr) -> Expr {
        let a = clamp(effect.w(), 0.0, 1.0);
        let masked = luminance(&effect.rgb()) * &a;
        let weight = block.expr(self.opacity) * mix(&a, masked, block.expr(self.mask));
        join([
            blend(base.rgb(), effect.rgb(), block.expr(self.mode), weight),
            base.w(),
        ])
    }
}

#[cfg(test)]
#[path = "../../tests/unit/passes/compose.rs"]
mod tests;
