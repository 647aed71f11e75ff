use crate::foundation::error::StrataResult;
use crate::layers::model::ShaderType;
use crate::layers::param::{Param, ParamSpec};
use crate::passes::compose::Compose;
use crate::passes::params::ParamState;
use crate::passes::{CompositeSettings, Pass, RenderCtx};
use crate::render::device::{DrawCall, TextureId};
use crate::shader::ir::Expr;
use crate::shader::program::Program;

/// A single-draw effect: a shader graph over the input at slot 0.
pub trait Effect: 'static {
    /// Layer kind the effect renders.
    const SHADER: ShaderType;
    /// Parameters the effect declares.
    const SPECS: &'static [ParamSpec];

    /// The effect color (`vec4`, straight alpha) before compositing. Param uniforms are read
    /// through `params`; structural params may be read as plain values to pick a graph.
    fn graph(&self, params: &ParamState) -> Expr;

    /// Whether the effect animates on its own and needs a frame every tick.
    fn continuous(&self, _params: &ParamState) -> bool {
        false
    }

    /// Create device resources (textures bound after the input) before the first draw.
    fn prepare(&mut self, _ctx: &mut RenderCtx<'_>) -> StrataResult<()> {
        Ok(())
    }

    /// Textures bound at slots `1..`.
    fn extra_inputs(&self) -> Vec<TextureId> {
        Vec::new()
    }

    /// Return resources created in [`prepare`](Self::prepare).
    fn release(&mut self, _ctx: &mut RenderCtx<'_>) {}
}

/// [`Pass`] for any [`Effect`]. Starts as a passthrough; [`Pass::build`] swaps in the effect
/// program, and a structural param change rebuilds it before the next draw.
pub struct EffectPass<E: Effect> {
    effect: E,
    params: ParamState,
    compose: Compose,
    program: Program,
    /// Structural values the current program was compiled for; `None` until built.
    built_for: Option<Vec<u32>>,
}

impl<E: Effect> EffectPass<E> {
    /// A passthrough pass around `effect`.
    pub fn new(effect: E) -> Self {
        let mut params = ParamState::new(E::SPECS);
        let compose = Compose::declare(params.block_mut());
        Self {
            effect,
            params,
            compose,
            program: Program::passthrough(),
            built_for: None,
        }
    }

    /// Current param state.
    pub fn params(&self) -> &ParamState {
        &self.params
    }

    /// Whether the effect program has been compiled.
    pub fn is_built(&self) -> bool {
        self.built_for.is_some()
    }

    fn compile(&self) -> StrataResult<Program> {
        let effect = self.effect.graph(&self.params);
        let base = Expr::sample(0, Expr::uv());
        let root = self.compose.apply(self.params.block(), &base, &effect);
        Program::compile(E::SHADER.name(), &root, self.params.block())
    }

    fn rebuild_if_stale(&mut self) {
        let Some(built) = &self.built_for else {
            return;
        };
        if *built == self.params.structure() {
            return;
        }
        if let Err(e) = self.build() {
            tracing::warn!(
                shader = E::SHADER.name(),
                error = %e,
                "rebuild failed; passing through"
            );
        }
    }
}

impl<E: Effect> Pass for EffectPass<E> {
    fn shader_type(&self) -> ShaderType {
        E::SHADER
    }

    fn build(&mut self) -> StrataResult<()> {
        let structure = self.params.structure();
        match self.compile() {
            Ok(program) => {
                tracing::debug!(
                    shader = E::SHADER.name(),
                    instrs = program.instr_count(),
                    "built effect program"
                );
                self.program = program;
                self.built_for = Some(structure);
                Ok(())
            }
            Err(e) => {
                self.program = Program::passthrough();
                self.built_for = Some(structure);
                Err(e)
            }
        }
    }

    fn render(
        &mut self,
        ctx: &mut RenderCtx<'_>,
        input: TextureId,
        output: TextureId,
        time: f32,
        _delta: f32,
    ) -> StrataResult<()> {
        self.rebuild_if_stale();
        self.effect.prepare(ctx)?;
        let mut inputs = vec![input];
        inputs.extend(self.effect.extra_inputs());
        let uniforms = self.params.block().values();
        ctx.device.draw(&DrawCall {
            program: &self.program,
            uniforms: &uniforms,
            inputs: &inputs,
            output,
            time,
            label: E::SHADER.name(),
        })
    }

    fn update_uniforms(&mut self, params: &[Param]) {
        self.params.apply(params);
    }

    fn set_composite(&mut self, settings: CompositeSettings) {
        self.compose.write(self.params.block_mut(), settings);
    }

    fn resize(&mut self, _ctx: &mut RenderCtx<'_>, _width: u32, _height: u32) -> StrataResult<()> {
        Ok(())
    }

    fn needs_continuous_render(&self) -> bool {
        self.effect.continuous(&self.params)
    }

    fn dispose(&mut self, ctx: &mut RenderCtx<'_>) {
        self.effect.release(ctx);
    }

    fn programs(&self) -> Vec<&Program> {
        vec![&self.program]
    }
}

/// Copies its input; stands in for layers of an unknown shader type.
#[derive(Debug, Default)]
pub struct Passthrough;

impl Effect for Passthrough {
    const SHADER: ShaderType = ShaderType::Unknown;
    const SPECS: &'static [ParamSpec] = &[];

    fn graph(&self, _params: &ParamState) -> Expr {
        Expr::sample(0, Expr::uv())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/passes/effect_pass.rs"]
mod tests;
