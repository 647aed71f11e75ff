use crate::foundation::error::StrataResult;
use crate::layers::model::ShaderType;
use crate::layers::param::{Param, ParamSpec};
use crate::passes::compose::Compose;
use crate::passes::params::ParamState;
use crate::passes::progressive_blur::gaussian_line;
use crate::passes::scratch::Scratch;
use crate::passes::{CompositeSettings, Pass, RenderCtx};
use crate::render::device::{DrawCall, TextureId};
use crate::shader::ir::{Expr, join, luminance, max, vec2};
use crate::shader::program::Program;

const BLUR_HALF_TAPS: usize = 4;

struct Programs {
    bright: Program,
    blur_h: Program,
    blur_v: Program,
    combine: Program,
}

/// Bright-pass, separable blur at half resolution, additive recombination.
pub struct Bloom {
    params: ParamState,
    compose: Compose,
    programs: Option<Programs>,
    passthrough: Program,
    ping: Scratch,
    pong: Scratch,
}

impl Default for Bloom {
    fn default() -> Self {
        Self::new()
    }
}

impl Bloom {
    /// Parameters of the bloom layer.
    pub const SPECS: &'static [ParamSpec] = &[
        ParamSpec::float("threshold", 0.7, 0.0, 1.0),
        ParamSpec::float("intensity", 1.0, 0.0, 4.0),
        ParamSpec::float("radius", 8.0, 0.0, 32.0),
    ];

    /// An unbuilt bloom pass.
    pub fn new() -> Self {
        let mut params = ParamState::new(Self::SPECS);
        let compose = Compose::declare(params.block_mut());
        Self {
            params,
            compose,
            programs: None,
            passthrough: Program::passthrough(),
            ping: Scratch::default(),
            pong: Scratch::default(),
        }
    }

    fn compile(&self) -> StrataResult<Programs> {
        let block = self.params.block();
        let uv = Expr::uv();

        let c = Expr::sample(0, &uv);
        let l = luminance(&c.rgb());
        let k = max(&l - self.params.expr("threshold"), 0.0) / max(&l, 1e-4);
        let bright = join([c.rgb() * k, Expr::lit(1.0)]);

        let radius = self.params.expr("radius");
        let h_step = vec2(&radius * Expr::texel_size(0).x(), 0.0);
        let v_step = vec2(0.0, &radius * Expr::texel_size(0).y());

        let glow = Expr::sample(1, &uv).rgb() * self.params.expr("intensity");
        let effect = join([c.rgb() + glow, Expr::lit(1.0)]);
        let combine = self.compose.apply(block, &c, &effect);

        Ok(Programs {
            bright: Program::compile("bloom-bright", &bright, block)?,
            blur_h: Program::compile(
                "bloom-blur-h",
                &gaussian_line(0, &uv, &h_step, BLUR_HALF_TAPS),
                block,
            )?,
            blur_v: Program::compile(
                "bloom-blur-v",
                &gaussian_line(0, &uv, &v_step, BLUR_HALF_TAPS),
                block,
            )?,
            combine: Program::compile("bloom", &combine, block)?,
        })
    }
}

impl Pass for Bloom {
    fn shader_type(&self) -> ShaderType {
        ShaderType::Bloom
    }

    fn build(&mut self) -> StrataResult<()> {
        self.programs = None;
        self.programs = Some(self.compile()?);
        Ok(())
    }

    fn render(
        &mut self,
        ctx: &mut RenderCtx<'_>,
        input: TextureId,
        output: TextureId,
        time: f32,
        _delta: f32,
    ) -> StrataResult<()> {
        let uniforms = self.params.block().values();
        let Some(programs) = &self.programs else {
            return ctx.device.draw(&DrawCall {
                program: &self.passthrough,
                uniforms: &uniforms,
                inputs: &[input],
                output,
                time,
                label: "bloom-passthrough",
            });
        };
        let (w, h) = ctx.device.texture_size(output).unwrap_or((2, 2));
        let (hw, hh) = ((w / 2).max(1), (h / 2).max(1));
        let a = self.ping.ensure(ctx, hw, hh)?;
        let b = self.pong.ensure(ctx, hw, hh)?;

        let steps: [(&Program, &[TextureId], TextureId, &str); 4] = [
            (&programs.bright, &[input], a, "bloom-bright"),
            (&programs.blur_h, &[a], b, "bloom-blur-h"),
            (&programs.blur_v, &[b], a, "bloom-blur-v"),
            (&programs.combine, &[input, a], output, "bloom"),
        ];
        for (program, inputs, out, label) in steps {
            ctx.device.draw(&DrawCall {
                program,
                uniforms: &uniforms,
                inputs,
                output: out,
                time,
                label,
            })?;
        }
        Ok(())
    }

    fn update_uniforms(&mut self, params: &[Param]) {
        self.params.apply(params);
    }

    fn set_composite(&mut self, settings: CompositeSettings) {
        self.compose.write(self.params.block_mut(), settings);
    }

    fn resize(&mut self, ctx: &mut RenderCtx<'_>, width: u32, height: u32) -> StrataResult<()> {
        let (hw, hh) = ((width / 2).max(1), (height / 2).max(1));
        self.ping.resize(ctx, hw, hh)?;
        self.pong.resize(ctx, hw, hh)
    }

    fn dispose(&mut self, ctx: &mut RenderCtx<'_>) {
        self.ping.release(ctx);
        self.pong.release(ctx);
    }

    fn programs(&self) -> Vec<&Program> {
        match &self.programs {
            Some(p) => vec![&p.bright, &p.blur_h, &p.blur_v, &p.combine],
            None => vec![&self.passthrough],
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/passes/bloom.rs"]
mod tests;
