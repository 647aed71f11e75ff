use std::f32::consts::PI;

use crate::foundation::error::StrataResult;
use crate::layers::model::ShaderType;
use crate::layers::param::{Param, ParamSpec};
use crate::passes::compose::Compose;
use crate::passes::params::ParamState;
use crate::passes::scratch::Scratch;
use crate::passes::{CompositeSettings, Pass, RenderCtx};
use crate::render::device::{DrawCall, TextureId};
use crate::shader::ir::{Expr, dot, max, smoothstep, vec2};
use crate::shader::program::Program;

const QUALITIES: &[&str] = &["low", "medium", "high"];

/// Normalised gaussian weights for taps `-half..=half`.
fn gaussian_weights(half: usize) -> Vec<f32> {
    let sigma = (half as f32 * 0.5).max(0.5);
    let raw: Vec<f32> = (-(half as i32)..=half as i32)
        .map(|k| (-0.5 * (k as f32 / sigma).powi(2)).exp())
        .collect();
    let sum: f32 = raw.iter().sum();
    raw.into_iter().map(|w| w / sum).collect()
}

/// Weighted line of `2 * half + 1` samples of `slot` around `uv`; tap `k` sits at
/// `uv + step * k / half`.
pub(crate) fn gaussian_line(slot: u8, uv: &Expr, step: &Expr, half: usize) -> Expr {
    let weights = gaussian_weights(half);
    let mut acc: Option<Expr> = None;
    for (i, w) in weights.into_iter().enumerate() {
        let k = i as f32 - half as f32;
        let offset = if half == 0 { 0.0 } else { k / half as f32 };
        let tap = Expr::sample(slot, uv + step * offset) * w;
        acc = Some(match acc {
            Some(a) => a + tap,
            None => tap,
        });
    }
    acc.unwrap_or_else(|| Expr::sample(slot, uv))
}

/// Blur whose radius ramps from zero to `maxRadius` along a direction, as a separable
/// horizontal pass into a private target followed by a composited vertical pass.
pub struct ProgressiveBlur {
    params: ParamState,
    compose: Compose,
    horizontal: Program,
    vertical: Program,
    built_for: Option<Vec<u32>>,
    scratch: Scratch,
}

impl Default for ProgressiveBlur {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressiveBlur {
    /// Parameters of the progressive blur layer.
    pub const SPECS: &'static [ParamSpec] = &[
        ParamSpec::float("maxRadius", 16.0, 0.0, 64.0),
        ParamSpec::float("start", 0.4, 0.0, 1.0),
        ParamSpec::float("end", 1.0, 0.0, 1.0),
        ParamSpec::float("angle", 90.0, -180.0, 180.0),
        ParamSpec::choice("quality", 1, QUALITIES).structural(),
    ];

    /// An unbuilt blur pass.
    pub fn new() -> Self {
        let mut params = ParamState::new(Self::SPECS);
        let compose = Compose::declare(params.block_mut());
        Self {
            params,
            compose,
            horizontal: Program::passthrough(),
            vertical: Program::passthrough(),
            built_for: None,
            scratch: Scratch::default(),
        }
    }

    /// Half the tap count for the current quality: 5, 9 or 13 taps.
    pub fn half_taps(&self) -> usize {
        match self.params.choice("quality") {
            0 => 2,
            2 => 6,
            _ => 4,
        }
    }

    fn radius(&self) -> Expr {
        let angle = self.params.expr("angle") * (PI / 180.0);
        let dir = vec2(angle.cos(), angle.sin());
        let along = dot(Expr::uv() - 0.5, dir) + 0.5;
        let start = self.params.expr("start");
        let end = max(self.params.expr("end"), &start + 1e-4);
        self.params.expr("maxRadius") * smoothstep(start, end, along)
    }

    fn compile(&self) -> StrataResult<(Program, Program)> {
        let half = self.half_taps();
        let uv = Expr::uv();
        let radius = self.radius();
        let block = self.params.block();

        let h_step = vec2(&radius * Expr::texel_size(0).x(), 0.0);
        let horizontal = Program::compile(
            "progressive-blur-h",
            &gaussian_line(0, &uv, &h_step, half),
            block,
        )?;

        let v_step = vec2(0.0, &radius * Expr::texel_size(1).y());
        let effect = gaussian_line(1, &uv, &v_step, half);
        let root = self
            .compose
            .apply(block, &Expr::sample(0, &uv), &effect);
        let vertical = Program::compile("progressive-blur-v", &root, block)?;
        Ok((horizontal, vertical))
    }
}

impl Pass for ProgressiveBlur {
    fn shader_type(&self) -> ShaderType {
        ShaderType::ProgressiveBlur
    }

    fn build(&mut self) -> StrataResult<()> {
        let structure = self.params.structure();
        let built = self.compile();
        self.built_for = Some(structure);
        match built {
            Ok((h, v)) => {
                self.horizontal = h;
                self.vertical = v;
                Ok(())
            }
            Err(e) => {
                self.horizontal = Program::passthrough();
                self.vertical = Program::passthrough();
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
        if let Some(built) = &self.built_for
            && *built != self.params.structure()
            && let Err(e) = self.build()
        {
            tracing::warn!(error = %e, "progressive blur rebuild failed; passing through");
        }
        let (w, h) = ctx.device.texture_size(output).unwrap_or((1, 1));
        let scratch = self.scratch.ensure(ctx, w, h)?;
        let uniforms = self.params.block().values();
        ctx.device.draw(&DrawCall {
            program: &self.horizontal,
            uniforms: &uniforms,
            inputs: &[input],
            output: scratch,
            time,
            label: "progressive-blur-h",
        })?;
        // Passthrough programs only read slot 0, so the input stays first.
        ctx.device.draw(&DrawCall {
            program: &self.vertical,
            uniforms: &uniforms,
            inputs: &[input, scratch],
            output,
            time,
            label: "progressive-blur-v",
        })
    }

    fn update_uniforms(&mut self, params: &[Param]) {
        self.params.apply(params);
    }

    fn set_composite(&mut self, settings: CompositeSettings) {
        self.compose.write(self.params.block_mut(), settings);
    }

    fn resize(&mut self, ctx: &mut RenderCtx<'_>, width: u32, height: u32) -> StrataResult<()> {
        self.scratch.resize(ctx, width, height)
    }

    fn dispose(&mut self, ctx: &mut RenderCtx<'_>) {
        self.scratch.release(ctx);
    }

    fn programs(&self) -> Vec<&Program> {
        vec![&self.horizontal, &self.vertical]
    }
}

#[cfg(test)]
#[path = "../../tests/unit/passes/progressive_blur.rs"]
mod tests;
