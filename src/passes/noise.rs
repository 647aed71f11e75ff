use crate::layers::model::ShaderType;
use crate::layers::param::ParamSpec;
use crate::passes::effect_pass::Effect;
use crate::passes::params::ParamState;
use crate::shader::ir::{Expr, hash21, join, mix, vec2};

/// Bilinear-smoothed lattice noise in `0..1`.
pub(crate) fn value_noise(p: &Expr) -> Expr {
    let i = p.floor();
    let f = p.fract();
    let u = &f * &f * (3.0 - &f * 2.0);
    let a = hash21(&i);
    let b = hash21(&(&i + vec2(1.0, 0.0)));
    let c = hash21(&(&i + vec2(0.0, 1.0)));
    let d = hash21(&(&i + vec2(1.0, 1.0)));
    mix(mix(a, b, u.x()), mix(c, d, u.x()), u.y())
}

/// Fractal value noise mapped between two colors.
#[derive(Debug, Default)]
pub struct Noise;

impl Effect for Noise {
    const SHADER: ShaderType = ShaderType::Noise;
    const SPECS: &'static [ParamSpec] = &[
        ParamSpec::float("scale", 4.0, 0.1, 64.0),
        ParamSpec::float("speed", 0.2, 0.0, 5.0),
        ParamSpec::int("octaves", 4, 1, 6).structural(),
        ParamSpec::float("contrast", 1.0, 0.0, 4.0),
        ParamSpec::color("colorA", [0.0, 0.0, 0.0]),
        ParamSpec::color("colorB", [1.0, 1.0, 1.0]),
    ];

    fn graph(&self, params: &ParamState) -> Expr {
        let res = Expr::resolution();
        let aspect = res.x() / res.y();
        let drift = Expr::time() * params.expr("speed");
        let p = vec2(Expr::uv().x() * aspect, Expr::uv().y()) * params.expr("scale")
            + vec2(&drift, &drift * 0.5);

        let octaves = params.choice("octaves").clamp(1, 6);
        let mut sum = Expr::lit(0.0);
        let mut norm = 0.0;
        let mut amp = 0.5;
        let mut freq = 1.0;
        for octave in 0..octaves {
            let shift = octave as f32 * 17.3;
            sum = sum + value_noise(&(&p * freq + shift)) * amp;
            norm += amp;
            amp *= 0.5;
            freq *= 2.0;
        }
        let n = ((sum / norm - 0.5) * params.expr("contrast") + 0.5).saturate();
        join([
            mix(params.expr("colorA"), params.expr("colorB"), n),
            Expr::lit(1.0),
        ])
    }

    fn continuous(&self, params: &ParamState) -> bool {
        params.f32("speed") > 0.0
    }
}

#[cfg(test)]
#[path = "../../tests/unit/passes/noise.rs"]
mod tests;
