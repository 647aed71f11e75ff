use crate::layers::model::ShaderType;
use crate::layers::param::ParamSpec;
use crate::passes::effect_pass::Effect;
use crate::passes::params::ParamState;
use crate::shader::ir::{Expr, clamp, hash21, join, mix, vec2, vec3};

/// Film grain: per-cell hashed noise added around the input color.
#[derive(Debug, Default)]
pub struct Grain;

impl Effect for Grain {
    const SHADER: ShaderType = ShaderType::Grain;
    const SPECS: &'static [ParamSpec] = &[
        ParamSpec::float("amount", 0.15, 0.0, 1.0),
        ParamSpec::float("size", 1.0, 0.5, 8.0),
        ParamSpec::boolean("animated", true),
        ParamSpec::boolean("monochrome", true),
    ];

    fn graph(&self, params: &ParamState) -> Expr {
        let c = Expr::sample(0, Expr::uv());
        let frame = (Expr::time() * 24.0).floor() * params.expr("animated");
        let cell = (Expr::uv() * Expr::resolution() / params.expr("size")).floor()
            + vec2(&frame * 17.0, &frame * 31.0);
        let mono = hash21(&cell);
        let colored = vec3(
            mono.clone(),
            hash21(&(&cell + vec2(19.19, 7.13))),
            hash21(&(&cell + vec2(3.71, 47.3))),
        );
        let n = mix(colored, mono, params.expr("monochrome")) - 0.5;
        let rgb = clamp(c.rgb() + n * params.expr("amount"), 0.0, 1.0);
        join([rgb, c.w()])
    }

    fn continuous(&self, params: &ParamState) -> bool {
        params.flag("animated") && params.f32("amount") > 0.0
    }
}

#[cfg(test)]
#[path = "../../tests/unit/passes/grain.rs"]
mod tests;
