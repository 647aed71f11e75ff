use std::f32::consts::{FRAC_1_SQRT_2, PI, SQRT_2};

use crate::layers::model::ShaderType;
use crate::layers::param::ParamSpec;
use crate::passes::effect_pass::Effect;
use crate::passes::params::ParamState;
use crate::shader::ir::{Expr, join, luminance, max, mix, rotate2, smoothstep};

const DOT_SHAPES: &[&str] = &["circle", "square", "diamond"];

/// Rotated grid of ink dots whose radius follows the darkness at each cell centre.
#[derive(Debug, Default)]
pub struct Halftone;

impl Effect for Halftone {
    const SHADER: ShaderType = ShaderType::Halftone;
    const SPECS: &'static [ParamSpec] = &[
        ParamSpec::float("gridSpacing", 8.0, 2.0, 200.0),
        ParamSpec::float("dotScale", 1.0, 0.0, 2.0),
        ParamSpec::float("angle", 45.0, -180.0, 180.0),
        ParamSpec::float("softness", 0.1, 0.0, 1.0),
        ParamSpec::color("inkColor", [0.0, 0.0, 0.0]),
        ParamSpec::color("paperColor", [1.0, 1.0, 1.0]),
        ParamSpec::choice("dotShape", 0, DOT_SHAPES).structural(),
    ];

    fn graph(&self, params: &ParamState) -> Expr {
        let res = Expr::resolution();
        let half = &res * 0.5;
        let spacing = params.expr("gridSpacing");
        let angle = params.expr("angle") * (PI / 180.0);

        let p = rotate2(&(Expr::uv() * &res - &half), &(-&angle));
        let centre = ((&p / &spacing).floor() + 0.5) * &spacing;
        let local = &p - &centre;
        let centre_uv = (rotate2(&centre, &angle) + &half) / &res;
        let lum = luminance(&Expr::sample(0, centre_uv).rgb()).saturate();

        let radius =
            &spacing * 0.5 * params.expr("dotScale") * (1.0 - lum).sqrt() * SQRT_2;
        let d = match params.choice("dotShape") {
            1 => max(local.x().abs(), local.y().abs()),
            2 => (local.x().abs() + local.y().abs()) * FRAC_1_SQRT_2,
            _ => local.length(),
        };
        let soft = max(params.expr("softness") * &spacing * 0.5, 0.5);
        let ink = 1.0 - smoothstep(&radius - &soft, &radius, d);
        let rgb = mix(params.expr("paperColor"), params.expr("inkColor"), ink);
        join([rgb, Expr::lit(1.0)])
    }
}

#[cfg(test)]
#[path = "../../tests/unit/passes/halftone.rs"]
mod tests;
