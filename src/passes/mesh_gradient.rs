use crate::layers::model::ShaderType;
use crate::layers::param::ParamSpec;
use crate::passes::effect_pass::Effect;
use crate::passes::params::ParamState;
use crate::shader::ir::{Expr, dot, join, max, rgb_const, vec2};

const ANCHORS: [[f32; 2]; 4] = [[0.2, 0.2], [0.8, 0.25], [0.25, 0.8], [0.75, 0.75]];
const KEYS: [&str; 4] = ["colorA", "colorB", "colorC", "colorD"];

/// Four drifting color anchors blended by inverse squared distance over a warped plane.
#[derive(Debug, Default)]
pub struct MeshGradient;

impl Effect for MeshGradient {
    const SHADER: ShaderType = ShaderType::MeshGradient;
    const SPECS: &'static [ParamSpec] = &[
        ParamSpec::color("colorA", [0.98, 0.36, 0.45]),
        ParamSpec::color("colorB", [0.36, 0.42, 0.98]),
        ParamSpec::color("colorC", [0.99, 0.82, 0.35]),
        ParamSpec::color("colorD", [0.30, 0.85, 0.72]),
        ParamSpec::float("speed", 0.3, 0.0, 5.0),
        ParamSpec::float("warp", 0.3, 0.0, 1.0),
        ParamSpec::float("scale", 1.0, 0.1, 8.0),
    ];

    fn graph(&self, params: &ParamState) -> Expr {
        let t = Expr::time() * params.expr("speed");
        let uv = Expr::uv();
        let freq = params.expr("scale") * 6.0;
        let wobble = vec2(
            (uv.y() * &freq + &t).sin(),
            (uv.x() * &freq + &t * 1.3).cos(),
        );
        let p = &uv + wobble * params.expr("warp") * 0.15;

        let mut colour = rgb_const([0.0; 3]);
        let mut total = Expr::lit(0.0);
        for (i, (anchor, key)) in ANCHORS.iter().zip(KEYS).enumerate() {
            let phase = i as f32 * 1.7;
            let drift = vec2((&t * 0.7 + phase).sin(), (&t * 0.9 + phase * 1.3).cos()) * 0.15;
            let d = &p - (vec2(anchor[0], anchor[1]) + drift);
            let w = 1.0 / max(dot(&d, &d), 1e-4);
            colour = colour + params.expr(key) * &w;
            total = total + w;
        }
        join([colour / total, Expr::lit(1.0)])
    }

    fn continuous(&self, params: &ParamState) -> bool {
        params.f32("speed") > 0.0
    }
}

#[cfg(test)]
#[path = "../../tests/unit/passes/mesh_gradient.rs"]
mod tests;
