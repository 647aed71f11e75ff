use std::f32::consts::PI;

use crate::layers::model::ShaderType;
use crate::layers::param::ParamSpec;
use crate::passes::effect_pass::Effect;
use crate::passes::params::ParamState;
use crate::shader::ir::{Expr, mix, vec2, vec4};

/// Splits red and blue along an axis (or radially from the centre).
#[derive(Debug, Default)]
pub struct ChromaticAberration;

impl Effect for ChromaticAberration {
    const SHADER: ShaderType = ShaderType::ChromaticAberration;
    const SPECS: &'static [ParamSpec] = &[
        ParamSpec::float("amount", 0.005, 0.0, 0.1),
        ParamSpec::float("angle", 0.0, -180.0, 180.0),
        ParamSpec::boolean("radial", false),
    ];

    fn graph(&self, params: &ParamState) -> Expr {
        let uv = Expr::uv();
        let angle = params.expr("angle") * (PI / 180.0);
        let axis = vec2(angle.cos(), angle.sin());
        let radial = (&uv - 0.5) * 2.0;
        let offset = mix(axis, radial, params.expr("radial")) * params.expr("amount");
        let centre = Expr::sample(0, &uv);
        vec4(
            Expr::sample(0, &uv + &offset).x(),
            centre.y(),
            Expr::sample(0, &uv - &offset).z(),
            centre.w(),
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/passes/chromatic.rs"]
mod tests;
