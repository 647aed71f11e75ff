use crate::layers::model::ShaderType;
use crate::layers::param::ParamSpec;
use crate::passes::effect_pass::Effect;
use crate::passes::params::ParamState;
use crate::shader::ir::{Expr, join, smoothstep};

const CELL_SHAPES: &[&str] = &["square", "circle"];

/// Block mosaic with square or round cells.
#[derive(Debug, Default)]
pub struct Pixelate;

impl Effect for Pixelate {
    const SHADER: ShaderType = ShaderType::Pixelate;
    const SPECS: &'static [ParamSpec] = &[
        ParamSpec::float("pixelSize", 8.0, 1.0, 256.0),
        ParamSpec::choice("cellShape", 0, CELL_SHAPES).structural(),
    ];

    fn graph(&self, params: &ParamState) -> Expr {
        let res = Expr::resolution();
        let size = params.expr("pixelSize");
        let cell = Expr::uv() * &res / &size;
        let centre = (cell.floor() + 0.5) * &size / &res;
        let c = Expr::sample(0, centre);
        let coverage = match params.choice("cellShape") {
            1 => {
                let d = (cell.fract() - 0.5).length() * &size;
                let r = &size * 0.5;
                1.0 - smoothstep(&r - 1.0, &r, d)
            }
            _ => Expr::lit(1.0),
        };
        join([c.rgb(), c.w() * coverage])
    }
}

#[cfg(test)]
#[path = "../../tests/unit/passes/pixelate.rs"]
mod tests;
