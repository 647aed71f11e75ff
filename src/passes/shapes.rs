//! Analytic signed-distance shapes: flat 2D primitives and raymarched 3D solids.

use std::f32::consts::PI;

use crate::layers::model::ShaderType;
use crate::layers::param::ParamSpec;
use crate::passes::effect_pass::Effect;
use crate::passes::params::ParamState;
use crate::shader::ir::{
    Expr, clamp, dot, join, length, max, min, normalize, rotate2, select, smoothstep, vec2, vec3,
};

const SHAPES_2D: &[&str] = &["circle", "box", "triangle", "ring", "hexagon"];
const SHAPES_3D: &[&str] = &["sphere", "box", "torus", "octahedron"];

const MARCH_STEPS: usize = 40;
const FAR: f32 = 8.0;

fn sd_box2(p: &Expr, half: &Expr, round: &Expr) -> Expr {
    let q = p.abs() - (half - round);
    length(max(&q, 0.0)) + min(max(q.x(), q.y()), 0.0) - round
}

fn sd_triangle(p: &Expr, r: &Expr) -> Expr {
    let k = 3f32.sqrt();
    let p = vec2(p.x().abs() - r, -p.y() + r / k);
    let folded = vec2(p.x() - p.y() * k, -p.x() * k - p.y()) * 0.5;
    let p = select((p.x() + p.y() * k).gt(0.0), folded, &p);
    let px = p.x() - clamp(p.x(), r * -2.0, 0.0);
    -(length(vec2(&px, p.y()))) * p.y().sign()
}

fn sd_hexagon(p: &Expr, r: &Expr) -> Expr {
    let k = vec2(-0.866_025_4, 0.5);
    let kz = 0.577_350_27;
    let p = p.abs();
    let p = &p - &k * (min(dot(&k, &p), 0.0) * 2.0);
    let q = vec2(p.x() - clamp(p.x(), r * -kz, r * kz), p.y() - r);
    length(&q) * q.y().sign()
}

/// Flat SDF primitive composited over the input with an anti-aliased edge.
#[derive(Debug, Default)]
pub struct Shape2d;

impl Effect for Shape2d {
    const SHADER: ShaderType = ShaderType::Shape2d;
    const SPECS: &'static [ParamSpec] = &[
        ParamSpec::choice("shape", 0, SHAPES_2D).structural(),
        ParamSpec::vec2("center", [0.5, 0.5], 0.0, 1.0),
        ParamSpec::float("size", 0.25, 0.01, 1.0),
        ParamSpec::float("rotation", 0.0, -180.0, 180.0),
        ParamSpec::float("roundness", 0.0, 0.0, 0.5),
        ParamSpec::float("softness", 0.005, 0.0, 0.2),
        ParamSpec::color("color", [1.0, 1.0, 1.0]),
    ];

    fn graph(&self, params: &ParamState) -> Expr {
        let res = Expr::resolution();
        let aspect = res.x() / res.y();
        let d = Expr::uv() - params.expr("center");
        let p = vec2(d.x() * aspect, d.y());
        let p = rotate2(&p, &(params.expr("rotation") * (-PI / 180.0)));
        let size = params.expr("size");
        let dist = match params.choice("shape") {
            1 => {
                let round = min(params.expr("roundness"), &size);
                sd_box2(&p, &size, &round)
            }
            2 => sd_triangle(&p, &size),
            3 => (p.length() - &size).abs() - &size * 0.2,
            4 => sd_hexagon(&p, &size),
            _ => p.length() - &size,
        };
        let soft = max(params.expr("softness"), 1.0 / res.y());
        let coverage = 1.0 - smoothstep(-&soft, &soft, dist);
        join([params.expr("color"), coverage])
    }
}

fn rotate3(p: &Expr, angle: &Expr) -> Expr {
    let xz = rotate2(&p.swizzle("xz"), angle);
    let q = vec3(xz.x(), p.y(), xz.y());
    let yz = rotate2(&q.swizzle("yz"), &(angle * 0.7));
    vec3(q.x(), yz.x(), yz.y())
}

fn sd_solid(shape: u32, q: &Expr, s: &Expr) -> Expr {
    match shape {
        1 => {
            let b = q.abs() - s * 0.8;
            length(max(&b, 0.0)) + min(max(b.x(), max(b.y(), b.z())), 0.0)
        }
        2 => {
            let ring = vec2(length(q.swizzle("xz")) - s, q.y());
            length(ring) - s * 0.35
        }
        3 => (q.x().abs() + q.y().abs() + q.z().abs() - s) * 0.577_350_27,
        _ => q.length() - s,
    }
}

/// Raymarched solid lit by one directional light; the march is unrolled into the program.
#[derive(Debug, Default)]
pub struct Shape3d;

impl Effect for Shape3d {
    const SHADER: ShaderType = ShaderType::Shape3d;
    const SPECS: &'static [ParamSpec] = &[
        ParamSpec::choice("shape", 0, SHAPES_3D).structural(),
        ParamSpec::float("size", 1.0, 0.1, 2.0),
        ParamSpec::float("rotationSpeed", 0.5, -5.0, 5.0),
        ParamSpec::color("color", [0.9, 0.9, 0.95]),
        ParamSpec::float("lightAngle", 45.0, -180.0, 180.0),
    ];

    fn graph(&self, params: &ParamState) -> Expr {
        let shape = params.choice("shape");
        let res = Expr::resolution();
        let aspect = res.x() / res.y();
        let screen = (Expr::uv() - 0.5) * 2.0;
        let rd = normalize(vec3(screen.x() * aspect, -screen.y(), 1.8));
        let ro = vec3(0.0, 0.0, -3.0);
        let angle = Expr::time() * params.expr("rotationSpeed");
        let size = params.expr("size");
        let sdf = |pos: &Expr| sd_solid(shape, &rotate3(pos, &angle), &size);

        let mut t = Expr::lit(0.0);
        for _ in 0..MARCH_STEPS {
            let d = sdf(&(&ro + &rd * &t));
            t = min(t + d, FAR);
        }
        let pos = &ro + &rd * &t;
        let hit = sdf(&pos).lt(0.01).to_f32();

        let e = 0.002;
        let axis = |x: f32, y: f32, z: f32| vec3(x, y, z);
        let n = normalize(vec3(
            sdf(&(&pos + axis(e, 0.0, 0.0))) - sdf(&(&pos - axis(e, 0.0, 0.0))),
            sdf(&(&pos + axis(0.0, e, 0.0))) - sdf(&(&pos - axis(0.0, e, 0.0))),
            sdf(&(&pos + axis(0.0, 0.0, e))) - sdf(&(&pos - axis(0.0, 0.0, e))),
        ));
        let la = params.expr("lightAngle") * (PI / 180.0);
        let light = normalize(vec3(la.cos(), 0.6, -la.sin()));
        let diffuse = max(dot(&n, light), 0.0);
        let rgb = params.expr("color") * (diffuse * 0.85 + 0.15);
        join([rgb, hit])
    }

    fn continuous(&self, params: &ParamState) -> bool {
        params.f32("rotationSpeed") != 0.0
    }
}

#[cfg(test)]
#[path = "../../tests/unit/passes/shapes.rs"]
mod tests;
