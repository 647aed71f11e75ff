use super::*;
use crate::shader::ir::{
    Expr, atan2, blend, clamp, dot, join, length, lit, modulo, normalize, rgb_const, select,
    smoothstep, step, vec2, vec4,
};
use crate::shader::uniforms::UniformBlock;

struct Solid([f32; 4], (u32, u32));

impl TexelSource for Solid {
    fn size(&self) -> (u32, u32) {
        self.1
    }

    fn sample(&self, uv: [f32; 2]) -> [f32; 4] {
        [self.0[0] * uv[0], self.0[1], self.0[2], self.0[3]]
    }
}

fn eval(root: &Expr, block: &UniformBlock, uv: [f32; 2]) -> [f32; 4] {
    let program = Program::compile("t", root, block).unwrap();
    let tex = Solid([1.0, 0.5, 0.25, 1.0], (4, 2));
    let textures: [&dyn TexelSource; 1] = [&tex];
    let values = block.values();
    let env = FragmentEnv {
        resolution: [8.0, 4.0],
        time: 2.0,
        uniforms: &values,
        textures: &textures,
    };
    shade(&program, &env, uv, &mut Vec::new())
}

fn scalar(e: Expr) -> f32 {
    eval(&vec4(e, 0.0, 0.0, 1.0), &UniformBlock::new(), [0.5, 0.5])[0]
}

#[test]
fn builtins_and_samples() {
    let block = UniformBlock::new();
    let out = eval(
        &join([Expr::uv(), Expr::texel_size(0)]),
        &block,
        [0.25, 0.75],
    );
    assert_eq!(out, [0.25, 0.75, 0.25, 0.5]);
    let out = eval(&Expr::sample(0, Expr::uv()), &block, [0.5, 0.0]);
    assert_eq!(out, [0.5, 0.5, 0.25, 1.0]);
    let out = eval(&join([Expr::resolution(), Expr::time(), lit(0.0)]), &block, [0.0; 2]);
    assert_eq!(out, [8.0, 4.0, 2.0, 0.0]);
}

#[test]
fn glsl_style_semantics() {
    assert_eq!(scalar(lit(-1.25).fract()), 0.75);
    assert_eq!(scalar(lit(0.0).sign()), 0.0);
    assert_eq!(scalar(lit(-3.0).sign()), -1.0);
    assert_eq!(scalar(modulo(-1.0, 3.0)), 2.0);
    assert_eq!(scalar(step(0.5, 0.5)), 1.0);
    assert_eq!(scalar(step(0.5, 0.4)), 0.0);
    assert_eq!(scalar(lit(-4.0).sqrt()), 0.0);
    assert_eq!(scalar(clamp(3.0, 0.0, 1.0)), 1.0);
    assert_eq!(scalar(smoothstep(0.0, 1.0, 0.5)), 0.5);
    assert!((scalar(atan2(1.0, 0.0)) - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    assert_eq!(scalar(length(vec2(3.0, 4.0))), 5.0);
    assert_eq!(scalar(dot(vec2(1.0, 2.0), vec2(3.0, 4.0))), 11.0);
}

#[test]
fn normalize_keeps_zero_vectors_finite() {
    let out = eval(
        &join([normalize(vec2(0.0, 0.0)), normalize(vec2(0.0, 2.0))]),
        &UniformBlock::new(),
        [0.0; 2],
    );
    assert_eq!(out, [0.0, 0.0, 0.0, 1.0]);
}

#[test]
fn select_and_logic() {
    let uv = Expr::uv();
    let inside = uv.x().gt(0.25).and(&uv.x().lt(0.75));
    let root = join([select(&inside, rgb_const([1.0, 1.0, 1.0]), 0.0), lit(1.0)]);
    let block = UniformBlock::new();
    assert_eq!(eval(&root, &block, [0.5, 0.5])[0], 1.0);
    assert_eq!(eval(&root, &block, [0.9, 0.5])[0], 0.0);
    let outside = inside.not();
    let root = vec4(outside.to_f32(), 0.0, 0.0, 0.0);
    assert_eq!(eval(&root, &block, [0.9, 0.5])[0], 1.0);
}

#[test]
fn uniforms_are_read_from_the_block() {
    let mut block = UniformBlock::new();
    let h = block.declare("c", Ty::Vec3, [0.1, 0.2, 0.3, 0.0]);
    let root = join([block.expr(h), lit(1.0)]);
    assert_eq!(eval(&root, &block, [0.0; 2]), [0.1, 0.2, 0.3, 1.0]);
    block.set(h, [0.9, 0.8, 0.7, 0.0]);
    assert_eq!(eval(&root, &block, [0.0; 2]), [0.9, 0.8, 0.7, 1.0]);
}

#[test]
fn blend_node_matches_composer() {
    let base = rgb_const([0.2, 0.4, 0.6]);
    let effect = rgb_const([0.5, 0.5, 0.5]);
    let mode = BlendMode::Multiply.index() as f32;
    let root = join([blend(base, effect, mode, 0.5), lit(1.0)]);
    let out = eval(&root, &UniformBlock::new(), [0.0; 2]);
    let want = composite([0.2, 0.4, 0.6], [0.5; 3], BlendMode::Multiply, 0.5);
    assert_eq!(&out[..3], &want[..]);
}
