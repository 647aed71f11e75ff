use super::*;
use crate::shader::ir::{
    Expr, atan2, blend, clamp, distance, join, lit, max, min, mix, modulo, normalize, pow,
    rgb_const, select, smoothstep, step, vec2,
};
use crate::shader::uniforms::UniformBlock;

fn validate(src: &str) {
    let module = naga::front::wgsl::parse_str(src)
        .unwrap_or_else(|e| panic!("{}\n{src}", e.emit_to_string(src)));
    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::empty(),
    )
    .validate(&module)
    .unwrap_or_else(|e| panic!("{e:?}\n{src}"));
}

#[test]
fn float_literals_always_look_like_floats() {
    assert_eq!(float_lit(1.0), "1.0");
    assert_eq!(float_lit(0.25), "0.25");
    assert_eq!(float_lit(-2.0), "(-2.0)");
    assert!(float_lit(1e-7).contains('e'));
    assert_eq!(float_lit(f32::INFINITY), "0.0");
}

#[test]
fn passthrough_validates() {
    let src = emit(&Program::passthrough());
    assert!(src.contains("textureSampleLevel(t0, s0"));
    assert!(!src.contains("blend_composite"));
    validate(&src);
}

#[test]
fn every_op_validates() {
    let mut block = UniformBlock::new();
    let amount = block.declare("amount", Ty::F32, [0.5, 0.0, 0.0, 0.0]);
    let tint = block.declare("tint", Ty::Vec3, [1.0, 0.0, 0.0, 0.0]);
    let offset = block.declare("offset", Ty::Vec2, [0.0; 4]);
    let amount = block.expr(amount);
    let uv = Expr::uv() + block.expr(offset) * Expr::texel_size(1);
    let a = Expr::sample(0, &uv);
    let b = Expr::sample(1, Expr::uv().swizzle("yx"));
    let d = distance(&uv, vec2(0.5, 0.5));
    let ang = atan2(uv.y() - 0.5, uv.x() - 0.5);
    let mask = d.lt(0.25).or(&ang.ge(0.0)).and(&Expr::time().le(10.0).not());
    let wave = (uv.x() * 6.0 + Expr::time()).sin().abs().sqrt().exp().floor().fract();
    let grid = modulo(&uv * Expr::resolution(), 8.0);
    let rgb = mix(a.rgb(), b.rgb(), &amount)
        + block.expr(tint) * wave
        + smoothstep(0.0, 1.0, grid.x()).sign()
        + step(0.5, pow(max(min(&uv, 1.0), 0.0), 2.0)).x()
        + clamp(normalize(&uv).length(), 0.0, 1.0)
        + -(uv.y().cos().saturate());
    let rgb = select(&mask, rgb, rgb_const([0.0, 0.0, 0.0]));
    let rgb = blend(a.rgb(), rgb, lit(3.0), amount);
    let root = join([rgb, a.w()]);
    let program = Program::compile("kitchen-sink", &root, &block).unwrap();
    let src = emit(&program);
    assert!(src.contains("fn blend_composite"));
    assert!(src.contains(&format!("array<vec4<f32>, {}>", HEADER_SLOTS + 3)));
    assert!(src.contains("@binding(4) var s1: sampler"));
    validate(&src);
}
