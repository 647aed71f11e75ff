use super::*;
use crate::layers::param::Param;
use crate::passes::Pass;
use crate::passes::effect_pass::EffectPass;
use crate::passes::test_support::{Harness, approx};

fn grain(params: &[Param]) -> EffectPass<Grain> {
    let mut pass = EffectPass::new(Grain);
    pass.update_uniforms(params);
    pass.build().unwrap();
    pass
}

#[test]
fn zero_amount_is_identity_and_static() {
    let mut h = Harness::solid(8, 8, [100, 150, 200, 255]);
    let mut pass = grain(&[Param::float("amount", 0.0)]);
    let out = h.run(&mut pass, 0.3);
    let input = h.input_texels();
    assert!(out.iter().zip(input).all(|(a, b)| approx(*a, b, 1e-6)));
    assert!(!pass.needs_continuous_render());
}

#[test]
fn animated_grain_changes_per_frame() {
    let mut h = Harness::solid(8, 8, [128, 128, 128, 255]);
    let mut pass = grain(&[Param::float("amount", 0.5)]);
    assert!(pass.needs_continuous_render());
    let a = h.run(&mut pass, 0.0);
    let b = h.run(&mut pass, 1.0);
    assert_ne!(a, b);
}

#[test]
fn static_grain_ignores_time() {
    let mut h = Harness::solid(8, 8, [128, 128, 128, 255]);
    let mut pass = grain(&[Param::float("amount", 0.5), Param::boolean("animated", false)]);
    assert!(!pass.needs_continuous_render());
    assert_eq!(h.run(&mut pass, 0.0), h.run(&mut pass, 2.5));
}

#[test]
fn monochrome_grain_keeps_gray_gray() {
    let mut h = Harness::solid(8, 8, [128, 128, 128, 255]);
    let out = h.run(&mut grain(&[Param::float("amount", 0.3)]), 0.0);
    for t in &out {
        assert!((t[0] - t[1]).abs() < 1e-6 && (t[1] - t[2]).abs() < 1e-6);
    }
    let spread = out.iter().any(|t| (t[0] - 128.0 / 255.0).abs() > 0.01);
    assert!(spread, "grain perturbs the input");
}
