use super::*;
use crate::layers::param::Param;
use crate::passes::Pass;
use crate::passes::effect_pass::EffectPass;
use crate::passes::test_support::{Harness, approx};

fn shape2d(shape: &str) -> EffectPass<Shape2d> {
    let mut pass = EffectPass::new(Shape2d);
    pass.update_uniforms(&[Param::choice("shape", shape)]);
    pass.build().unwrap();
    pass
}

#[test]
fn filled_shapes_cover_the_centre_but_not_the_corners() {
    for name in ["circle", "box", "triangle", "hexagon"] {
        let mut h = Harness::solid(32, 32, [0, 0, 0, 255]);
        let out = h.run(&mut shape2d(name), 0.0);
        assert!(approx(h.at(&out, 16, 16), [1.0; 4], 1e-4), "{name} centre");
        assert!(approx(h.at(&out, 0, 0), [0.0, 0.0, 0.0, 1.0], 1e-6), "{name} corner");
    }
}

#[test]
fn ring_is_hollow() {
    let mut h = Harness::solid(32, 32, [0, 0, 0, 255]);
    let out = h.run(&mut shape2d("ring"), 0.0);
    assert!(approx(h.at(&out, 16, 16), [0.0, 0.0, 0.0, 1.0], 1e-6));
    // size 0.25 of a 32px viewport: the band sits 8px from the centre.
    assert!(h.at(&out, 24, 16)[0] > 0.9);
}

#[test]
fn center_moves_the_shape() {
    let mut h = Harness::solid(32, 32, [0, 0, 0, 255]);
    let mut pass = shape2d("circle");
    pass.update_uniforms(&[Param::vec2("center", [0.15, 0.15]), Param::float("size", 0.1)]);
    let out = h.run(&mut pass, 0.0);
    assert!(h.at(&out, 4, 4)[0] > 0.9);
    assert!(h.at(&out, 16, 16)[0] < 1e-6);
}

#[test]
fn solid_sphere_is_lit_where_it_is_hit() {
    let mut h = Harness::solid(16, 16, [0, 0, 0, 255]);
    let mut pass = EffectPass::new(Shape3d);
    pass.update_uniforms(&[Param::float("rotationSpeed", 0.0)]);
    pass.build().unwrap();
    assert!(!pass.needs_continuous_render());
    let out = h.run(&mut pass, 0.0);
    let centre = h.at(&out, 8, 8);
    assert!(centre[0] > 0.1, "{centre:?}");
    assert!(approx(h.at(&out, 0, 0), [0.0, 0.0, 0.0, 1.0], 1e-6));
}

#[test]
fn spinning_solids_render_continuously() {
    let mut pass = EffectPass::new(Shape3d);
    pass.update_uniforms(&[Param::choice("shape", "torus")]);
    pass.build().unwrap();
    assert!(pass.needs_continuous_render());
}
