use super::*;
use crate::assets::media::MediaImage;
use crate::layers::param::Param;
use crate::passes::Pass;
use crate::passes::effect_pass::EffectPass;
use crate::passes::test_support::{Harness, approx};

fn gradient() -> MediaImage {
    MediaImage::from_fn(16, 16, |x, y| [(x * 15) as u8, (y * 15) as u8, 100, 255])
}

#[test]
fn square_cells_are_uniform() {
    let mut h = Harness::new(&gradient());
    let mut pass = EffectPass::new(Pixelate);
    pass.update_uniforms(&[Param::float("pixelSize", 4.0)]);
    pass.build().unwrap();
    let out = h.run(&mut pass, 0.0);
    for cy in 0..4 {
        for cx in 0..4 {
            let first = h.at(&out, cx * 4, cy * 4);
            for y in 0..4 {
                for x in 0..4 {
                    assert!(approx(h.at(&out, cx * 4 + x, cy * 4 + y), first, 1e-6));
                }
            }
        }
    }
    assert!(!approx(h.at(&out, 0, 0), h.at(&out, 12, 12), 1e-3));
}

#[test]
fn size_one_is_identity() {
    let mut h = Harness::new(&gradient());
    let mut pass = EffectPass::new(Pixelate);
    pass.update_uniforms(&[Param::float("pixelSize", 1.0)]);
    pass.build().unwrap();
    let out = h.run(&mut pass, 0.0);
    let input = h.input_texels();
    assert!(out.iter().zip(input).all(|(a, b)| approx(*a, b, 1e-6)));
}

#[test]
fn circle_cells_leave_corners_to_the_input() {
    let mut h = Harness::new(&gradient());
    let mut pass = EffectPass::new(Pixelate);
    pass.update_uniforms(&[
        Param::float("pixelSize", 4.0),
        Param::choice("cellShape", "circle"),
    ]);
    pass.build().unwrap();
    let out = h.run(&mut pass, 0.0);
    let input = h.input_texels();
    assert!(approx(h.at(&out, 0, 0), h.at(&input, 0, 0), 1e-6));
    assert!(!approx(h.at(&out, 5, 5), h.at(&input, 5, 5), 1e-3));
}
