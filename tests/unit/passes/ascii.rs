use super::*;
use crate::layers::param::Param;
use crate::passes::Pass;
use crate::passes::effect_pass::EffectPass;
use crate::passes::test_support::{Harness, approx};
use crate::render::device::Device;

#[test]
fn atlas_holds_the_whole_ramp() {
    let atlas = glyph_atlas();
    assert_eq!(RAMP.chars().count(), GLYPHS.len());
    assert_eq!((atlas.width, atlas.height), (GLYPH_W * GLYPHS.len() as u32, GLYPH_H));
    // The blank glyph has no ink, the densest has some.
    assert!((0..GLYPH_W).all(|x| (0..GLYPH_H).all(|y| atlas.texel(x, y)[0] == 0)));
    let last = (GLYPHS.len() as u32 - 1) * GLYPH_W;
    assert!((last..last + GLYPH_W).any(|x| (0..GLYPH_H).any(|y| atlas.texel(x, y)[0] == 255)));
}

#[test]
fn dark_input_renders_blank_background() {
    let mut h = Harness::solid(20, 20, [0, 0, 0, 255]);
    let mut pass = EffectPass::new(Ascii::default());
    pass.update_uniforms(&[Param::color("background", [0.0, 0.0, 1.0])]);
    pass.build().unwrap();
    let out = h.run(&mut pass, 0.0);
    assert!(out.iter().all(|t| approx(*t, [0.0, 0.0, 1.0, 1.0], 1e-5)));
}

#[test]
fn bright_input_draws_dense_glyphs() {
    let mut h = Harness::solid(20, 20, [255; 4]);
    let mut pass = EffectPass::new(Ascii::default());
    pass.build().unwrap();
    let out = h.run(&mut pass, 0.0);
    let inked = out.iter().filter(|t| t[0] > 0.5).count();
    assert!(inked > 0 && inked < out.len(), "{inked} of {}", out.len());
}

#[test]
fn atlas_is_uploaded_once_and_released_on_dispose() {
    let mut h = Harness::solid(10, 10, [200, 200, 200, 255]);
    let mut pass = EffectPass::new(Ascii::default());
    pass.build().unwrap();
    h.run(&mut pass, 0.0);
    h.run(&mut pass, 0.0);
    assert_eq!(h.device.stats().uploads, 2, "input plus one atlas");

    let live = h.device.stats().live_textures;
    pass.dispose(&mut h.ctx());
    assert_eq!(h.device.stats().live_textures, live - 1);
}
