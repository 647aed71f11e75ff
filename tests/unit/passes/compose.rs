use super::*;
use crate::assets::media::MediaImage;
use crate::effects::blend::composite;
use crate::layers::model::BlendMode;
use crate::passes::test_support::{Harness, approx};
use crate::render::device::{Device, DrawCall};
use crate::shader::program::Program;

const BASE: [u8; 4] = [128, 64, 255, 255];

fn base_rgb() -> [f32; 3] {
    [128.0 / 255.0, 64.0 / 255.0, 1.0]
}

fn run(effect: [f32; 4], settings: CompositeSettings) -> [f32; 4] {
    let mut block = UniformBlock::new();
    let compose = Compose::declare(&mut block);
    compose.write(&mut block, settings);
    let root = compose.apply(
        &block,
        &Expr::sample(0, Expr::uv()),
        &Expr::constant(Ty::Vec4, effect),
    );
    let program = Program::compile("compose-test", &root, &block).unwrap();
    let mut h = Harness::new(&MediaImage::solid(2, 2, BASE));
    let uniforms = block.values();
    h.device
        .draw(&DrawCall {
            program: &program,
            uniforms: &uniforms,
            inputs: &[h.input],
            output: h.output,
            time: 0.0,
            label: "compose-test",
        })
        .unwrap();
    h.device.read_pixels(h.output).unwrap()[0]
}

fn settings(opacity: f32, blend_mode: BlendMode, filter_mode: FilterMode) -> CompositeSettings {
    CompositeSettings {
        opacity,
        blend_mode,
        filter_mode,
    }
}

#[test]
fn every_mode_matches_the_cpu_reference() {
    let effect = [0.2, 0.9, 0.4, 1.0];
    for mode in BlendMode::ALL {
        let got = run(effect, settings(0.6, mode, FilterMode::Filter));
        let want = composite(base_rgb(), [0.2, 0.9, 0.4], mode, 0.6);
        assert!(
            approx(got, [want[0], want[1], want[2], 1.0], 1e-4),
            "{mode:?}: {got:?} vs {want:?}"
        );
    }
}

#[test]
fn zero_opacity_is_identity() {
    let got = run([0.0, 1.0, 0.0, 1.0], settings(0.0, BlendMode::Difference, FilterMode::Filter));
    let b = base_rgb();
    assert!(approx(got, [b[0], b[1], b[2], 1.0], 1e-6));
}

#[test]
fn effect_alpha_scales_the_weight_in_filter_mode() {
    let half = run([1.0, 1.0, 1.0, 0.5], settings(1.0, BlendMode::Normal, FilterMode::Filter));
    let want = composite(base_rgb(), [1.0; 3], BlendMode::Normal, 0.5);
    assert!(approx(half, [want[0], want[1], want[2], 1.0], 1e-5));
}

#[test]
fn mask_mode_gates_by_effect_luminance() {
    let black = run([0.0, 0.0, 0.0, 1.0], settings(1.0, BlendMode::Normal, FilterMode::Mask));
    let b = base_rgb();
    assert!(approx(black, [b[0], b[1], b[2], 1.0], 1e-6), "black mask hides the effect");

    let white = run([1.0, 1.0, 1.0, 1.0], settings(1.0, BlendMode::Normal, FilterMode::Mask));
    assert!(approx(white, [1.0, 1.0, 1.0, 1.0], 1e-5), "white mask shows it fully");
}

#[test]
fn output_keeps_the_input_alpha() {
    let mut block = UniformBlock::new();
    let compose = Compose::declare(&mut block);
    compose.write(&mut block, CompositeSettings::default());
    let base = Expr::constant(Ty::Vec4, [0.5, 0.5, 0.5, 0.25]);
    let root = compose.apply(&block, &base, &Expr::constant(Ty::Vec4, [1.0; 4]));
    let program = Program::compile("compose-alpha", &root, &block).unwrap();
    let mut h = Harness::solid(1, 1, [0; 4]);
    let uniforms = block.values();
    h.device
        .draw(&DrawCall {
            program: &program,
            uniforms: &uniforms,
            inputs: &[h.input],
            output: h.output,
            time: 0.0,
            label: "compose-alpha",
        })
        .unwrap();
    assert_eq!(h.device.read_pixels(h.output).unwrap()[0][3], 0.25);
}

#[test]
fn nan_opacity_writes_zero() {
    let mut block = UniformBlock::new();
    let compose = Compose::declare(&mut block);
    compose.write(&mut block, settings(f32::NAN, BlendMode::Screen, FilterMode::Mask));
    assert_eq!(block.get(compose.opacity)[0], 0.0);
    assert_eq!(block.get(compose.mode)[0], BlendMode::Screen.index() as f32);
    assert_eq!(block.get(compose.mask)[0], 1.0);
}
