use super::*;
use crate::passes::test_support::{Harness, approx};

fn config() -> FluidConfig {
    FluidConfig {
        sim_resolution: 16,
        dye_resolution: 32,
        pressure_iterations: 8,
        click_force: 20.0,
        ..FluidConfig::default()
    }
}

fn fluid(mode: &str) -> FluidPass {
    let mut pass = FluidPass::new(config(), 16, 0.5);
    pass.update_uniforms(&[Param::choice("mode", mode)]);
    pass.build().unwrap();
    pass
}

fn same(a: &[[f32; 4]], b: &[[f32; 4]]) -> bool {
    a.iter().zip(b).all(|(x, y)| approx(*x, *y, 1e-6))
}

#[test]
fn unbuilt_pass_copies_its_input() {
    let mut h = Harness::solid(8, 8, [20, 40, 60, 255]);
    let mut pass = FluidPass::new(config(), 16, 0.5);
    let out = h.run(&mut pass, 0.0);
    assert_eq!(out, h.input_texels());
    assert!(!pass.sim().is_built());
}

#[test]
fn modes_bind_only_the_fields_they_read() {
    let slots = |mode: &str| fluid(mode).programs()[0].input_slots();
    assert_eq!(slots("trail"), 2);
    assert_eq!(slots("displace"), 3);
    assert_eq!(slots("repel"), 4);
    assert_eq!(slots("glow"), 1);
    assert_eq!(fluid("attract").mode(), FluidMode::Attract);
}

#[test]
fn click_leaves_a_trail_that_fades_to_idle() {
    let mut h = Harness::solid(32, 32, [0, 0, 0, 255]);
    let mut pass = fluid("trail");
    let first = h.run(&mut pass, 0.0);
    assert!(same(&first, &h.input_texels()), "no input, no dye");
    assert!(!pass.needs_continuous_render());

    pass.interactivity().unwrap().add_click(0.5, 0.5);
    assert!(pass.needs_continuous_render(), "pending splats wake the loop");
    let out = h.run(&mut pass, 0.0);
    assert!(h.at(&out, 16, 16)[0] > 0.1, "dye shows at the click");

    let mut frames = 1;
    let mut last_peak = f32::INFINITY;
    while pass.needs_continuous_render() {
        let dye = pass.sim().dye_peak(&mut h.device).unwrap();
        assert!(dye <= pass.dye_peak_bound() + 1e-4, "bound {} < {dye}", pass.dye_peak_bound());
        assert!(pass.dye_peak_bound() <= last_peak);
        last_peak = pass.dye_peak_bound();
        h.run(&mut pass, frames as f32 / 60.0);
        frames += 1;
        assert!(frames < 240, "still animating after {frames} frames");
    }
    assert!(frames > 60, "faded too fast: {frames}");
}

#[test]
fn deactivation_drops_input_and_clears_on_return() {
    let mut h = Harness::solid(32, 32, [0, 0, 0, 255]);
    let mut pass = fluid("trail");
    pass.add_click(0.5, 0.5);
    h.run(&mut pass, 0.0);

    pass.update_uniforms(&[Param::boolean("active", false)]);
    assert!(!pass.is_active());
    assert!(!pass.needs_continuous_render());
    pass.set_pointer(0.2, 0.2, 0.3, 0.3, true);
    pass.add_click(0.2, 0.2);
    assert!(!pass.pointer().has_pending(), "inactive layers ignore the pointer");
    let off = h.run(&mut pass, 0.0);
    assert_eq!(off, h.input_texels());

    pass.update_uniforms(&[Param::boolean("active", true)]);
    let back = h.run(&mut pass, 0.0);
    assert!(same(&back, &h.input_texels()), "fields restart empty");
}

#[test]
fn glow_is_a_passthrough_that_never_animates_alone() {
    let mut h = Harness::solid(16, 16, [90, 30, 200, 255]);
    let mut pass = fluid("glow");
    pass.add_click(0.5, 0.5);
    let out = h.run(&mut pass, 0.0);
    assert!(same(&out, &h.input_texels()));
    assert!(!pass.needs_continuous_render());
}

#[test]
fn displace_without_motion_is_identity() {
    let img = crate::assets::media::MediaImage::from_fn(16, 16, |x, y| {
        [(x * 16) as u8, (y * 16) as u8, 128, 255]
    });
    let mut h = Harness::new(&img);
    let mut pass = fluid("displace");
    let out = h.run(&mut pass, 0.0);
    assert!(same(&out, &h.input_texels()));
}

#[test]
fn repel_gate_opens_with_motion_and_decays_after_release() {
    let mut h = Harness::solid(32, 32, [50, 50, 50, 255]);
    let mut pass = fluid("repel");
    pass.set_pointer(0.5, 0.5, 0.5, 0.0, true);
    h.run(&mut pass, 0.0);
    assert!(pass.gate > 0.0);
    assert!(pass.needs_continuous_render());

    pass.set_pointer(0.5, 0.5, 0.0, 0.0, false);
    let mut frames = 0;
    while pass.needs_continuous_render() {
        h.run(&mut pass, 0.0);
        frames += 1;
        assert!(frames < 200);
    }
    assert_eq!(pass.gate, 0.0);
}

#[test]
fn zero_delta_keeps_dye_bound() {
    let mut h = Harness::solid(32, 32, [0, 0, 0, 255]);
    let mut pass = fluid("trail");
    pass.add_click(0.5, 0.5);
    h.run_dt(&mut pass, 0.0, 0.0);
    let bound = pass.dye_peak_bound();
    h.run_dt(&mut pass, 0.0, f32::NAN);
    assert_eq!(pass.dye_peak_bound(), bound);
}
