use super::*;

fn close(a: [f32; 3], b: [f32; 3]) -> bool {
    a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-5)
}

#[test]
fn opacity_zero_is_identity_for_every_mode() {
    let base = [0.3, 0.6, 0.9];
    for mode in BlendMode::ALL {
        for effect in [[0.0; 3], [1.0; 3], [0.7, 0.2, 0.5]] {
            assert_eq!(composite(base, effect, mode, 0.0), base, "{mode:?}");
        }
    }
}

#[test]
fn normal_at_full_opacity_replaces() {
    assert_eq!(
        composite([0.1, 0.2, 0.3], [0.9, 0.8, 0.7], BlendMode::Normal, 1.0),
        [0.9, 0.8, 0.7]
    );
}

#[test]
fn separable_reference_values() {
    let b = [0.5, 0.25, 1.0];
    let s = [0.5, 0.5, 0.0];
    assert!(close(blend(b, s, BlendMode::Multiply), [0.25, 0.125, 0.0]));
    assert!(close(blend(b, s, BlendMode::Screen), [0.75, 0.625, 1.0]));
    assert!(close(blend(b, s, BlendMode::Darken), [0.5, 0.25, 0.0]));
    assert!(close(blend(b, s, BlendMode::Lighten), [0.5, 0.5, 1.0]));
    assert!(close(blend(b, s, BlendMode::Difference), [0.0, 0.25, 1.0]));
    assert!(close(blend(b, s, BlendMode::Exclusion), [0.5, 0.5, 1.0]));
    assert!(close(blend(b, s, BlendMode::Overlay), [0.5, 0.25, 1.0]));
    assert!(close(blend(b, s, BlendMode::HardLight), [0.5, 0.25, 0.0]));
}

#[test]
fn dodge_and_burn_are_clamped_and_finite() {
    let out = blend([0.5, 0.0, 1.0], [1.0, 1.0, 0.5], BlendMode::ColorDodge);
    assert_eq!(out, [1.0, 0.0, 1.0]);
    let out = blend([0.5, 1.0, 0.0], [0.0, 0.0, 0.5], BlendMode::ColorBurn);
    assert_eq!(out, [0.0, 1.0, 0.0]);
    for mode in [BlendMode::ColorDodge, BlendMode::ColorBurn, BlendMode::SoftLight] {
        for i in 0..=10 {
            for j in 0..=10 {
                let (b, s) = (i as f32 / 10.0, j as f32 / 10.0);
                let v = blend([b; 3], [s; 3], mode)[0];
                assert!(v.is_finite() && (0.0..=1.0).contains(&v), "{mode:?} {b} {s} -> {v}");
            }
        }
    }
}

#[test]
fn soft_light_neutral_at_half() {
    let base = [0.2, 0.5, 0.9];
    assert!(close(blend(base, [0.5; 3], BlendMode::SoftLight), base));
}

#[test]
fn hsl_modes_preserve_the_right_component() {
    let base = [0.8, 0.2, 0.2];
    let effect = [0.1, 0.3, 0.9];
    let lum_of = crate::effects::color::lum;
    assert!((lum_of(blend(base, effect, BlendMode::Luminosity)) - lum_of(effect)).abs() < 1e-4);
    assert!((lum_of(blend(base, effect, BlendMode::Color)) - lum_of(base)).abs() < 1e-4);
    assert!((lum_of(blend(base, effect, BlendMode::Hue)) - lum_of(base)).abs() < 1e-4);
    let grey = blend([0.5; 3], effect, BlendMode::Saturation);
    assert!(close(grey, set_lum(set_sat([0.5; 3], sat(effect)), 0.5)));
}

#[test]
fn compositing_is_order_sensitive() {
    let base = [0.4, 0.5, 0.6];
    let a = [0.9, 0.1, 0.3];
    let b = [0.2, 0.7, 0.8];
    let ab = composite(
        composite(base, a, BlendMode::Multiply, 1.0),
        b,
        BlendMode::Screen,
        1.0,
    );
    let ba = composite(
        composite(base, b, BlendMode::Screen, 1.0),
        a,
        BlendMode::Multiply,
        1.0,
    );
    assert!(!close(ab, ba));
}

#[test]
fn mask_weight_uses_effect_luminance() {
    assert_eq!(composite_weight([0.0, 0.0, 0.0, 1.0], FilterMode::Mask, 1.0), 0.0);
    assert!((composite_weight([1.0, 1.0, 1.0, 1.0], FilterMode::Mask, 0.5) - 0.5).abs() < 1e-6);
    assert_eq!(composite_weight([0.0, 0.0, 0.0, 0.25], FilterMode::Filter, 1.0), 0.25);
}

#[test]
fn prelude_uses_the_same_mode_ids() {
    for mode in [BlendMode::Multiply, BlendMode::Luminosity] {
        assert!(WGSL_PRELUDE.contains(&format!("mode == {}", mode.index())));
    }
    assert!(WGSL_PRELUDE.contains("fn blend_composite("));
}
