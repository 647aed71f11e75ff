use super::*;

#[test]
fn srgb_transfer_round_trips() {
    for i in 0..=20 {
        let c = i as f32 / 20.0;
        assert!((linear_to_srgb(srgb_to_linear(c)) - c).abs() < 1e-5, "{c}");
    }
    assert_eq!(srgb_to_linear(0.0), 0.0);
    assert!((srgb_to_linear(1.0) - 1.0).abs() < 1e-6);
}

#[test]
fn luminance_weights_sum_to_one() {
    assert!((luminance([1.0, 1.0, 1.0]) - 1.0).abs() < 1e-6);
    assert!(luminance([0.0, 1.0, 0.0]) > luminance([1.0, 0.0, 0.0]));
}

#[test]
fn unorm8_quantization() {
    assert_eq!(quantize_unorm8(1.5), 1.0);
    assert_eq!(quantize_unorm8(-0.2), 0.0);
    assert_eq!(quantize_unorm8(0.5), 128.0 / 255.0);
}

#[test]
fn set_lum_hits_target_and_stays_in_gamut() {
    let c = set_lum([0.9, 0.1, 0.1], 0.8);
    assert!((lum(c) - 0.8).abs() < 1e-4);
    assert!(c.iter().all(|v| (-1e-5..=1.0 + 1e-5).contains(v)), "{c:?}");
}

#[test]
fn set_sat_of_grey_is_black() {
    assert_eq!(set_sat([0.4, 0.4, 0.4], 0.7), [0.0; 3]);
    let c = set_sat([0.2, 0.5, 0.8], 0.3);
    assert!((sat(c) - 0.3).abs() < 1e-6);
}
