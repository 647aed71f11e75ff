use super::*;

#[test]
fn extent_rejects_zero() {
    assert!(Extent::new(0, 10).is_err());
    assert!(Extent::new(10, 0).is_err());
    assert_eq!(Extent::new(3, 2).unwrap().texel_count(), 6);
}

#[test]
fn fit_short_side_keeps_orientation() {
    let landscape = Extent::new(1920, 1080).unwrap().fit_short_side(128);
    assert_eq!(landscape.height, 128);
    assert_eq!(landscape.width, 228);

    let portrait = Extent::new(1080, 1920).unwrap().fit_short_side(128);
    assert_eq!(portrait.width, 128);
    assert_eq!(portrait.height, 228);

    let square = Extent::new(64, 64).unwrap().fit_short_side(16);
    assert_eq!((square.width, square.height), (16, 16));
}

#[test]
fn hex_colors_parse_in_all_forms() {
    assert_eq!(parse_hex_color("#fff"), Some([1.0, 1.0, 1.0, 1.0]));
    assert_eq!(parse_hex_color("#000000"), Some([0.0, 0.0, 0.0, 1.0]));
    let c = parse_hex_color("#ff000080").unwrap();
    assert_eq!(c[0], 1.0);
    assert!((c[3] - 128.0 / 255.0).abs() < 1e-6);
    assert_eq!(parse_hex_color("ff0000"), None);
    assert_eq!(parse_hex_color("#ggg"), None);
}
