use super::*;

#[test]
fn from_rgba8_validates_length() {
    assert!(MediaImage::from_rgba8(2, 2, vec![0; 16]).is_ok());
    let err = MediaImage::from_rgba8(2, 2, vec![0; 15]).unwrap_err();
    assert!(err.to_string().starts_with("media error:"));
    assert!(MediaImage::from_rgba8(0, 2, Vec::new()).is_err());
}

#[test]
fn from_fn_is_row_major_top_first() {
    let img = MediaImage::from_fn(3, 2, |x, y| [x as u8, y as u8, 0, 255]);
    assert_eq!(img.texel(2, 0), [2, 0, 0, 255]);
    assert_eq!(img.texel(0, 1), [0, 1, 0, 255]);
    assert_eq!(img.texel(9, 9), [2, 1, 0, 255], "out of range clamps");
}

#[test]
fn texels_optionally_decode_srgb() {
    let img = MediaImage::solid(1, 1, [128, 255, 0, 128]);
    let straight = img.to_texels(false)[0];
    assert_eq!(straight, [128.0 / 255.0, 1.0, 0.0, 128.0 / 255.0]);
    let linear = img.to_texels(true)[0];
    assert!(linear[0] < straight[0]);
    assert_eq!(linear[3], straight[3], "alpha is never transfer-encoded");
}
