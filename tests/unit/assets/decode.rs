use std::io::Cursor;

use super::*;

#[test]
fn decode_png_keeps_straight_alpha() {
    let src = vec![100u8, 50, 200, 128, 0, 0, 0, 0];
    let img = image::RgbaImage::from_raw(2, 1, src.clone()).unwrap();
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();

    let decoded = decode_image(&buf).unwrap();
    assert_eq!((decoded.width, decoded.height), (2, 1));
    assert_eq!(decoded.rgba8.as_slice(), src.as_slice());
}

#[test]
fn garbage_is_an_error() {
    assert!(decode_image(b"not an image").is_err());
    assert!(decode_image(&[]).unwrap_err().to_string().starts_with("media error:"));
}
