use super::*;
use crate::render::cpu::CpuDevice;
use crate::render::device::{TargetDesc, TextureFilter, TextureFormat};

fn target(dev: &mut CpuDevice, w: u32, h: u32) -> TextureId {
    dev.create_target(&TargetDesc {
        width: w,
        height: h,
        format: TextureFormat::Rgba16Float,
        min_filter: TextureFilter::Linear,
        mag_filter: TextureFilter::Linear,
    })
    .unwrap()
}

fn png_bytes(w: u32, h: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(rgba));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

const RED: [f32; 4] = [1.0, 0.0, 0.0, 1.0];
const BG: [f32; 4] = [0.0, 0.0, 0.2, 1.0];

#[test]
fn without_media_the_background_is_cleared_in() {
    let mut dev = CpuDevice::default();
    let out = target(&mut dev, 4, 4);
    let quad = BaseQuad::new(FitMode::Cover, BG, false).unwrap();
    quad.render(&mut dev, out).unwrap();
    assert!(dev.read_pixels(out).unwrap().iter().all(|t| *t == BG));
}

#[test]
fn same_aspect_media_fills_the_viewport() {
    let mut dev = CpuDevice::default();
    let out = target(&mut dev, 4, 4);
    let mut quad = BaseQuad::new(FitMode::Contain, BG, false).unwrap();
    quad.set_media(&mut dev, &MediaImage::solid(8, 8, [255, 0, 0, 255])).unwrap();
    quad.render(&mut dev, out).unwrap();
    assert!(dev.read_pixels(out).unwrap().iter().all(|t| *t == RED));
}

#[test]
fn contain_letterboxes_and_cover_crops() {
    let mut dev = CpuDevice::default();
    let out = target(&mut dev, 8, 8);
    let mut quad = BaseQuad::new(FitMode::Contain, BG, false).unwrap();
    quad.set_media(&mut dev, &MediaImage::solid(16, 4, [255, 0, 0, 255])).unwrap();

    quad.render(&mut dev, out).unwrap();
    let px = dev.read_pixels(out).unwrap();
    assert_eq!(px[0], BG, "top row is padding");
    assert_eq!(px[4 * 8 + 4], RED, "middle shows the media");

    quad.set_fit(FitMode::Cover);
    assert_eq!(quad.fit(), FitMode::Cover);
    quad.render(&mut dev, out).unwrap();
    assert!(dev.read_pixels(out).unwrap().iter().all(|t| *t == RED));
}

#[test]
fn transparent_media_shows_the_background() {
    let mut dev = CpuDevice::default();
    let out = target(&mut dev, 2, 2);
    let mut quad = BaseQuad::new(FitMode::Cover, BG, false).unwrap();
    quad.set_media(&mut dev, &MediaImage::solid(2, 2, [255, 0, 0, 0])).unwrap();
    quad.render(&mut dev, out).unwrap();
    assert_eq!(dev.read_pixels(out).unwrap()[0], BG);
}

#[test]
fn replacing_media_frees_the_old_texture() {
    let mut dev = CpuDevice::default();
    let mut quad = BaseQuad::new(FitMode::Cover, BG, false).unwrap();
    quad.set_media(&mut dev, &MediaImage::solid(2, 2, [9; 4])).unwrap();
    let first = quad.media_texture().unwrap();
    quad.set_media(&mut dev, &MediaImage::solid(3, 3, [9; 4])).unwrap();
    assert!(dev.texture_size(first).is_none());
    assert_eq!(quad.media_size(), Some((3, 3)));
    quad.dispose(&mut dev);
    assert!(!quad.has_media());
    assert_eq!(dev.stats().live_textures, 0);
}

#[test]
fn same_size_frames_reuse_the_texture() {
    let mut dev = CpuDevice::default();
    let mut quad = BaseQuad::new(FitMode::Cover, BG, false).unwrap();
    quad.update_frame(&mut dev, &MediaImage::solid(4, 4, [1; 4])).unwrap();
    let tex = quad.media_texture().unwrap();
    quad.update_frame(&mut dev, &MediaImage::solid(4, 4, [2; 4])).unwrap();
    assert_eq!(quad.media_texture(), Some(tex));
    assert_eq!(dev.stats().textures_created, 1);
    quad.update_frame(&mut dev, &MediaImage::solid(5, 4, [2; 4])).unwrap();
    assert_ne!(quad.media_texture(), Some(tex));
}

#[test]
fn bad_bytes_keep_the_last_good_media() {
    let mut dev = CpuDevice::default();
    let mut quad = BaseQuad::new(FitMode::Cover, BG, false).unwrap();
    assert!(quad.load_image_bytes(&mut dev, &png_bytes(3, 2, [0, 255, 0, 255])));
    assert_eq!(quad.media_size(), Some((3, 2)));
    assert!(!quad.load_image_bytes(&mut dev, b"not an image"));
    assert_eq!(quad.media_size(), Some((3, 2)));
}

#[test]
fn background_round_trips_through_its_uniform() {
    let mut quad = BaseQuad::new(FitMode::Cover, BG, false).unwrap();
    quad.set_background([1.0, 1.0, 1.0, 0.5]);
    assert_eq!(quad.background(), [1.0, 1.0, 1.0, 0.5]);
    assert_eq!(quad.program().label(), "base-quad");
}
