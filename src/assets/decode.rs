use anyhow::Context;

use crate::assets::media::MediaImage;
use crate::foundation::error::{StrataError, StrataResult};

/// Decode PNG / JPEG / WebP bytes into a straight-alpha [`MediaImage`].
pub fn decode_image(bytes: &[u8]) -> StrataResult<MediaImage> {
    if bytes.is_empty() {
        return Err(StrataError::media("empty image payload"));
    }
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    MediaImage::from_rgba8(width, height, rgba.into_raw())
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
