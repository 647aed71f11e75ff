use std::sync::Arc;

use crate::effects::color::srgb_to_linear;
use crate::foundation::error::{StrataError, StrataResult};

/// A decoded, ready-to-upload media frame (image, video frame, webcam frame).
#[derive(Clone, Debug, PartialEq)]
pub struct MediaImage {
    /// Frame width in texels.
    pub width: u32,
    /// Frame height in texels.
    pub height: u32,
    /// Straight-alpha RGBA8, row-major, top row first, tightly packed.
    pub rgba8: Arc<Vec<u8>>,
}

impl MediaImage {
    /// Wrap a tightly packed RGBA8 buffer, rejecting empty frames and mismatched lengths.
    pub fn from_rgba8(width: u32, height: u32, rgba8: Vec<u8>) -> StrataResult<Self> {
        if width == 0 || height == 0 {
            return Err(StrataError::media(format!(
                "media frame must be non-empty, got {width}x{height}"
            )));
        }
        let expected = (width as usize) * (height as usize) * 4;
        if rgba8.len() != expected {
            return Err(StrataError::media(format!(
                "media frame {width}x{height} expects {expected} bytes, got {}",
                rgba8.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba8: Arc::new(rgba8),
        })
    }

    /// A frame filled with one color.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        Self::from_fn(width, height, |_, _| rgba)
    }

    /// Build a frame texel by texel; zero dimensions are bumped to 1.
    pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> [u8; 4]) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        let mut rgba8 = Vec::with_capacity((width as usize) * (height as usize) * 4);
        for y in 0..height {
            for x in 0..width {
                rgba8.extend_from_slice(&f(x, y));
            }
        }
        Self {
            width,
            height,
            rgba8: Arc::new(rgba8),
        }
    }

    /// Texel at `(x, y)`, clamped to the frame.
    pub fn texel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y.min(self.height - 1) * self.width + x.min(self.width - 1)) * 4) as usize;
        [
            self.rgba8[i],
            self.rgba8[i + 1],
            self.rgba8[i + 2],
            self.rgba8[i + 3],
        ]
    }

    /// Normalised texels; with `decode_srgb` the color channels are linearised.
    pub(crate) fn to_texels(&self, decode_srgb: bool) -> Vec<[f32; 4]> {
        self.rgba8
            .chunks_exact(4)
            .map(|px| {
                let c = |v: u8| {
                    let v = f32::from(v) / 255.0;
                    if decode_srgb { srgb_to_linear(v) } else { v }
                };
                [c(px[0]), c(px[1]), c(px[2]), f32::from(px[3]) / 255.0]
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/media.rs"]
mod tests;
