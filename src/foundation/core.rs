use crate::foundation::error::{StrataError, StrataResult};

/// Linear RGBA color with straight alpha, components nominally in `0..=1`.
pub type Rgba = [f32; 4];

/// Viewport or texture size in device pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Extent {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Extent {
    /// A non-empty extent.
    pub fn new(width: u32, height: u32) -> StrataResult<Self> {
        if width == 0 || height == 0 {
            return Err(StrataError::validation(format!(
                "extent must be non-zero, got {width}x{height}"
            )));
        }
        Ok(Self { width, height })
    }

    /// Width over height.
    pub fn aspect(self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    /// Pixels covered.
    pub fn texel_count(self) -> usize {
        (self.width as usize).saturating_mul(self.height as usize)
    }

    /// Scale the short side to `resolution` texels, keeping the aspect ratio.
    pub fn fit_short_side(self, resolution: u32) -> Self {
        let mut aspect = self.aspect();
        if aspect < 1.0 {
            aspect = 1.0 / aspect;
        }
        let min = resolution.max(1);
        let max = ((resolution as f32) * aspect).round().max(1.0) as u32;
        if self.width > self.height {
            Self {
                width: max,
                height: min,
            }
        } else {
            Self {
                width: min,
                height: max,
            }
        }
    }
}

/// Parse `#rgb`, `#rrggbb` or `#rrggbbaa` into straight RGBA in `0..=1`.
pub fn parse_hex_color(s: &str) -> Option<Rgba> {
    let hex = s.trim().strip_prefix('#')?;
    let nibble = |c: u8| -> Option<u8> {
        match c {
            b'0'..=b'9' => Some(c - b'0'),
            b'a'..=b'f' => Some(c - b'a' + 10),
            b'A'..=b'F' => Some(c - b'A' + 10),
            _ => None,
        }
    };
    let bytes = hex.as_bytes();
    let channels: Vec<u8> = match bytes.len() {
        3 => bytes
            .iter()
            .map(|&c| nibble(c).map(|n| n * 17))
            .collect::<Option<_>>()?,
        6 | 8 => bytes
            .chunks_exact(2)
            .map(|p| Some(nibble(p[0])? * 16 + nibble(p[1])?))
            .collect::<Option<_>>()?,
        _ => return None,
    };
    let a = channels.get(3).copied().unwrap_or(255);
    Some([
        f32::from(channels[0]) / 255.0,
        f32::from(channels[1]) / 255.0,
        f32::from(channels[2]) / 255.0,
        f32::from(a) / 255.0,
    ])
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
