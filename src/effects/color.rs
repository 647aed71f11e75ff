//! Color helpers shared by the blend composer, media upload and the CPU device.

/// Rec. 709 luminance.
pub fn luminance(rgb: [f32; 3]) -> f32 {
    0.2126 * rgb[0] + 0.7152 * rgb[1] + 0.0722 * rgb[2]
}

/// sRGB transfer decode of one channel.
pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// sRGB transfer encode of one channel; negatives clamp to zero.
pub fn linear_to_srgb(c: f32) -> f32 {
    let c = c.max(0.0);
    if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

pub(crate) fn quantize_unorm8(c: f32) -> f32 {
    (c.clamp(0.0, 1.0) * 255.0).round() / 255.0
}

// Non-separable blend primitives (W3C compositing, "Lum" uses 0.3/0.59/0.11).

pub(crate) fn lum(c: [f32; 3]) -> f32 {
    0.3 * c[0] + 0.59 * c[1] + 0.11 * c[2]
}

fn clip_color(c: [f32; 3]) -> [f32; 3] {
    let l = lum(c);
    let n = c[0].min(c[1]).min(c[2]);
    let x = c[0].max(c[1]).max(c[2]);
    let mut out = c;
    if n < 0.0 {
        let d = (l - n).max(1e-6);
        out = out.map(|v| l + (v - l) * l / d);
    }
    if x > 1.0 {
        let d = (x - l).max(1e-6);
        out = out.map(|v| l + (v - l) * (1.0 - l) / d);
    }
    out
}

pub(crate) fn set_lum(c: [f32; 3], l: f32) -> [f32; 3] {
    let d = l - lum(c);
    clip_color(c.map(|v| v + d))
}

pub(crate) fn sat(c: [f32; 3]) -> f32 {
    c[0].max(c[1]).max(c[2]) - c[0].min(c[1]).min(c[2])
}

pub(crate) fn set_sat(c: [f32; 3], s: f32) -> [f32; 3] {
    let n = c[0].min(c[1]).min(c[2]);
    let x = c[0].max(c[1]).max(c[2]);
    if x > n {
        c.map(|v| (v - n) * s / (x - n))
    } else {
        [0.0; 3]
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/color.rs"]
mod tests;
