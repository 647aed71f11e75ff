//! The blend composer: every pass composites its effect through [`composite`] (CPU) or the
//! equivalent `blend_composite` WGSL prelude (GPU). Both are keyed by [`BlendMode::index`].

use crate::effects::color::{lum, luminance, sat, set_lum, set_sat};
use crate::layers::model::{BlendMode, FilterMode};

const EPS: f32 = 1e-6;

fn overlay(b: f32, s: f32) -> f32 {
    hard_light(s, b)
}

fn hard_light(b: f32, s: f32) -> f32 {
    if s <= 0.5 {
        2.0 * b * s
    } else {
        1.0 - 2.0 * (1.0 - b) * (1.0 - s)
    }
}

fn soft_light(b: f32, s: f32) -> f32 {
    if s <= 0.5 {
        b - (1.0 - 2.0 * s) * b * (1.0 - b)
    } else {
        let d = if b <= 0.25 {
            ((16.0 * b - 12.0) * b + 4.0) * b
        } else {
            b.max(0.0).sqrt()
        };
        b + (2.0 * s - 1.0) * (d - b)
    }
}

fn color_dodge(b: f32, s: f32) -> f32 {
    if b <= 0.0 {
        0.0
    } else {
        (b / (1.0 - s).max(EPS)).min(1.0)
    }
}

fn color_burn(b: f32, s: f32) -> f32 {
    if b >= 1.0 {
        1.0
    } else {
        1.0 - ((1.0 - b) / s.max(EPS)).min(1.0)
    }
}

fn per_channel(b: [f32; 3], s: [f32; 3], f: impl Fn(f32, f32) -> f32) -> [f32; 3] {
    [f(b[0], s[0]), f(b[1], s[1]), f(b[2], s[2])]
}

/// Blend `effect` onto `base` with `mode`, without opacity.
pub fn blend(base: [f32; 3], effect: [f32; 3], mode: BlendMode) -> [f32; 3] {
    match mode {
        BlendMode::Normal => effect,
        BlendMode::Multiply => per_channel(base, effect, |b, s| b * s),
        BlendMode::Screen => per_channel(base, effect, |b, s| b + s - b * s),
        BlendMode::Overlay => per_channel(base, effect, overlay),
        BlendMode::Darken => per_channel(base, effect, f32::min),
        BlendMode::Lighten => per_channel(base, effect, f32::max),
        BlendMode::ColorDodge => per_channel(base, effect, color_dodge),
        BlendMode::ColorBurn => per_channel(base, effect, color_burn),
        BlendMode::HardLight => per_channel(base, effect, hard_light),
        BlendMode::SoftLight => per_channel(base, effect, soft_light),
        BlendMode::Difference => per_channel(base, effect, |b, s| (b - s).abs()),
        BlendMode::Exclusion => per_channel(base, effect, |b, s| b + s - 2.0 * b * s),
        BlendMode::Hue => set_lum(set_sat(effect, sat(base)), lum(base)),
        BlendMode::Saturation => set_lum(set_sat(base, sat(effect)), lum(base)),
        BlendMode::Color => set_lum(effect, lum(base)),
        BlendMode::Luminosity => set_lum(base, lum(effect)),
    }
}

/// `mix(base, blend(base, effect, mode), opacity)` with opacity clamped to `0..=1`.
pub fn composite(base: [f32; 3], effect: [f32; 3], mode: BlendMode, opacity: f32) -> [f32; 3] {
    let t = if opacity.is_nan() {
        0.0
    } else {
        opacity.clamp(0.0, 1.0)
    };
    let blended = blend(base, effect, mode);
    [0, 1, 2].map(|i| base[i] * (1.0 - t) + blended[i] * t)
}

/// Effective compositing weight of an effect texel for a pass at `opacity`.
pub fn composite_weight(effect: [f32; 4], filter: FilterMode, opacity: f32) -> f32 {
    let a = match filter {
        FilterMode::Filter => effect[3],
        FilterMode::Mask => luminance([effect[0], effect[1], effect[2]]) * effect[3],
    };
    opacity * a.clamp(0.0, 1.0)
}

/// WGSL twin of [`composite`]; mode ids follow [`BlendMode::index`].
pub(crate) const WGSL_PRELUDE: &str = r#"
fn bl_lum(c: vec3<f32>) -> f32 {
    return dot(c, vec3<f32>(0.3, 0.59, 0.11));
}

fn bl_clip_color(c_in: vec3<f32>) -> vec3<f32> {
    var c = c_in;
    let l = bl_lum(c);
    let n = min(min(c.x, c.y), c.z);
    let x = max(max(c.x, c.y), c.z);
    if n < 0.0 {
        c = vec3<f32>(l) + (c - vec3<f32>(l)) * l / max(l - n, 1e-6);
    }
    if x > 1.0 {
        c = vec3<f32>(l) + (c - vec3<f32>(l)) * (1.0 - l) / max(x - l, 1e-6);
    }
    return c;
}

fn bl_set_lum(c: vec3<f32>, l: f32) -> vec3<f32> {
    return bl_clip_color(c + vec3<f32>(l - bl_lum(c)));
}

fn bl_sat(c: vec3<f32>) -> f32 {
    return max(max(c.x, c.y), c.z) - min(min(c.x, c.y), c.z);
}

fn bl_set_sat(c: vec3<f32>, s: f32) -> vec3<f32> {
    let n = min(min(c.x, c.y), c.z);
    let x = max(max(c.x, c.y), c.z);
    if x > n {
        return (c - vec3<f32>(n)) * s / (x - n);
    }
    return vec3<f32>(0.0);
}

fn bl_hard_light(b: f32, s: f32) -> f32 {
    if s <= 0.5 {
        return 2.0 * b * s;
    }
    return 1.0 - 2.0 * (1.0 - b) * (1.0 - s);
}

fn bl_soft_light(b: f32, s: f32) -> f32 {
    if s <= 0.5 {
        return b - (1.0 - 2.0 * s) * b * (1.0 - b);
    }
    var d = sqrt(max(b, 0.0));
    if b <= 0.25 {
        d = ((16.0 * b - 12.0) * b + 4.0) * b;
    }
    return b + (2.0 * s - 1.0) * (d - b);
}

fn bl_color_dodge(b: f32, s: f32) -> f32 {
    if b <= 0.0 {
        return 0.0;
    }
    return min(b / max(1.0 - s, 1e-6), 1.0);
}

fn bl_color_burn(b: f32, s: f32) -> f32 {
    if b >= 1.0 {
        return 1.0;
    }
    return 1.0 - min((1.0 - b) / max(s, 1e-6), 1.0);
}

fn bl_blend(b: vec3<f32>, s: vec3<f32>, mode: i32) -> vec3<f32> {
    if mode == 1 {
        return b * s;
    }
    if mode == 2 {
        return b + s - b * s;
    }
    if mode == 3 {
        return vec3<f32>(bl_hard_light(s.x, b.x), bl_hard_light(s.y, b.y), bl_hard_light(s.z, b.z));
    }
    if mode == 4 {
        return min(b, s);
    }
    if mode == 5 {
        return max(b, s);
    }
    if mode == 6 {
        return vec3<f32>(bl_color_dodge(b.x, s.x), bl_color_dodge(b.y, s.y), bl_color_dodge(b.z, s.z));
    }
    if mode == 7 {
        return vec3<f32>(bl_color_burn(b.x, s.x), bl_color_burn(b.y, s.y), bl_color_burn(b.z, s.z));
    }
    if mode == 8 {
        return vec3<f32>(bl_hard_light(b.x, s.x), bl_hard_light(b.y, s.y), bl_hard_light(b.z, s.z));
    }
    if mode == 9 {
        return vec3<f32>(bl_soft_light(b.x, s.x), bl_soft_light(b.y, s.y), bl_soft_light(b.z, s.z));
    }
    if mode == 10 {
        return abs(b - s);
    }
    if mode == 11 {
        return b + s - 2.0 * b * s;
    }
    if mode == 12 {
        return bl_set_lum(bl_set_sat(s, bl_sat(b)), bl_lum(b));
    }
    if mode == 13 {
        return bl_set_lum(bl_set_sat(b, bl_sat(s)), bl_lum(b));
    }
    if mode == 14 {
        return bl_set_lum(s, bl_lum(b));
    }
    if mode == 15 {
        return bl_set_lum(b, bl_lum(s));
    }
    return s;
}

fn blend_composite(base: vec3<f32>, effect: vec3<f32>, mode: f32, opacity: f32) -> vec3<f32> {
    let t = clamp(opacity, 0.0, 1.0);
    let blended = bl_blend(base, effect, i32(round(mode)));
    return base * (1.0 - t) + blended * t;
}
"#;

#[cfg(test)]
#[path = "../../tests/unit/effects/blend.rs"]
mod tests;
