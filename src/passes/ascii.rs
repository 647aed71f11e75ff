use crate::assets::media::MediaImage;
use crate::foundation::error::StrataResult;
use crate::layers::model::ShaderType;
use crate::layers::param::ParamSpec;
use crate::passes::RenderCtx;
use crate::passes::effect_pass::Effect;
use crate::passes::params::ParamState;
use crate::render::device::TextureId;
use crate::shader::ir::{Expr, join, luminance, min, mix, vec2};

/// Glyph ramp from empty to dense.
pub const RAMP: &str = " .:-=+*#%@";

const GLYPH_W: u32 = 5;
const GLYPH_H: u32 = 7;

/// 5x7 bitmaps for [`RAMP`], one row per byte, most significant of the low 5 bits leftmost.
const GLYPHS: [[u8; 7]; 10] = [
    [0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0b01100, 0b01100],
    [0, 0b01100, 0b01100, 0, 0b01100, 0b01100, 0],
    [0, 0, 0, 0b11111, 0, 0, 0],
    [0, 0, 0b11111, 0, 0b11111, 0, 0],
    [0, 0b00100, 0b00100, 0b11111, 0b00100, 0b00100, 0],
    [0, 0b10101, 0b01110, 0b11111, 0b01110, 0b10101, 0],
    [0b01010, 0b01010, 0b11111, 0b01010, 0b11111, 0b01010, 0b01010],
    [0b11001, 0b11010, 0b00010, 0b00100, 0b01000, 0b01011, 0b10011],
    [0b01110, 0b10001, 0b10111, 0b10101, 0b10111, 0b10000, 0b01110],
];

/// Glyph atlas: the ramp laid out left to right, white ink on black.
pub fn glyph_atlas() -> MediaImage {
    let count = GLYPHS.len() as u32;
    MediaImage::from_fn(GLYPH_W * count, GLYPH_H, |x, y| {
        let glyph = &GLYPHS[(x / GLYPH_W) as usize];
        let bit = GLYPH_W - 1 - x % GLYPH_W;
        if (glyph[y as usize] >> bit) & 1 == 1 {
            [255, 255, 255, 255]
        } else {
            [0, 0, 0, 255]
        }
    })
}

/// Replaces each cell with the ramp glyph matching its luminance.
#[derive(Debug, Default)]
pub struct Ascii {
    atlas: Option<TextureId>,
}

impl Ascii {
    /// Glyph atlas texture, once prepared.
    pub fn atlas(&self) -> Option<TextureId> {
        self.atlas
    }
}

impl Effect for Ascii {
    const SHADER: ShaderType = ShaderType::Ascii;
    const SPECS: &'static [ParamSpec] = &[
        ParamSpec::float("cellSize", 10.0, 4.0, 64.0),
        ParamSpec::color("foreground", [1.0, 1.0, 1.0]),
        ParamSpec::color("background", [0.0, 0.0, 0.0]),
        ParamSpec::boolean("colored", false),
        ParamSpec::boolean("invert", false),
    ];

    fn graph(&self, params: &ParamState) -> Expr {
        let res = Expr::resolution();
        let size = params.expr("cellSize");
        let cell = Expr::uv() * &res / &size;
        let colour = Expr::sample(0, (cell.floor() + 0.5) * &size / &res);
        let lum = luminance(&colour.rgb()).saturate();
        let lum = mix(&lum, 1.0 - &lum, params.expr("invert"));
        let count = GLYPHS.len() as f32;
        let index = min(&lum * count, count - 1.0).floor();

        let local = cell.fract();
        let gx = (local.x() * GLYPH_W as f32).floor();
        let gy = (local.y() * GLYPH_H as f32).floor();
        let atlas_uv = vec2(
            (index * GLYPH_W as f32 + gx + 0.5) / (GLYPH_W as f32 * count),
            (gy + 0.5) / GLYPH_H as f32,
        );
        let ink = Expr::sample(1, atlas_uv).x();
        let fg = mix(params.expr("foreground"), colour.rgb(), params.expr("colored"));
        join([mix(params.expr("background"), fg, ink), Expr::lit(1.0)])
    }

    fn prepare(&mut self, ctx: &mut RenderCtx<'_>) -> StrataResult<()> {
        if self.atlas.is_none() {
            self.atlas = Some(ctx.device.upload_texture(&glyph_atlas(), false)?);
        }
        Ok(())
    }

    fn extra_inputs(&self) -> Vec<TextureId> {
        self.atlas.into_iter().collect()
    }

    fn release(&mut self, ctx: &mut RenderCtx<'_>) {
        if let Some(atlas) = self.atlas.take() {
            ctx.device.destroy_texture(atlas);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/passes/ascii.rs"]
mod tests;
