use crate::assets::decode::decode_image;
use crate::assets::media::MediaImage;
use crate::foundation::core::Rgba;
use crate::foundation::error::StrataResult;
use crate::render::device::{Device, DrawCall, TextureId};
use crate::shader::ir::{Expr, Ty, join, max, min, mix, step};
use crate::shader::program::Program;
use crate::shader::uniforms::{UniformBlock, UniformHandle};

/// How media is fitted into the viewport.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Fill the viewport, cropping the overflowing axis.
    #[default]
    Cover,
    /// Show the whole media, padding with the background colour.
    Contain,
}

#[derive(Clone, Copy, Debug)]
struct Media {
    texture: TextureId,
    width: u32,
    height: u32,
}

/// Draws the bottom-most media into the first target of a frame.
///
/// Fitting is computed in the shader from the media texel size and the output resolution, so
/// resizes and fit changes only touch uniforms.
pub struct BaseQuad {
    media: Option<Media>,
    decode_srgb: bool,
    uniforms: UniformBlock,
    fit: UniformHandle,
    background: UniformHandle,
    program: Program,
}

impl BaseQuad {
    /// A quad with no media; `decode_srgb` linearises uploads.
    pub fn new(fit: FitMode, background: Rgba, decode_srgb: bool) -> StrataResult<Self> {
        let mut uniforms = UniformBlock::new();
        let fit_h = uniforms.declare("fit", Ty::F32, [0.0; 4]);
        let bg_h = uniforms.declare("background", Ty::Vec4, background);
        let program = Self::compile(&uniforms, fit_h, bg_h)?;
        let mut quad = Self {
            media: None,
            decode_srgb,
            uniforms,
            fit: fit_h,
            background: bg_h,
            program,
        };
        quad.set_fit(fit);
        Ok(quad)
    }

    fn compile(
        uniforms: &UniformBlock,
        fit: UniformHandle,
        background: UniformHandle,
    ) -> StrataResult<Program> {
        let res = Expr::resolution();
        let view_aspect = res.x() / res.y();
        let texel = Expr::texel_size(0);
        let media_aspect = texel.y() / texel.x();
        let ratio = &view_aspect / &media_aspect;
        let inverse = &media_aspect / &view_aspect;
        let cover = join([min(&ratio, 1.0), min(&inverse, 1.0)]);
        let contain = join([max(&ratio, 1.0), max(&inverse, 1.0)]);
        let scale = mix(cover, contain, uniforms.expr(fit));
        let uv = (Expr::uv() - 0.5) * scale + 0.5;

        let inside = step(0.0, uv.x()) * step(uv.x(), 1.0) * step(0.0, uv.y()) * step(uv.y(), 1.0);
        let c = Expr::sample(0, &uv);
        let bg = uniforms.expr(background);
        let w = c.w() * inside;
        let rgb = mix(bg.rgb(), c.rgb(), &w);
        let a = bg.w() + &w * (1.0 - bg.w());
        Program::compile("base-quad", &join([rgb, a]), uniforms)
    }

    /// Switch between cover and contain.
    pub fn set_fit(&mut self, fit: FitMode) {
        let v = match fit {
            FitMode::Cover => 0.0,
            FitMode::Contain => 1.0,
        };
        self.uniforms.set_f32(self.fit, v);
    }

    /// Current fit.
    pub fn fit(&self) -> FitMode {
        if self.uniforms.get(self.fit)[0] > 0.5 {
            FitMode::Contain
        } else {
            FitMode::Cover
        }
    }

    /// Color shown where no media covers the output.
    pub fn set_background(&mut self, rgba: Rgba) {
        self.uniforms.set(self.background, rgba);
    }

    /// Current background.
    pub fn background(&self) -> Rgba {
        self.uniforms.get(self.background)
    }

    /// Whether media is set.
    pub fn has_media(&self) -> bool {
        self.media.is_some()
    }

    /// Size of the current media.
    pub fn media_size(&self) -> Option<(u32, u32)> {
        self.media.map(|m| (m.width, m.height))
    }

    /// Texture holding the current media.
    pub fn media_texture(&self) -> Option<TextureId> {
        self.media.map(|m| m.texture)
    }

    /// Replace the media. On failure the previous media stays.
    pub fn set_media(&mut self, device: &mut dyn Device, image: &MediaImage) -> StrataResult<()> {
        let texture = device.upload_texture(image, self.decode_srgb)?;
        if let Some(old) = self.media.replace(Media {
            texture,
            width: image.width,
            height: image.height,
        }) {
            device.destroy_texture(old.texture);
        }
        tracing::debug!(width = image.width, height = image.height, "base media set");
        Ok(())
    }

    /// Decode and show an encoded image. A decode or upload failure is logged and the last good
    /// media (or the background) keeps showing; returns whether the new image was applied.
    pub fn load_image_bytes(&mut self, device: &mut dyn Device, bytes: &[u8]) -> bool {
        let applied = decode_image(bytes).and_then(|image| self.set_media(device, &image));
        match applied {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "base media load failed; keeping previous frame");
                false
            }
        }
    }

    /// Refresh with a new video/webcam frame, reusing the texture when the size is unchanged.
    pub fn update_frame(
        &mut self,
        device: &mut dyn Device,
        image: &MediaImage,
    ) -> StrataResult<()> {
        match self.media {
            Some(m) if (m.width, m.height) == (image.width, image.height) => {
                device.write_texture(m.texture, image, self.decode_srgb)
            }
            _ => self.set_media(device, image),
        }
    }

    /// Drop the media and its texture.
    pub fn clear_media(&mut self, device: &mut dyn Device) {
        if let Some(m) = self.media.take() {
            device.destroy_texture(m.texture);
        }
    }

    /// Draw the fitted media into `output`, or clear it to the background without media.
    pub fn render(&self, device: &mut dyn Device, output: TextureId) -> StrataResult<()> {
        let Some(media) = self.media else {
            return device.clear(output, self.background());
        };
        let uniforms = self.uniforms.values();
        device.draw(&DrawCall {
            program: &self.program,
            uniforms: &uniforms,
            inputs: &[media.texture],
            output,
            time: 0.0,
            label: "base-quad",
        })
    }

    /// The fitting program.
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Release every device resource.
    pub fn dispose(&mut self, device: &mut dyn Device) {
        self.clear_media(device);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/passes/base_quad.rs"]
mod tests;
