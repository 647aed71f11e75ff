use crate::assets::media::MediaImage;
use crate::foundation::error::StrataResult;
use crate::shader::program::Program;

/// Opaque handle to a device texture. Ids are never reused by a device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub(crate) u32);

impl TextureId {
    /// Numeric value of the handle.
    pub fn raw(self) -> u32 {
        self.0
    }
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
/// Storage format of a texture.
#[serde(rename_all = "kebab-case")]
pub enum TextureFormat {
    /// 8-bit normalized; values clamp to `0..=1`.
    Rgba8Unorm,
    /// Half float; keeps HDR values.
    #[default]
    Rgba16Float,
}

impl TextureFormat {
    /// Storage size of one texel.
    pub fn bytes_per_texel(self) -> u64 {
        match self {
            TextureFormat::Rgba8Unorm => 4,
            TextureFormat::Rgba16Float => 8,
        }
    }
}

/// Sampler filtering for a texture.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum TextureFilter {
    /// Bilinear.
    #[default]
    Linear,
    /// Closest texel.
    Nearest,
}

/// Everything needed to create a render target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TargetDesc {
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// Storage format.
    pub format: TextureFormat,
    /// Filter when minifying.
    pub min_filter: TextureFilter,
    /// Filter when magnifying.
    pub mag_filter: TextureFilter,
}

impl TargetDesc {
    /// Storage size of the whole texture.
    pub fn byte_len(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height) * self.format.bytes_per_texel()
    }
}

/// One fullscreen draw of `program` into `output`.
#[derive(Clone, Copy, Debug)]
pub struct DrawCall<'a> {
    /// Program to run.
    pub program: &'a Program,
    /// User uniform values in declaration order; devices prepend the builtin header.
    pub uniforms: &'a [[f32; 4]],
    /// Bound to texture slots `0..inputs.len()`.
    pub inputs: &'a [TextureId],
    /// Texture written; must not be among the inputs.
    pub output: TextureId,
    /// Seconds, exposed to the program as `time`.
    pub time: f32,
    /// Debug label for logs and GPU captures.
    pub label: &'a str,
}

/// Running counters of a device.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeviceStats {
    /// Textures currently alive.
    pub live_textures: usize,
    /// Bytes held by live textures.
    pub texture_bytes: u64,
    /// Textures ever created.
    pub textures_created: u64,
    /// Media uploads and rewrites.
    pub uploads: u64,
    /// Draws executed.
    pub draws: u64,
    /// Frames presented.
    pub presents: u64,
    /// Command buffers handed to the GPU queue; devices that execute eagerly never submit.
    pub submits: u64,
    /// Compiled pipelines held in the cache.
    pub cached_pipelines: usize,
}

/// The seam between the compositor and a GPU API.
///
/// Every call is issued from the single frame thread. Implementations must reject a draw whose
/// output texture is also bound as an input.
pub trait Device {
    /// Short backend name for logs ("cpu", "wgpu").
    fn backend_name(&self) -> &'static str;

    /// Allocate a render target.
    fn create_target(&mut self, desc: &TargetDesc) -> StrataResult<TextureId>;

    /// Unknown ids are ignored.
    fn destroy_texture(&mut self, id: TextureId);

    /// Upload a media frame as a new sampled texture.
    fn upload_texture(&mut self, image: &MediaImage, decode_srgb: bool)
    -> StrataResult<TextureId>;

    /// Overwrite an existing texture of identical size (video/webcam frame refresh).
    fn write_texture(
        &mut self,
        id: TextureId,
        image: &MediaImage,
        decode_srgb: bool,
    ) -> StrataResult<()>;

    /// Size of a live texture.
    fn texture_size(&self, id: TextureId) -> Option<(u32, u32)>;

    /// Fill a texture with one color.
    fn clear(&mut self, id: TextureId, rgba: [f32; 4]) -> StrataResult<()>;

    /// Run one fullscreen draw.
    fn draw(&mut self, call: &DrawCall<'_>) -> StrataResult<()>;

    /// Blit `id` onto the presentation surface, optionally re-encoding linear values to sRGB.
    fn present(&mut self, id: TextureId, encode_srgb: bool) -> StrataResult<()>;

    /// Resize the presentation surface.
    fn resize_surface(&mut self, width: u32, height: u32) -> StrataResult<()>;

    /// Current surface size.
    fn surface_size(&self) -> (u32, u32);

    /// Row-major texels of a texture, top row first.
    fn read_pixels(&mut self, id: TextureId) -> StrataResult<Vec<[f32; 4]>>;

    /// Row-major texels of the presentation surface.
    fn read_surface(&mut self) -> StrataResult<Vec<[f32; 4]>>;

    /// Counter snapshot.
    fn stats(&self) -> DeviceStats;
}

pub(crate) fn check_not_aliased(call: &DrawCall<'_>) -> StrataResult<()> {
    if call.inputs.contains(&call.output) {
        return Err(crate::foundation::error::StrataError::device(format!(
            "`{}`: output texture {:?} is also bound as an input",
            call.label, call.output
        )));
    }
    Ok(())
}
