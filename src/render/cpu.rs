use std::collections::HashMap;

use rayon::prelude::*;

use crate::assets::media::MediaImage;
use crate::effects::color::{linear_to_srgb, quantize_unorm8};
use crate::foundation::error::{StrataError, StrataResult};
use crate::render::device::{
    Device, DeviceStats, DrawCall, TargetDesc, TextureFilter, TextureFormat, TextureId,
    check_not_aliased,
};
use crate::shader::interp::{FragmentEnv, TexelSource, shade};

/// Limits for the CPU reference device.
#[derive(Clone, Copy, Debug, Default)]
pub struct CpuDeviceOpts {
    /// Upper bound on bytes held by live textures; `None` is unbounded.
    pub max_texture_bytes: Option<u64>,
}

struct CpuTexture {
    desc: TargetDesc,
    texels: Vec<[f32; 4]>,
}

impl CpuTexture {
    fn fetch(&self, x: i64, y: i64) -> [f32; 4] {
        let w = i64::from(self.desc.width);
        let h = i64::from(self.desc.height);
        let x = x.clamp(0, w - 1);
        let y = y.clamp(0, h - 1);
        self.texels[(y * w + x) as usize]
    }

    fn sample_nearest(&self, uv: [f32; 2]) -> [f32; 4] {
        let x = (uv[0] * self.desc.width as f32).floor() as i64;
        let y = (uv[1] * self.desc.height as f32).floor() as i64;
        self.fetch(x, y)
    }

    fn sample_linear(&self, uv: [f32; 2]) -> [f32; 4] {
        let snap = |v: f32| {
            let r = v.round();
            if (v - r).abs() < 1e-3 { r } else { v }
        };
        let x = snap(uv[0] * self.desc.width as f32 - 0.5);
        let y = snap(uv[1] * self.desc.height as f32 - 0.5);
        let (x0, y0) = (x.floor(), y.floor());
        let (fx, fy) = (x - x0, y - y0);
        let (x0, y0) = (x0 as i64, y0 as i64);
        if fx == 0.0 && fy == 0.0 {
            return self.fetch(x0, y0);
        }
        let a = self.fetch(x0, y0);
        let b = self.fetch(x0 + 1, y0);
        let c = self.fetch(x0, y0 + 1);
        let d = self.fetch(x0 + 1, y0 + 1);
        std::array::from_fn(|i| {
            let top = a[i] * (1.0 - fx) + b[i] * fx;
            let bottom = c[i] * (1.0 - fx) + d[i] * fx;
            top * (1.0 - fy) + bottom * fy
        })
    }
}

/// A texture bound for one draw, with the filter picked for the draw's scale.
struct Bound<'a> {
    tex: &'a CpuTexture,
    filter: TextureFilter,
}

impl TexelSource for Bound<'_> {
    fn size(&self) -> (u32, u32) {
        (self.tex.desc.width, self.tex.desc.height)
    }

    fn sample(&self, uv: [f32; 2]) -> [f32; 4] {
        match self.filter {
            TextureFilter::Linear => self.tex.sample_linear(uv),
            TextureFilter::Nearest => self.tex.sample_nearest(uv),
        }
    }
}

fn bind<'a>(tex: &'a CpuTexture, out_w: u32, out_h: u32) -> Bound<'a> {
    let minifying = tex.desc.width > out_w || tex.desc.height > out_h;
    Bound {
        tex,
        filter: if minifying {
            tex.desc.min_filter
        } else {
            tex.desc.mag_filter
        },
    }
}

fn store(c: [f32; 4], format: TextureFormat) -> [f32; 4] {
    match format {
        TextureFormat::Rgba8Unorm => c.map(quantize_unorm8),
        TextureFormat::Rgba16Float => c.map(|v| v.clamp(-65504.0, 65504.0)),
    }
}

/// Reference device: executes shader programs on the CPU, rows in parallel.
pub struct CpuDevice {
    opts: CpuDeviceOpts,
    textures: HashMap<TextureId, CpuTexture>,
    next_id: u32,
    surface_size: (u32, u32),
    surface: Vec<[f32; 4]>,
    stats: DeviceStats,
}

impl Default for CpuDevice {
    fn default() -> Self {
        Self::new(CpuDeviceOpts::default())
    }
}

impl CpuDevice {
    /// An empty device with a 1x1 surface.
    pub fn new(opts: CpuDeviceOpts) -> Self {
        Self {
            opts,
            textures: HashMap::new(),
            next_id: 1,
            surface_size: (1, 1),
            surface: vec![[0.0; 4]],
            stats: DeviceStats::default(),
        }
    }

    fn insert(&mut self, desc: TargetDesc, texels: Vec<[f32; 4]>) -> StrataResult<TextureId> {
        let bytes = desc.byte_len();
        if let Some(max) = self.opts.max_texture_bytes
            && self.stats.texture_bytes.saturating_add(bytes) > max
        {
            return Err(StrataError::exhausted(format!(
                "{}x{} {:?} needs {bytes} bytes, {} of {max} in use",
                desc.width, desc.height, desc.format, self.stats.texture_bytes
            )));
        }
        let id = TextureId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.textures.insert(id, CpuTexture { desc, texels });
        self.stats.texture_bytes += bytes;
        self.stats.live_textures = self.textures.len();
        self.stats.textures_created += 1;
        Ok(id)
    }

    fn texture(&self, id: TextureId) -> StrataResult<&CpuTexture> {
        self.textures
            .get(&id)
            .ok_or_else(|| StrataError::device(format!("unknown texture {id:?}")))
    }
}

fn shade_into(
    textures: &HashMap<TextureId, CpuTexture>,
    call: &DrawCall<'_>,
    target: &mut CpuTexture,
) -> StrataResult<()> {
    let (w, h) = (target.desc.width, target.desc.height);
    let mut bound = Vec::with_capacity(call.inputs.len());
    for id in call.inputs {
        let tex = textures.get(id).ok_or_else(|| {
            StrataError::device(format!("`{}`: unknown input texture {id:?}", call.label))
        })?;
        bound.push(bind(tex, w, h));
    }
    let sources: Vec<&dyn TexelSource> = bound.iter().map(|b| b as &dyn TexelSource).collect();
    let env = FragmentEnv {
        resolution: [w as f32, h as f32],
        time: call.time,
        uniforms: call.uniforms,
        textures: &sources,
    };
    let format = target.desc.format;
    target
        .texels
        .par_chunks_mut(w as usize)
        .enumerate()
        .for_each_init(Vec::new, |regs, (y, row)| {
            let v = (y as f32 + 0.5) / h as f32;
            for (x, texel) in row.iter_mut().enumerate() {
                let u = (x as f32 + 0.5) / w as f32;
                *texel = store(shade(call.program, &env, [u, v], regs), format);
            }
        });
    Ok(())
}

impl Device for CpuDevice {
    fn backend_name(&self) -> &'static str {
        "cpu"
    }

    fn create_target(&mut self, desc: &TargetDesc) -> StrataResult<TextureId> {
        if desc.width == 0 || desc.height == 0 {
            return Err(StrataError::validation(format!(
                "render target must be non-empty, got {}x{}",
                desc.width, desc.height
            )));
        }
        let texels = vec![[0.0; 4]; (desc.width as usize) * (desc.height as usize)];
        self.insert(*desc, texels)
    }

    fn destroy_texture(&mut self, id: TextureId) {
        if let Some(tex) = self.textures.remove(&id) {
            self.stats.texture_bytes = self
                .stats
                .texture_bytes
                .saturating_sub(tex.desc.byte_len());
            self.stats.live_textures = self.textures.len();
        }
    }

    fn upload_texture(
        &mut self,
        image: &MediaImage,
        decode_srgb: bool,
    ) -> StrataResult<TextureId> {
        let desc = TargetDesc {
            width: image.width,
            height: image.height,
            format: TextureFormat::Rgba8Unorm,
            min_filter: TextureFilter::Linear,
            mag_filter: TextureFilter::Linear,
        };
        let id = self.insert(desc, image.to_texels(decode_srgb))?;
        self.stats.uploads += 1;
        Ok(id)
    }

    fn write_texture(
        &mut self,
        id: TextureId,
        image: &MediaImage,
        decode_srgb: bool,
    ) -> StrataResult<()> {
        let tex = self
            .textures
            .get_mut(&id)
            .ok_or_else(|| StrataError::device(format!("unknown texture {id:?}")))?;
        if (tex.desc.width, tex.desc.height) != (image.width, image.height) {
            return Err(StrataError::device(format!(
                "frame {}x{} does not match texture {}x{}",
                image.width, image.height, tex.desc.width, tex.desc.height
            )));
        }
        tex.texels = image.to_texels(decode_srgb);
        self.stats.uploads += 1;
        Ok(())
    }

    fn texture_size(&self, id: TextureId) -> Option<(u32, u32)> {
        self.textures
            .get(&id)
            .map(|t| (t.desc.width, t.desc.height))
    }

    fn clear(&mut self, id: TextureId, rgba: [f32; 4]) -> StrataResult<()> {
        let tex = self
            .textures
            .get_mut(&id)
            .ok_or_else(|| StrataError::device(format!("unknown texture {id:?}")))?;
        let value = store(rgba, tex.desc.format);
        tex.texels.fill(value);
        Ok(())
    }

    fn draw(&mut self, call: &DrawCall<'_>) -> StrataResult<()> {
        check_not_aliased(call)?;
        let program = call.program;
        if call.inputs.len() < program.input_slots() as usize {
            return Err(StrataError::device(format!(
                "`{}`: program reads {} inputs, {} bound",
                call.label,
                program.input_slots(),
                call.inputs.len()
            )));
        }
        if call.uniforms.len() < program.uniform_count() {
            return Err(StrataError::device(format!(
                "`{}`: program declares {} uniforms, {} supplied",
                call.label,
                program.uniform_count(),
                call.uniforms.len()
            )));
        }
        let mut target = self.textures.remove(&call.output).ok_or_else(|| {
            StrataError::device(format!("`{}`: unknown output {:?}", call.label, call.output))
        })?;
        let result = shade_into(&self.textures, call, &mut target);
        self.textures.insert(call.output, target);
        result?;
        self.stats.draws += 1;
        Ok(())
    }

    fn present(&mut self, id: TextureId, encode_srgb: bool) -> StrataResult<()> {
        let (sw, sh) = self.surface_size;
        let tex = self.texture(id)?;
        let src = bind(tex, sw, sh);
        let surface: Vec<[f32; 4]> = (0..sh)
            .into_par_iter()
            .flat_map_iter(|y| {
                let src = &src;
                (0..sw).map(move |x| {
                    let uv = [(x as f32 + 0.5) / sw as f32, (y as f32 + 0.5) / sh as f32];
                    let c = src.sample(uv);
                    let rgb = |v: f32| {
                        if encode_srgb { linear_to_srgb(v) } else { v }
                    };
                    [rgb(c[0]), rgb(c[1]), rgb(c[2]), c[3]].map(quantize_unorm8)
                })
            })
            .collect();
        self.surface = surface;
        self.stats.presents += 1;
        Ok(())
    }

    fn resize_surface(&mut self, width: u32, height: u32) -> StrataResult<()> {
        if width == 0 || height == 0 {
            return Err(StrataError::validation(format!(
                "surface must be non-empty, got {width}x{height}"
            )));
        }
        if self.surface_size != (width, height) {
            self.surface_size = (width, height);
            self.surface = vec![[0.0; 4]; (width as usize) * (height as usize)];
        }
        Ok(())
    }

    fn surface_size(&self) -> (u32, u32) {
        self.surface_size
    }

    fn read_pixels(&mut self, id: TextureId) -> StrataResult<Vec<[f32; 4]>> {
        Ok(self.texture(id)?.texels.clone())
    }

    fn read_surface(&mut self) -> StrataResult<Vec<[f32; 4]>> {
        Ok(self.surface.clone())
    }

    fn stats(&self) -> DeviceStats {
        self.stats.clone()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
