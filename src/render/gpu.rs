use std::collections::HashMap;

use wgpu::util::DeviceExt;

use crate::assets::media::MediaImage;
use crate::effects::color::srgb_to_linear;
use crate::foundation::error::{StrataError, StrataResult};
use crate::render::device::{
    Device, DeviceStats, DrawCall, TargetDesc, TextureFilter, TextureFormat, TextureId,
    check_not_aliased,
};
use crate::shader::ir::{Expr, Ty, join, max, mix, pow, step};
use crate::shader::program::Program;
use crate::shader::uniforms::{UniformBlock, UniformHandle, pack};
use crate::shader::wgsl::{FRAGMENT_ENTRY, VERTEX_ENTRY, emit};

struct GpuTexture {
    desc: TargetDesc,
    srgb: bool,
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

struct CachedPipeline {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

struct Presenter {
    program: Program,
    uniforms: UniformBlock,
    encode: UniformHandle,
}

impl Presenter {
    fn new() -> StrataResult<Self> {
        let mut uniforms = UniformBlock::new();
        let encode = uniforms.declare("encode_srgb", Ty::F32, [0.0; 4]);
        let c = Expr::sample(0, Expr::uv());
        let rgb = max(c.rgb(), 0.0);
        let lo = &rgb * 12.92;
        let hi = pow(&rgb, 1.0 / 2.4) * 1.055 - 0.055;
        let encoded = mix(lo, hi, step(0.003_130_8, &rgb));
        let rgb = mix(c.rgb(), encoded, uniforms.expr(encode));
        let program = Program::compile("present", &join([rgb, c.w()]), &uniforms)?;
        Ok(Self {
            program,
            uniforms,
            encode,
        })
    }
}

fn wgpu_format(format: TextureFormat, srgb: bool) -> wgpu::TextureFormat {
    match (format, srgb) {
        (TextureFormat::Rgba8Unorm, false) => wgpu::TextureFormat::Rgba8Unorm,
        (TextureFormat::Rgba8Unorm, true) => wgpu::TextureFormat::Rgba8UnormSrgb,
        (TextureFormat::Rgba16Float, _) => wgpu::TextureFormat::Rgba16Float,
    }
}

fn wgpu_filter(filter: TextureFilter) -> wgpu::FilterMode {
    match filter {
        TextureFilter::Linear => wgpu::FilterMode::Linear,
        TextureFilter::Nearest => wgpu::FilterMode::Nearest,
    }
}

/// The pending frame encoder, or a fresh one.
fn open_encoder(
    pending: &mut Option<wgpu::CommandEncoder>,
    device: &wgpu::Device,
) -> wgpu::CommandEncoder {
    pending.take().unwrap_or_else(|| {
        device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("strata_frame"),
        })
    })
}

fn lookup(textures: &HashMap<TextureId, GpuTexture>, id: TextureId) -> StrataResult<&GpuTexture> {
    textures
        .get(&id)
        .ok_or_else(|| StrataError::device(format!("unknown texture {id:?}")))
}

fn align_to(v: u32, alignment: u32) -> u32 {
    v.div_ceil(alignment) * alignment
}

fn f16_to_f32(bits: u16) -> f32 {
    let sign = u32::from(bits >> 15) << 31;
    let exp = u32::from((bits >> 10) & 0x1f);
    let mant = u32::from(bits & 0x3ff);
    match exp {
        0 => {
            let m = mant as f32 * (1.0 / 1024.0) * 2f32.powi(-14);
            if sign != 0 { -m } else { m }
        }
        0x1f => f32::from_bits(sign | 0x7f80_0000 | (mant << 13)),
        e => f32::from_bits(sign | ((e + 112) << 23) | (mant << 13)),
    }
}

/// wgpu-backed device. Programs become WGSL pipelines cached per (program hash, output format);
/// the presentation surface is an offscreen `Rgba8Unorm` texture.
///
/// Clears and draws record into one pending encoder that is submitted by `present`, by a
/// readback, or before a queue write or texture destruction could reorder against it.
pub struct WgpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    adapter_name: String,
    textures: HashMap<TextureId, GpuTexture>,
    next_id: u32,
    pipelines: HashMap<(u64, wgpu::TextureFormat), CachedPipeline>,
    samplers: HashMap<(TextureFilter, TextureFilter), wgpu::Sampler>,
    presenter: Presenter,
    surface: Option<TextureId>,
    surface_size: (u32, u32),
    pending: Option<wgpu::CommandEncoder>,
    stats: DeviceStats,
}

impl WgpuDevice {
    /// Request an adapter and device. `Ok(None)` means no adapter is available.
    pub async fn request() -> StrataResult<Option<Self>> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = match instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
        {
            Ok(adapter) => adapter,
            Err(e) => {
                tracing::info!(error = %e, "no wgpu adapter available");
                return Ok(None);
            }
        };
        let adapter_name = adapter.get_info().name;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("strata_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|e| StrataError::device(format!("wgpu request_device failed: {e}")))?;

        tracing::debug!(adapter = %adapter_name, "wgpu device ready");
        let mut dev = Self {
            device,
            queue,
            adapter_name,
            textures: HashMap::new(),
            next_id: 1,
            pipelines: HashMap::new(),
            samplers: HashMap::new(),
            presenter: Presenter::new()?,
            surface: None,
            surface_size: (0, 0),
            pending: None,
            stats: DeviceStats::default(),
        };
        dev.resize_surface(1, 1)?;
        Ok(Some(dev))
    }

    /// Name of the adapter the device runs on.
    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }

    fn alloc(&mut self, desc: TargetDesc, srgb: bool, usage: wgpu::TextureUsages) -> TextureId {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("strata_texture"),
            size: wgpu::Extent3d {
                width: desc.width,
                height: desc.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu_format(desc.format, srgb),
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let id = TextureId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.textures.insert(
            id,
            GpuTexture {
                desc,
                srgb,
                texture,
                view,
            },
        );
        self.stats.texture_bytes += desc.byte_len();
        self.stats.live_textures = self.textures.len();
        self.stats.textures_created += 1;
        id
    }

    /// Submit everything recorded since the last submission.
    fn flush(&mut self) {
        if let Some(encoder) = self.pending.take() {
            self.queue.submit(Some(encoder.finish()));
            self.stats.submits += 1;
        }
    }

    fn texture(&self, id: TextureId) -> StrataResult<&GpuTexture> {
        lookup(&self.textures, id)
    }

    fn sampler(&mut self, min: TextureFilter, mag: TextureFilter) -> wgpu::Sampler {
        self.samplers
            .entry((min, mag))
            .or_insert_with(|| {
                self.device.create_sampler(&wgpu::SamplerDescriptor {
                    label: Some("strata_sampler"),
                    address_mode_u: wgpu::AddressMode::ClampToEdge,
                    address_mode_v: wgpu::AddressMode::ClampToEdge,
                    address_mode_w: wgpu::AddressMode::ClampToEdge,
                    mag_filter: wgpu_filter(mag),
                    min_filter: wgpu_filter(min),
                    mipmap_filter: wgpu::FilterMode::Nearest,
                    ..Default::default()
                })
            })
            .clone()
    }

    fn ensure_pipeline(
        &mut self,
        program: &Program,
        format: wgpu::TextureFormat,
    ) -> StrataResult<()> {
        let key = (program.hash(), format);
        if self.pipelines.contains_key(&key) {
            return Ok(());
        }
        let source = emit(program);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(program.label()),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });

        let mut entries = vec![wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }];
        for i in 0..u32::from(program.input_slots()) {
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: 1 + 2 * i,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            });
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: 2 + 2 * i,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            });
        }
        let bind_group_layout =
            self.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("strata_bgl"),
                    entries: &entries,
                });
        let layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("strata_pl"),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });
        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(program.label()),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &module,
                    entry_point: Some(VERTEX_ENTRY),
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                    buffers: &[],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &module,
                    entry_point: Some(FRAGMENT_ENTRY),
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState::default(),
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });
        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(StrataError::shader(format!(
                "`{}` failed to build: {err}",
                program.label()
            )));
        }
        tracing::debug!(program = program.label(), hash = program.hash(), "pipeline compiled");
        self.pipelines.insert(
            key,
            CachedPipeline {
                pipeline,
                bind_group_layout,
            },
        );
        self.stats.cached_pipelines = self.pipelines.len();
        Ok(())
    }

    fn write_rgba8(&self, tex: &GpuTexture, image: &MediaImage) {
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &tex.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            image.rgba8.as_slice(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * image.width),
                rows_per_image: Some(image.height),
            },
            wgpu::Extent3d {
                width: image.width,
                height: image.height,
                depth_or_array_layers: 1,
            },
        );
    }
}

impl Device for WgpuDevice {
    fn backend_name(&self) -> &'static str {
        "wgpu"
    }

    fn create_target(&mut self, desc: &TargetDesc) -> StrataResult<TextureId> {
        if desc.width == 0 || desc.height == 0 {
            return Err(StrataError::validation(format!(
                "render target must be non-empty, got {}x{}",
                desc.width, desc.height
            )));
        }
        let limit = self.device.limits().max_texture_dimension_2d;
        if desc.width > limit || desc.height > limit {
            return Err(StrataError::exhausted(format!(
                "{}x{} exceeds the device texture limit {limit}",
                desc.width, desc.height
            )));
        }
        Ok(self.alloc(
            *desc,
            false,
            wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::COPY_DST,
        ))
    }

    fn destroy_texture(&mut self, id: TextureId) {
        if !self.textures.contains_key(&id) {
            return;
        }
        self.flush();
        if let Some(tex) = self.textures.remove(&id) {
            tex.texture.destroy();
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
        let id = self.alloc(
            desc,
            decode_srgb,
            wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST
                | wgpu::TextureUsages::COPY_SRC,
        );
        let tex = self.texture(id)?;
        self.write_rgba8(tex, image);
        self.stats.uploads += 1;
        Ok(id)
    }

    fn write_texture(
        &mut self,
        id: TextureId,
        image: &MediaImage,
        decode_srgb: bool,
    ) -> StrataResult<()> {
        let tex = self.texture(id)?;
        if (tex.desc.width, tex.desc.height) != (image.width, image.height)
            || tex.srgb != decode_srgb
        {
            return Err(StrataError::device(format!(
                "frame {}x{} does not match texture {}x{}",
                image.width, image.height, tex.desc.width, tex.desc.height
            )));
        }
        // Queue writes land before the next submission, so earlier draws must go first.
        self.flush();
        let tex = self.texture(id)?;
        self.write_rgba8(tex, image);
        self.stats.uploads += 1;
        Ok(())
    }

    fn texture_size(&self, id: TextureId) -> Option<(u32, u32)> {
        self.textures
            .get(&id)
            .map(|t| (t.desc.width, t.desc.height))
    }

    fn clear(&mut self, id: TextureId, rgba: [f32; 4]) -> StrataResult<()> {
        let tex = lookup(&self.textures, id)?;
        let mut encoder = open_encoder(&mut self.pending, &self.device);
        {
            let _rp = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("strata_clear_rp"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &tex.view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: f64::from(rgba[0]),
                            g: f64::from(rgba[1]),
                            b: f64::from(rgba[2]),
                            a: f64::from(rgba[3]),
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
        }
        self.pending = Some(encoder);
        Ok(())
    }

    fn draw(&mut self, call: &DrawCall<'_>) -> StrataResult<()> {
        check_not_aliased(call)?;
        let program = call.program;
        if call.inputs.len() < program.input_slots() as usize
            || call.uniforms.len() < program.uniform_count()
        {
            return Err(StrataError::device(format!(
                "`{}`: draw binds {} inputs / {} uniforms, program needs {} / {}",
                call.label,
                call.inputs.len(),
                call.uniforms.len(),
                program.input_slots(),
                program.uniform_count()
            )));
        }
        let out = self.texture(call.output)?;
        let (out_w, out_h) = (out.desc.width, out.desc.height);
        let format = wgpu_format(out.desc.format, out.srgb);
        self.ensure_pipeline(program, format)?;

        let mut sizes = Vec::with_capacity(call.inputs.len());
        let mut samplers = Vec::with_capacity(call.inputs.len());
        for id in &call.inputs[..program.input_slots() as usize] {
            let desc = self.texture(*id)?.desc;
            sizes.push((desc.width, desc.height));
            samplers.push(self.sampler(desc.min_filter, desc.mag_filter));
        }
        let packed = pack((out_w, out_h), call.time, &sizes, call.uniforms);
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("strata_uniforms"),
                contents: bytemuck::cast_slice(&packed),
                usage: wgpu::BufferUsages::UNIFORM,
            });

        let cached = self
            .pipelines
            .get(&(program.hash(), format))
            .ok_or_else(|| StrataError::device("pipeline cache miss after compile"))?;
        let mut entries = vec![wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }];
        for (i, (id, sampler)) in call.inputs.iter().zip(&samplers).enumerate() {
            let tex = self.texture(*id)?;
            let i = i as u32;
            entries.push(wgpu::BindGroupEntry {
                binding: 1 + 2 * i,
                resource: wgpu::BindingResource::TextureView(&tex.view),
            });
            entries.push(wgpu::BindGroupEntry {
                binding: 2 + 2 * i,
                resource: wgpu::BindingResource::Sampler(sampler),
            });
        }
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("strata_bg"),
            layout: &cached.bind_group_layout,
            entries: &entries,
        });

        let out = lookup(&self.textures, call.output)?;
        let mut encoder = open_encoder(&mut self.pending, &self.device);
        {
            let mut rp = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(call.label),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &out.view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            rp.set_pipeline(&cached.pipeline);
            rp.set_bind_group(0, &bind_group, &[]);
            rp.draw(0..3, 0..1);
        }
        self.pending = Some(encoder);
        self.stats.draws += 1;
        Ok(())
    }

    fn present(&mut self, id: TextureId, encode_srgb: bool) -> StrataResult<()> {
        let surface = self
            .surface
            .ok_or_else(|| StrataError::state("presentation surface not created"))?;
        let encode = self.presenter.encode;
        self.presenter
            .uniforms
            .set_f32(encode, if encode_srgb { 1.0 } else { 0.0 });
        let values = self.presenter.uniforms.values();
        let program = self.presenter.program.clone();
        self.draw(&DrawCall {
            program: &program,
            uniforms: &values,
            inputs: &[id],
            output: surface,
            time: 0.0,
            label: "present",
        })?;
        self.flush();
        self.stats.presents += 1;
        Ok(())
    }

    fn resize_surface(&mut self, width: u32, height: u32) -> StrataResult<()> {
        if width == 0 || height == 0 {
            return Err(StrataError::validation(format!(
                "surface must be non-empty, got {width}x{height}"
            )));
        }
        if self.surface.is_some() && self.surface_size == (width, height) {
            return Ok(());
        }
        if let Some(old) = self.surface.take() {
            self.destroy_texture(old);
        }
        let id = self.create_target(&TargetDesc {
            width,
            height,
            format: TextureFormat::Rgba8Unorm,
            min_filter: TextureFilter::Linear,
            mag_filter: TextureFilter::Linear,
        })?;
        self.surface = Some(id);
        self.surface_size = (width, height);
        Ok(())
    }

    fn surface_size(&self) -> (u32, u32) {
        self.surface_size
    }

    fn read_pixels(&mut self, id: TextureId) -> StrataResult<Vec<[f32; 4]>> {
        let (w, h, format, srgb) = {
            let tex = self.texture(id)?;
            (tex.desc.width, tex.desc.height, tex.desc.format, tex.srgb)
        };
        let bpt = format.bytes_per_texel() as u32;
        let row = w
            .checked_mul(bpt)
            .ok_or_else(|| StrataError::device("readback row overflow"))?;
        let padded = align_to(row, wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);
        let readback = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("strata_readback"),
            size: u64::from(padded) * u64::from(h),
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let tex = lookup(&self.textures, id)?;
        let mut encoder = open_encoder(&mut self.pending, &self.device);
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &tex.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(h),
                },
            },
            wgpu::Extent3d {
                width: w,
                height: h,
                depth_or_array_layers: 1,
            },
        );
        self.pending = Some(encoder);
        self.flush();

        let slice = readback.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |res| {
            let _ = tx.send(res);
        });
        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|e| StrataError::device(format!("wgpu poll failed: {e:?}")))?;
        rx.recv()
            .map_err(|_| StrataError::device("readback channel closed"))?
            .map_err(|e| StrataError::device(format!("readback map failed: {e:?}")))?;

        let mapped = slice.get_mapped_range();
        let mut out = Vec::with_capacity((w as usize) * (h as usize));
        for y in 0..h as usize {
            let start = y * padded as usize;
            let row_bytes = &mapped[start..start + row as usize];
            match format {
                TextureFormat::Rgba8Unorm => {
                    for px in row_bytes.chunks_exact(4) {
                        let c = |v: u8| {
                            let v = f32::from(v) / 255.0;
                            if srgb { srgb_to_linear(v) } else { v }
                        };
                        out.push([c(px[0]), c(px[1]), c(px[2]), f32::from(px[3]) / 255.0]);
                    }
                }
                TextureFormat::Rgba16Float => {
                    for px in row_bytes.chunks_exact(8) {
                        out.push(std::array::from_fn(|i| {
                            f16_to_f32(u16::from_le_bytes([px[2 * i], px[2 * i + 1]]))
                        }));
                    }
                }
            }
        }
        drop(mapped);
        readback.unmap();
        Ok(out)
    }

    fn read_surface(&mut self) -> StrataResult<Vec<[f32; 4]>> {
        let surface = self
            .surface
            .ok_or_else(|| StrataError::state("presentation surface not created"))?;
        self.read_pixels(surface)
    }

    fn stats(&self) -> DeviceStats {
        self.stats.clone()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/gpu.rs"]
mod tests;
