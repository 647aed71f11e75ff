#![forbid(unsafe_code)]
#![deny(missing_docs)]
//! Real-time layer compositor.
//!
//! A base media quad is drawn into one half of a ping-pong pair, then every visible layer's pass
//! reads the running image and writes its blended effect into the other half. Passes are typed
//! shader graphs compiled once per structural configuration and executed by a [`Device`]: the
//! CPU reference device, or wgpu behind the `gpu` feature.

pub(crate) mod assets;
pub(crate) mod effects;
pub(crate) mod fluid;
pub(crate) mod foundation;
pub(crate) mod layers;
pub(crate) mod passes;
pub(crate) mod pipeline;
pub(crate) mod render;
pub mod shader;

pub use assets::decode::decode_image;
pub use assets::media::MediaImage;
pub use effects::blend::{blend, composite, composite_weight};
pub use effects::color::{linear_to_srgb, luminance, srgb_to_linear};
pub use fluid::config::FluidConfig;
pub use fluid::pass::{FluidMode, FluidPass};
pub use fluid::pointer::{Interactivity, PointerInput, Splat, SplatKind, SplatQueue};
pub use fluid::sim::{FluidSim, SplatStyle, StepInput};
pub use foundation::core::{Extent, Rgba, parse_hex_color};
pub use foundation::error::{StrataError, StrataResult};
pub use layers::model::{BlendMode, FilterMode, LayerDescriptor, ShaderType, parse_layers_json};
pub use layers::param::{Param, ParamSpec, ParamType, ParamValue, SpecKind, find_spec};
pub use passes::ascii::Ascii;
pub use passes::base_quad::{BaseQuad, FitMode};
pub use passes::bloom::Bloom;
pub use passes::chromatic::ChromaticAberration;
pub use passes::effect_pass::{Effect, EffectPass, Passthrough};
pub use passes::factory::{create_pass, instantiate, param_specs};
pub use passes::grain::Grain;
pub use passes::halftone::Halftone;
pub use passes::mesh_gradient::MeshGradient;
pub use passes::noise::Noise;
pub use passes::params::{ParamChange, ParamState};
pub use passes::pixelate::Pixelate;
pub use passes::progressive_blur::ProgressiveBlur;
pub use passes::shapes::{Shape2d, Shape3d};
pub use passes::{CompositeSettings, Pass, RenderCtx};
pub use pipeline::frame_clock::FrameClock;
pub use pipeline::host::{BackendKind, Compositor, InitStatus};
pub use pipeline::manager::{FrameReport, PipelineManager, PipelineState};
pub use pipeline::opts::PipelineOpts;
pub use render::cpu::{CpuDevice, CpuDeviceOpts};
pub use render::device::{
    Device, DeviceStats, DrawCall, TargetDesc, TextureFilter, TextureFormat, TextureId,
};
#[cfg(feature = "gpu")]
pub use render::gpu::WgpuDevice;
pub use render::ping_pong::PingPong;
pub use render::target_pool::{PoolKey, PoolStats, RenderTarget, RenderTargetPool, TargetOptions};
pub use shader::program::Program;
pub use shader::wgsl::emit as emit_wgsl;
