use super::*;
use crate::render::cpu::{CpuDevice, CpuDeviceOpts};

const GRAY: [u8; 4] = [128, 128, 128, 255];

fn small_opts() -> PipelineOpts {
    let mut opts = PipelineOpts::default();
    opts.fluid.sim_resolution = 16;
    opts.fluid.dye_resolution = 32;
    opts.fluid.pressure_iterations = 4;
    opts
}

fn manager_with(device: CpuDevice, size: u32) -> PipelineManager {
    let mut m = PipelineManager::new(Box::new(device), small_opts()).unwrap();
    m.init(size, size).unwrap();
    m.set_media(&MediaImage::solid(size, size, GRAY)).unwrap();
    m
}

fn manager(size: u32) -> PipelineManager {
    manager_with(CpuDevice::default(), size)
}

fn layer(id: &str, ty: ShaderType) -> LayerDescriptor {
    LayerDescriptor::new(id, ty)
}

fn gray() -> f32 {
    128.0 / 255.0
}

#[test]
fn invalid_options_are_rejected_up_front() {
    let mut opts = PipelineOpts::default();
    opts.max_splat_queue = 0;
    assert!(PipelineManager::new(Box::new(CpuDevice::default()), opts).is_err());
}

#[test]
fn render_requires_init() {
    let mut m = PipelineManager::new(Box::new(CpuDevice::default()), small_opts()).unwrap();
    assert_eq!(m.state(), PipelineState::Uninitialized);
    assert!(!m.needs_render());
    assert!(m.render(0.0, 0.0).is_err());
    m.init(4, 4).unwrap();
    assert_eq!(m.state(), PipelineState::Ready);
    assert_eq!(m.size(), (4, 4));
    let (a, b) = m.ping_pong_textures().unwrap();
    assert_ne!(a, b);
}

#[test]
fn no_layers_presents_the_media() {
    let mut m = manager(8);
    let report = m.render(0.0, 0.0).unwrap();
    assert_eq!(report, FrameReport::default());
    for t in m.read_surface().unwrap() {
        assert_eq!(t, [gray(), gray(), gray(), 1.0]);
    }
}

#[test]
fn hidden_layers_are_skipped() {
    let mut m = manager(8);
    m.sync_layers(&[layer("px", ShaderType::Pixelate).with_visible(false)])
        .unwrap();
    let report = m.render(0.0, 0.0).unwrap();
    assert_eq!(report.passes_run, 0);
    assert_eq!(m.device_stats().draws, 1);
}

#[test]
fn each_visible_pass_flips_the_pair() {
    let mut m = manager(8);
    let (first, second) = m.ping_pong_textures().unwrap();
    m.sync_layers(&[layer("a", ShaderType::Pixelate)]).unwrap();
    m.render(0.0, 0.0).unwrap();
    assert_eq!(m.ping_pong_textures(), Some((second, first)));

    m.sync_layers(&[layer("a", ShaderType::Pixelate), layer("b", ShaderType::Grain)])
        .unwrap();
    let report = m.render(0.0, 0.0).unwrap();
    assert_eq!(report.passes_run, 2);
    assert_eq!(m.ping_pong_textures(), Some((second, first)));
}

#[test]
fn sync_keeps_order_and_drops_duplicates() {
    let mut m = manager(4);
    m.sync_layers(&[
        layer("b", ShaderType::Noise),
        layer("a", ShaderType::Grain),
        layer("b", ShaderType::Halftone),
    ])
    .unwrap();
    assert_eq!(m.layer_ids(), vec!["b", "a"]);
    assert_eq!(m.pass("b").unwrap().shader_type(), ShaderType::Noise);

    m.sync_layers(&[layer("a", ShaderType::Grain), layer("b", ShaderType::Halftone)])
        .unwrap();
    assert_eq!(m.layer_ids(), vec!["a", "b"]);
    assert_eq!(m.pass("b").unwrap().shader_type(), ShaderType::Halftone);
    assert!(m.pass("c").is_none());
}

#[test]
fn surviving_passes_keep_their_targets() {
    let mut m = manager(8);
    let layers = [layer("glow", ShaderType::Bloom)];
    m.sync_layers(&layers).unwrap();
    m.render(0.0, 0.0).unwrap();
    let after_first = m.pool_stats();
    assert_eq!(after_first.live, 4);

    let tweaked = [layer("glow", ShaderType::Bloom)
        .with_opacity(0.5)
        .with_param(Param::float("intensity", 2.0))];
    m.sync_layers(&tweaked).unwrap();
    m.render(0.0, 0.0).unwrap();
    let after_second = m.pool_stats();
    assert_eq!(after_second.allocations, after_first.allocations);
    assert_eq!(after_second.live, 4);

    m.sync_layers(&[]).unwrap();
    assert_eq!(m.pool_stats().live, 2);
    assert_eq!(m.pool_stats().free, 2);
}

#[test]
fn failing_pass_is_skipped_and_the_rest_composites() {
    // Pair (2 x 512) + media (256) + one 4x4 bloom scratch (128); the second scratch fails.
    let device = CpuDevice::new(CpuDeviceOpts {
        max_texture_bytes: Some(1024 + 256 + 128),
    });
    let mut m = manager_with(device, 8);
    m.sync_layers(&[layer("glow", ShaderType::Bloom), layer("px", ShaderType::Pixelate)])
        .unwrap();
    let report = m.render(0.0, 0.0).unwrap();
    assert_eq!(report.passes_run, 1);
    assert_eq!(report.passes_failed, 1);
    for t in m.read_surface().unwrap() {
        assert!((t[0] - gray()).abs() < 1e-6);
    }
    let again = m.render(0.0, 0.0).unwrap();
    assert_eq!(again.passes_failed, 1);
}

#[test]
fn render_if_needed_skips_static_frames() {
    let mut m = manager(4);
    m.sync_layers(&[layer("px", ShaderType::Pixelate)]).unwrap();
    assert!(m.render_if_needed(0.0, 0.0).unwrap().is_some());
    assert!(m.render_if_needed(0.1, 0.1).unwrap().is_none());

    assert!(m.update_layer_params("px", &[Param::float("pixelSize", 2.0)]));
    assert!(m.render_if_needed(0.2, 0.1).unwrap().is_some());
    assert!(m.render_if_needed(0.3, 0.1).unwrap().is_none());

    assert!(!m.update_layer_params("nope", &[Param::float("pixelSize", 2.0)]));
    assert!(m.render_if_needed(0.4, 0.1).unwrap().is_none());

    m.set_background([1.0, 0.0, 0.0, 1.0]);
    assert!(m.render_if_needed(0.5, 0.1).unwrap().is_some());
}

#[test]
fn animated_layers_render_every_frame() {
    let mut m = manager(4);
    m.sync_layers(&[layer("grain", ShaderType::Grain)]).unwrap();
    for i in 0..3 {
        assert!(m.render_if_needed(i as f32, 0.016).unwrap().is_some());
    }
    m.update_layer_params("grain", &[Param::boolean("animated", false)]);
    m.render(3.0, 0.016).unwrap();
    assert!(!m.needs_render());
}

#[test]
fn resize_reallocates_once() {
    let mut m = manager(8);
    m.sync_layers(&[layer("glow", ShaderType::Bloom)]).unwrap();
    m.render(0.0, 0.0).unwrap();
    let created = m.device_stats().textures_created;

    m.resize(8, 8).unwrap();
    assert_eq!(m.device_stats().textures_created, created);

    m.resize(16, 8).unwrap();
    assert_eq!(m.size(), (16, 8));
    assert_eq!(m.device_mut().surface_size(), (16, 8));
    let (a, b) = m.ping_pong_textures().unwrap();
    assert_eq!(m.device_mut().texture_size(a), Some((16, 8)));
    assert_eq!(m.device_mut().texture_size(b), Some((16, 8)));
    let grown = m.device_stats().textures_created;
    assert!(grown > created);

    m.resize(16, 8).unwrap();
    m.render(0.0, 0.0).unwrap();
    assert_eq!(m.device_stats().textures_created, grown);
    assert_eq!(m.read_surface().unwrap().len(), 16 * 8);
}

#[test]
fn window_drags_do_not_grow_the_pool() {
    let mut m = manager(8);
    m.sync_layers(&[layer("blur", ShaderType::ProgressiveBlur)])
        .unwrap();
    m.render(0.0, 0.0).unwrap();
    let textures = m.device_stats().live_textures;
    for i in 0..50 {
        m.resize(9 + i, 6 + i).unwrap();
        m.render(0.0, 0.0).unwrap();
        let stats = m.pool_stats();
        assert_eq!((stats.live, stats.free), (3, 0), "after resize {i}");
    }
    assert_eq!(m.device_stats().live_textures, textures);
}

#[test]
fn fluid_fields_follow_resizes_without_leaking() {
    let mut m = manager(8);
    m.sync_layers(&[layer("fluid", ShaderType::Interactivity)])
        .unwrap();
    m.render(0.0, 1.0 / 60.0).unwrap();
    let textures = m.device_stats().live_textures;
    for i in 0..12 {
        m.resize(8 + 4 * i, 8 + 2 * i).unwrap();
        m.render(0.0, 1.0 / 60.0).unwrap();
    }
    m.resize(8, 8).unwrap();
    m.render(0.0, 1.0 / 60.0).unwrap();
    assert_eq!(m.pool_stats().free, 0);
    assert_eq!(m.device_stats().live_textures, textures);
}

#[test]
fn resize_before_init_initializes() {
    let mut m = PipelineManager::new(Box::new(CpuDevice::default()), small_opts()).unwrap();
    m.resize(0, 3).unwrap();
    assert_eq!(m.state(), PipelineState::Ready);
    assert_eq!(m.size(), (1, 3));
}

#[test]
fn pointer_calls_reach_interactivity_layers_only() {
    let mut m = manager(16);
    m.set_pointer_for_interactivity(0.5, 0.5, 0.1, 0.0, true);
    m.add_click_for_interactivity(0.5, 0.5);

    m.sync_layers(&[layer("fluid", ShaderType::Interactivity)]).unwrap();
    m.render(0.0, 1.0 / 60.0).unwrap();
    assert!(!m.needs_render());

    m.add_click_for_interactivity(0.5, 0.5);
    assert!(m.needs_render());
    let report = m.render(0.016, 1.0 / 60.0).unwrap();
    assert_eq!(report.passes_run, 1);
    assert!(m.needs_render());
}

#[test]
fn bad_image_bytes_keep_the_media() {
    let mut m = manager(4);
    assert!(!m.load_image_bytes(b"definitely not an image"));
    m.render(0.0, 0.0).unwrap();
    assert_eq!(m.read_surface().unwrap()[0][0], gray());
}

#[test]
fn dispose_frees_everything_and_is_idempotent() {
    let mut m = manager(8);
    m.sync_layers(&[layer("glow", ShaderType::Bloom), layer("ascii", ShaderType::Ascii)])
        .unwrap();
    m.render(0.0, 0.0).unwrap();
    assert!(m.device_stats().live_textures > 3);

    m.dispose();
    assert_eq!(m.state(), PipelineState::Disposed);
    assert_eq!(m.device_stats().live_textures, 0);
    assert_eq!(m.device_stats().texture_bytes, 0);
    assert!(m.layer_ids().is_empty());
    m.dispose();

    assert!(m.render(0.0, 0.0).is_err());
    assert!(m.sync_layers(&[]).is_err());
    assert!(m.init(4, 4).is_err());
    assert!(!m.load_image_bytes(&[]));
}
