use super::*;
use crate::layers::model::ShaderType;

fn ready(width: u32, height: u32) -> Compositor {
    let mut c = Compositor::new(PipelineOpts::default());
    c.resize(width, height);
    assert_eq!(pollster::block_on(c.init(BackendKind::Cpu)), InitStatus::Ready);
    c
}

#[test]
fn calls_before_init_are_ignored() {
    let mut c = Compositor::new(PipelineOpts::default());
    assert_eq!(c.status(), InitStatus::Loading);
    c.render(0.0, 0.0);
    assert!(!c.render_if_needed(0.0, 0.0));
    c.add_click_for_interactivity(0.5, 0.5);
    c.set_pointer_for_interactivity(0.5, 0.5, 0.0, 0.0, true);
    assert!(c.set_media(&MediaImage::solid(2, 2, [0; 4])).is_err());
    assert_eq!(c.fps(), 0.0);
    assert!(c.manager().is_none());
}

#[test]
fn layers_and_size_given_early_apply_on_init() {
    let mut c = Compositor::new(PipelineOpts::default());
    c.resize(12, 6);
    c.sync_layers(&[LayerDescriptor::new("px", ShaderType::Pixelate)]);
    c.update_layer_params("px", &[Param::float("pixelSize", 3.0)]);
    assert_eq!(pollster::block_on(c.init(BackendKind::Cpu)), InitStatus::Ready);

    let m = c.manager().unwrap();
    assert_eq!(m.size(), (12, 6));
    assert_eq!(m.layer_ids(), vec!["px"]);
    assert_eq!(pollster::block_on(c.init(BackendKind::Cpu)), InitStatus::Ready);
}

#[cfg(not(feature = "gpu"))]
#[test]
fn gpu_without_the_feature_is_unsupported() {
    let mut c = Compositor::new(PipelineOpts::default());
    assert_eq!(pollster::block_on(c.init(BackendKind::Gpu)), InitStatus::Unsupported);
    assert!(c.last_error().is_none());
    c.render(0.0, 0.0);
}

#[test]
fn init_failure_reports_error_with_detail() {
    let mut opts = PipelineOpts::default();
    opts.pointer_noise_px = -1.0;
    let mut c = Compositor::new(opts);
    assert_eq!(pollster::block_on(c.init(BackendKind::Cpu)), InitStatus::Error);
    assert!(c.last_error().unwrap().contains("pointerNoisePx"));
}

#[test]
fn frames_feed_the_fps_counter() {
    let mut c = ready(4, 4);
    c.set_media(&MediaImage::solid(4, 4, [10, 20, 30, 255])).unwrap();
    for i in 0..30 {
        c.render(i as f64 / 30.0, 1.0 / 30.0);
    }
    assert_eq!(c.fps(), 30.0);
    assert_eq!(c.manager().unwrap().device_stats().presents, 30);
}

#[test]
fn render_if_needed_only_ticks_on_drawn_frames() {
    let mut c = ready(4, 4);
    assert!(c.render_if_needed(0.0, 0.0));
    assert!(!c.render_if_needed(0.1, 0.1));
    assert_eq!(c.fps(), 1.0);

    c.manager_mut().unwrap().set_fit(crate::FitMode::Contain);
    assert!(c.render_if_needed(0.2, 0.1));
    assert_eq!(c.fps(), 2.0);
}

#[test]
fn dispose_returns_to_loading() {
    let mut c = ready(4, 4);
    c.render(0.0, 0.0);
    c.dispose();
    assert_eq!(c.status(), InitStatus::Loading);
    assert!(c.manager().is_none());
    assert_eq!(c.fps(), 0.0);
    c.render(1.0, 0.0);
    c.dispose();
    assert_eq!(pollster::block_on(c.init(BackendKind::Cpu)), InitStatus::Ready);
}
