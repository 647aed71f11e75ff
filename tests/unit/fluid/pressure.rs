use super::*;
use crate::render::cpu::CpuDevice;
use crate::render::device::Device;
use crate::render::target_pool::TargetOptions;
use crate::shader::ir::vec4;

const SIDE: u32 = 64;

fn extent(width: u32, height: u32) -> Extent {
    Extent { width, height }
}

#[test]
fn levels_halve_down_to_the_smallest_side() {
    assert_eq!(
        level_extents(extent(64, 32)),
        vec![extent(32, 16), extent(16, 8), extent(8, 4), extent(4, 2)]
    );
    assert_eq!(
        level_extents(extent(15, 9)),
        vec![extent(8, 5), extent(4, 3), extent(2, 2)]
    );
    assert!(level_extents(extent(2, 40)).is_empty());
    assert_eq!(Hierarchy::target_count(extent(64, 32)), 17);
    assert_eq!(Hierarchy::target_count(extent(2, 2)), 1);
}

/// `|| rhs - laplacian(p) ||` with the same zero-flux walls as the shaders.
fn residual_norm(p: &[[f32; 4]], rhs: &[[f32; 4]], w: usize, h: usize) -> f64 {
    let at = |x: usize, y: usize| f64::from(p[y * w + x][0]);
    let mut total = 0.0;
    for y in 0..h {
        for x in 0..w {
            let c = at(x, y);
            let mut lap = 0.0;
            if x > 0 {
                lap += at(x - 1, y) - c;
            }
            if x + 1 < w {
                lap += at(x + 1, y) - c;
            }
            if y > 0 {
                lap += at(x, y - 1) - c;
            }
            if y + 1 < h {
                lap += at(x, y + 1) - c;
            }
            let r = f64::from(rhs[y * w + x][0]) - lap;
            total += r * r;
        }
    }
    total.sqrt()
}

struct Rig {
    device: CpuDevice,
    pool: RenderTargetPool,
}

impl Rig {
    fn new() -> Self {
        Self {
            device: CpuDevice::default(),
            pool: RenderTargetPool::new(),
        }
    }

    fn ctx(&mut self) -> RenderCtx<'_> {
        RenderCtx::new(&mut self.device, &mut self.pool, TargetOptions::default())
    }
}

/// A zero-sum source with most of its weight in the slowest modes.
fn smooth_source(rig: &mut Rig, block: &UniformBlock) -> TextureId {
    let uv = Expr::uv();
    let source =
        (uv.x() * std::f32::consts::TAU).sin() * (uv.y() * std::f32::consts::PI).cos();
    let program = Program::compile("source", &vec4(source, 0.0, 0.0, 1.0), block).unwrap();
    let mut ctx = rig.ctx();
    let rhs = ctx
        .pool
        .acquire(&mut *ctx.device, SIDE, SIDE, FIELD_TARGETS)
        .unwrap()
        .texture;
    run(&mut ctx, block, &program, &[], rhs).unwrap();
    rhs
}

fn zeroed_pressure(rig: &mut Rig) -> PingPong {
    let pressure =
        PingPong::acquire(&mut rig.device, &mut rig.pool, SIDE, SIDE, FIELD_TARGETS).unwrap();
    pressure.clear(&mut rig.device, [0.0; 4]).unwrap();
    pressure
}

#[test]
fn twenty_sweeps_solve_a_smooth_field() {
    let mut rig = Rig::new();
    let block = UniformBlock::new();
    let programs = compile(&block).unwrap();
    let rhs = smooth_source(&mut rig, &block);
    let mut pressure = zeroed_pressure(&mut rig);
    let mut held = Vec::new();
    let mut hierarchy = Hierarchy::acquire(&mut rig.ctx(), extent(SIDE, SIDE), &mut held).unwrap();

    let source = rig.device.read_pixels(rhs).unwrap();
    let zero = vec![[0.0f32; 4]; source.len()];
    let before = residual_norm(&zero, &source, SIDE as usize, SIDE as usize);

    let mut ctx = rig.ctx();
    solve(&mut ctx, &block, &programs, &mut hierarchy, &mut pressure, rhs, 20).unwrap();
    let p = rig.device.read_pixels(pressure.read_texture()).unwrap();
    let after = residual_norm(&p, &source, SIDE as usize, SIDE as usize);
    assert!(before > 1.0);
    assert!(after < before * 1e-2, "before {before}, after {after}");
}

#[test]
fn plain_sweeps_barely_touch_the_slow_modes() {
    let mut rig = Rig::new();
    let block = UniformBlock::new();
    let programs = compile(&block).unwrap();
    let rhs = smooth_source(&mut rig, &block);
    let mut pressure = zeroed_pressure(&mut rig);

    let source = rig.device.read_pixels(rhs).unwrap();
    let zero = vec![[0.0f32; 4]; source.len()];
    let before = residual_norm(&zero, &source, SIDE as usize, SIDE as usize);

    sweep(&mut rig.ctx(), &block, &programs, &mut pressure, rhs, 20).unwrap();
    let p = rig.device.read_pixels(pressure.read_texture()).unwrap();
    let after = residual_norm(&p, &source, SIDE as usize, SIDE as usize);
    assert!(after > before * 0.5, "before {before}, after {after}");
}

#[test]
fn zero_iterations_leave_the_estimate_alone() {
    let mut rig = Rig::new();
    let block = UniformBlock::new();
    let programs = compile(&block).unwrap();
    let rhs = smooth_source(&mut rig, &block);
    let mut pressure = zeroed_pressure(&mut rig);
    let mut held = Vec::new();
    let mut hierarchy = Hierarchy::acquire(&mut rig.ctx(), extent(SIDE, SIDE), &mut held).unwrap();
    let draws = rig.device.stats().draws;

    solve(&mut rig.ctx(), &block, &programs, &mut hierarchy, &mut pressure, rhs, 0).unwrap();
    assert_eq!(rig.device.stats().draws, draws);
}

#[test]
fn hierarchy_returns_every_target() {
    let mut rig = Rig::new();
    let mut held = Vec::new();
    let hierarchy = Hierarchy::acquire(&mut rig.ctx(), extent(32, 16), &mut held).unwrap();
    assert_eq!(held.len(), Hierarchy::target_count(extent(32, 16)));
    assert_eq!(rig.pool.stats().live, held.len());
    hierarchy.release(&mut rig.pool);
    assert_eq!(rig.pool.stats().live, 0);
}
