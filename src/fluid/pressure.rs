//! Pressure Poisson solve for the projection step.
//!
//! Pressure lives at cell centres and velocity on the faces between them (texel `i` of the
//! velocity field holds the x velocity of its left face and the y velocity of its top face), so
//! divergence, the Jacobi Laplacian and the gradient are one compact operator. Wall faces carry no
//! normal flow, which gives the pressure a zero-flux boundary.
//!
//! Weighted Jacobi sweeps are the relaxation; they run as the smoother of multigrid V-cycles over
//! pooled half-size levels so a fixed sweep budget converges on any field size.

use crate::foundation::core::Extent;
use crate::foundation::error::StrataResult;
use crate::passes::RenderCtx;
use crate::render::device::TextureId;
use crate::render::ping_pong::PingPong;
use crate::render::target_pool::{RenderTarget, RenderTargetPool};
use crate::shader::ir::{Expr, max, mix, select, vec4};
use crate::shader::program::Program;
use crate::shader::uniforms::UniformBlock;

use super::sim::{FIELD_TARGETS, neighbor, run};

const OMEGA: f32 = 0.8;
const PRE_SWEEPS: u32 = 2;
const POST_SWEEPS: u32 = 2;
const COARSEST_SWEEPS: u32 = 16;
const MIN_LEVEL_SIDE: u32 = 2;

pub(crate) struct PressurePrograms {
    jacobi: Program,
    residual: Program,
    restrict: Program,
    prolong: Program,
}

impl PressurePrograms {
    pub(crate) fn all(&self) -> [&Program; 4] {
        [&self.jacobi, &self.residual, &self.restrict, &self.prolong]
    }
}

/// `(sum of in-field neighbours, neighbour count)` of the scalar in slot 0.
fn neighbourhood() -> (Expr, Expr) {
    let uv = Expr::uv();
    let t = Expr::texel_size(0);
    let inside = |outside: Expr| select(outside, 0.0, 1.0);
    let wl = inside((uv.x() - t.x()).lt(0.0));
    let wr = inside((uv.x() + t.x()).gt(1.0));
    let wu = inside((uv.y() - t.y()).lt(0.0));
    let wd = inside((uv.y() + t.y()).gt(1.0));
    let p = |dx: f32, dy: f32| neighbor(0, dx, dy).x();
    let sum = &wl * p(-1.0, 0.0) + &wr * p(1.0, 0.0) + &wu * p(0.0, -1.0) + &wd * p(0.0, 1.0);
    let n = max(wl + wr + wu + wd, 1.0);
    (sum, n)
}

pub(crate) fn compile(block: &UniformBlock) -> StrataResult<PressurePrograms> {
    let uv = Expr::uv();
    let scalar = |v: Expr| vec4(v, 0.0, 0.0, 1.0);

    // Inputs: estimate, right-hand side.
    let jacobi = {
        let (sum, n) = neighbourhood();
        let p = Expr::sample(0, &uv).x();
        let relaxed = (sum - Expr::sample(1, &uv).x()) / n;
        Program::compile("fluid-jacobi", &scalar(mix(p, relaxed, OMEGA)), block)?
    };

    let residual = {
        let (sum, n) = neighbourhood();
        let p = Expr::sample(0, &uv).x();
        let r = Expr::sample(1, &uv).x() - (sum - n * p);
        Program::compile("fluid-residual", &scalar(r), block)?
    };

    // A coarse texel centre sits between four fine centres, so one bilinear tap averages them;
    // the factor rescales the equation to the doubled spacing.
    let restrict = {
        let r = 4.0 * Expr::sample(0, &uv).x();
        Program::compile("fluid-restrict", &scalar(r), block)?
    };

    let prolong = {
        let e = Expr::sample(0, &uv).x() + Expr::sample(1, &uv).x();
        Program::compile("fluid-prolong", &scalar(e), block)?
    };

    Ok(PressurePrograms {
        jacobi,
        residual,
        restrict,
        prolong,
    })
}

/// Sizes of the coarse levels below a fine grid.
pub(crate) fn level_extents(fine: Extent) -> Vec<Extent> {
    let mut out = Vec::new();
    let mut e = fine;
    while e.width.min(e.height) > MIN_LEVEL_SIDE {
        e = Extent {
            width: e.width.div_ceil(2),
            height: e.height.div_ceil(2),
        };
        out.push(e);
    }
    out
}

struct Level {
    correction: PingPong,
    rhs: RenderTarget,
    residual: RenderTarget,
}

/// Pooled scratch of the solver: the fine residual plus every coarse level.
pub(crate) struct Hierarchy {
    residual: RenderTarget,
    levels: Vec<Level>,
}

impl Hierarchy {
    /// Number of pooled targets a hierarchy over `fine` holds.
    pub(crate) fn target_count(fine: Extent) -> usize {
        1 + 4 * level_extents(fine).len()
    }

    /// Acquire every target, pushing each onto `held` so a failure can return them all.
    pub(crate) fn acquire(
        ctx: &mut RenderCtx<'_>,
        fine: Extent,
        held: &mut Vec<RenderTarget>,
    ) -> StrataResult<Self> {
        let mut take = |ctx: &mut RenderCtx<'_>, e: Extent| -> StrataResult<RenderTarget> {
            let t = ctx
                .pool
                .acquire(&mut *ctx.device, e.width, e.height, FIELD_TARGETS)?;
            held.push(t);
            ctx.device.clear(t.texture, [0.0; 4])?;
            Ok(t)
        };
        let residual = take(ctx, fine)?;
        let mut levels = Vec::new();
        for e in level_extents(fine) {
            let a = take(ctx, e)?;
            let b = take(ctx, e)?;
            levels.push(Level {
                correction: PingPong::from_pair(a, b),
                rhs: take(ctx, e)?,
                residual: take(ctx, e)?,
            });
        }
        Ok(Self { residual, levels })
    }

    pub(crate) fn release(self, pool: &mut RenderTargetPool) {
        pool.release(self.residual);
        for level in self.levels {
            level.correction.release(pool);
            pool.release(level.rhs);
            pool.release(level.residual);
        }
    }
}

fn sweep(
    ctx: &mut RenderCtx<'_>,
    block: &UniformBlock,
    programs: &PressurePrograms,
    x: &mut PingPong,
    rhs: TextureId,
    count: u32,
) -> StrataResult<()> {
    for _ in 0..count {
        run(
            ctx,
            block,
            &programs.jacobi,
            &[x.read_texture(), rhs],
            x.write_texture(),
        )?;
        x.swap();
    }
    Ok(())
}

/// Relax `pressure` towards the solution of `laplacian(p) = divergence`. `iterations` is a fine
/// sweep budget: it buys `ceil(iterations / 4)` V-cycles, or plain sweeps when the field is too
/// small to coarsen.
pub(crate) fn solve(
    ctx: &mut RenderCtx<'_>,
    block: &UniformBlock,
    programs: &PressurePrograms,
    hierarchy: &mut Hierarchy,
    pressure: &mut PingPong,
    divergence: TextureId,
    iterations: u32,
) -> StrataResult<()> {
    if iterations == 0 {
        return Ok(());
    }
    if hierarchy.levels.is_empty() {
        return sweep(ctx, block, programs, pressure, divergence, iterations);
    }
    let cycles = iterations.div_ceil(PRE_SWEEPS + POST_SWEEPS);
    for _ in 0..cycles {
        v_cycle(ctx, block, programs, hierarchy, pressure, divergence)?;
    }
    Ok(())
}

fn v_cycle(
    ctx: &mut RenderCtx<'_>,
    block: &UniformBlock,
    programs: &PressurePrograms,
    hierarchy: &mut Hierarchy,
    pressure: &mut PingPong,
    divergence: TextureId,
) -> StrataResult<()> {
    sweep(ctx, block, programs, pressure, divergence, PRE_SWEEPS)?;
    let fine_residual = hierarchy.residual.texture;
    run(
        ctx,
        block,
        &programs.residual,
        &[pressure.read_texture(), divergence],
        fine_residual,
    )?;

    let levels = &mut hierarchy.levels;
    let coarsest = levels.len() - 1;
    let mut residual = fine_residual;
    for (i, level) in levels.iter_mut().enumerate() {
        run(ctx, block, &programs.restrict, &[residual], level.rhs.texture)?;
        ctx.device.clear(level.correction.read_texture(), [0.0; 4])?;
        let rhs = level.rhs.texture;
        if i == coarsest {
            sweep(ctx, block, programs, &mut level.correction, rhs, COARSEST_SWEEPS)?;
        } else {
            sweep(ctx, block, programs, &mut level.correction, rhs, PRE_SWEEPS)?;
            run(
                ctx,
                block,
                &programs.residual,
                &[level.correction.read_texture(), rhs],
                level.residual.texture,
            )?;
            residual = level.residual.texture;
        }
    }

    for i in (0..coarsest).rev() {
        let coarse = levels[i + 1].correction.read_texture();
        let level = &mut levels[i];
        let x = &mut level.correction;
        run(
            ctx,
            block,
            &programs.prolong,
            &[x.read_texture(), coarse],
            x.write_texture(),
        )?;
        x.swap();
        sweep(ctx, block, programs, x, level.rhs.texture, POST_SWEEPS)?;
    }

    let coarse = levels[0].correction.read_texture();
    run(
        ctx,
        block,
        &programs.prolong,
        &[pressure.read_texture(), coarse],
        pressure.write_texture(),
    )?;
    pressure.swap();
    sweep(ctx, block, programs, pressure, divergence, POST_SWEEPS)
}

#[cfg(test)]
#[path = "../../tests/unit/fluid/pressure.rs"]
mod tests;
