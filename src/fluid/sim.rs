//! Grid fluid solver: stable-fluids style velocity projection with vorticity confinement.
//!
//! Velocity is stored in `.xy` in sim texels per second, uv space (y grows downward), on the
//! faces of each cell (see [`super::pressure`]). Every stage is a fullscreen program over pooled
//! `Rgba16Float` targets; a frame runs them in this order: splats, curl, vorticity, divergence,
//! pressure decay, the pressure solve, gradient subtraction, advection (velocity, then dye) and
//! the pointer displacement field.

use crate::fluid::config::FluidConfig;
use crate::fluid::pointer::{Splat, SplatKind};
use crate::fluid::pressure::{self, Hierarchy, PressurePrograms};
use crate::foundation::core::Extent;
use crate::foundation::error::{StrataError, StrataResult};
use crate::passes::RenderCtx;
use crate::render::device::{
    Device, DrawCall, TextureFilter, TextureFormat, TextureId,
};
use crate::render::ping_pong::PingPong;
use crate::render::target_pool::{RenderTarget, RenderTargetPool, TargetOptions};
use crate::shader::ir::{
    Expr, Ty, clamp, dot, join, length, max, normalize, select, vec2, vec4,
};
use crate::shader::program::Program;
use crate::shader::uniforms::{UniformBlock, UniformHandle};

pub(super) const FIELD_TARGETS: TargetOptions = TargetOptions {
    format: TextureFormat::Rgba16Float,
    min_filter: TextureFilter::Linear,
    mag_filter: TextureFilter::Linear,
};

/// Per-component speed clamp, in sim texels per second.
pub(crate) const VELOCITY_LIMIT: f32 = 8192.0;

/// `1 / max(|p| exp(-|p|^2 / r) / sqrt(r))`: scales a click burst so its peak speed is the force.
const BURST_PEAK: f32 = 2.331_644;

/// Per-splat styling coming from the layer params.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SplatStyle {
    /// Dye color injected by splats.
    pub color: [f32; 3],
    /// Multiplier on the configured splat and click forces.
    pub force: f32,
    /// Multiplier on the configured splat radius.
    pub radius: f32,
}

impl Default for SplatStyle {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            force: 1.0,
            radius: 1.0,
        }
    }
}

/// Everything one simulation step consumes.
#[derive(Clone, Copy, Debug)]
pub struct StepInput<'a> {
    /// Step length in seconds, clamped to the configured maximum.
    pub dt: f32,
    /// Impulses to apply before advection.
    pub splats: &'a [Splat],
    /// Splat styling for this step.
    pub style: SplatStyle,
    /// Per-second dye dissipation rate.
    pub dye_dissipation: f32,
    /// Pointer position for the displacement field.
    pub pointer: [f32; 2],
    /// `0..=1` strength of the displacement field around the pointer.
    pub gate: f32,
    /// Radius of the displacement field, as a fraction of the short side.
    pub displace_radius: f32,
}

struct SimUniforms {
    dt: UniformHandle,
    aspect: UniformHandle,
    point: UniformHandle,
    value: UniformHandle,
    radius: UniformHandle,
    dissipation: UniformHandle,
    curl: UniformHandle,
    pressure_decay: UniformHandle,
    pointer: UniformHandle,
    gate: UniformHandle,
    displace_radius: UniformHandle,
}

impl SimUniforms {
    fn declare(block: &mut UniformBlock, config: &FluidConfig) -> Self {
        let scalar = |v: f32| [v, 0.0, 0.0, 0.0];
        Self {
            dt: block.declare("dt", Ty::F32, scalar(0.0)),
            aspect: block.declare("aspect", Ty::F32, scalar(1.0)),
            point: block.declare("point", Ty::Vec2, [0.5, 0.5, 0.0, 0.0]),
            value: block.declare("splat_value", Ty::Vec3, [0.0; 4]),
            radius: block.declare("radius", Ty::F32, scalar(config.splat_radius / 100.0)),
            dissipation: block.declare("dissipation", Ty::F32, scalar(0.0)),
            curl: block.declare("curl_strength", Ty::F32, scalar(config.curl_strength)),
            pressure_decay: block.declare(
                "pressure_decay",
                Ty::F32,
                scalar(config.pressure_decay),
            ),
            pointer: block.declare("pointer", Ty::Vec2, [0.5, 0.5, 0.0, 0.0]),
            gate: block.declare("pointer_gate", Ty::F32, scalar(0.0)),
            displace_radius: block.declare("displace_radius", Ty::F32, scalar(0.15)),
        }
    }
}

struct SimPrograms {
    splat: Program,
    splat_radial: Program,
    curl: Program,
    vorticity: Program,
    divergence: Program,
    pressure_decay: Program,
    pressure: PressurePrograms,
    gradient: Program,
    advect: Program,
    displacement: Program,
}

impl SimPrograms {
    fn all(&self) -> Vec<&Program> {
        let mut out = vec![
            &self.splat,
            &self.splat_radial,
            &self.curl,
            &self.vorticity,
            &self.divergence,
            &self.pressure_decay,
        ];
        out.extend(self.pressure.all());
        out.extend([&self.gradient, &self.advect, &self.displacement]);
        out
    }
}

fn offset(slot: u8, dx: f32, dy: f32) -> Expr {
    Expr::uv() + Expr::texel_size(slot) * vec2(dx, dy)
}

pub(super) fn neighbor(slot: u8, dx: f32, dy: f32) -> Expr {
    Expr::sample(slot, offset(slot, dx, dy))
}

/// Aspect-corrected offset of `at` from a point uniform.
fn from_point(at: Expr, block: &UniformBlock, point: UniformHandle, aspect: &Expr) -> Expr {
    (at - block.expr(point)) * vec2(aspect, 1.0)
}

fn compile(block: &UniformBlock, u: &SimUniforms) -> StrataResult<SimPrograms> {
    let uv = Expr::uv();
    let dt = block.expr(u.dt);
    let aspect = block.expr(u.aspect);

    let (splat, splat_radial) = {
        let r = max(block.expr(u.radius), 1e-6);
        let gauss = |p: &Expr| (-dot(p, p) / &r).exp();
        let p = from_point(uv.clone(), block, u.point, &aspect);
        let base = Expr::sample(0, &uv);
        let value = block.expr(u.value);
        let linear = join([base.rgb() + &value * gauss(&p), base.w()]);
        // Gradient of the gaussian, taken on each component's face so projection removes it
        // whole; peak speed is `value.x`.
        let t = Expr::texel_size(0);
        let pu = from_point(&uv - &t * vec2(0.5, 0.0), block, u.point, &aspect);
        let pv = from_point(&uv - &t * vec2(0.0, 0.5), block, u.point, &aspect);
        let scale = value.x() * BURST_PEAK / r.sqrt();
        let radial = join([
            base.x() + pu.x() * gauss(&pu) * &scale,
            base.y() + pv.y() * gauss(&pv) * &scale,
            base.z(),
            base.w(),
        ]);
        (
            Program::compile("fluid-splat", &linear, block)?,
            Program::compile("fluid-splat-radial", &radial, block)?,
        )
    };

    // Circulation around the top-left corner of the cell; zero for any projected gradient.
    let curl = {
        let c = Expr::sample(0, &uv);
        let (l, up) = (neighbor(0, -1.0, 0.0), neighbor(0, 0.0, -1.0));
        let w = (c.y() - l.y()) - (c.x() - up.x());
        Program::compile("fluid-curl", &vec4(w, 0.0, 0.0, 1.0), block)?
    };

    let vorticity = {
        let w = |dx: f32, dy: f32| neighbor(1, dx, dy).x();
        let c = Expr::sample(1, &uv).x();
        let grad = 0.5
            * vec2(
                w(1.0, 0.0).abs() - w(-1.0, 0.0).abs(),
                w(0.0, 1.0).abs() - w(0.0, -1.0).abs(),
            );
        let n = &grad / (length(&grad) + 1e-4);
        let force = vec2(n.y(), -n.x()) * block.expr(u.curl) * &c;
        let vel = clamp(
            Expr::sample(0, &uv).xy() + force * &dt,
            -VELOCITY_LIMIT,
            VELOCITY_LIMIT,
        );
        Program::compile("fluid-vorticity", &vec4(vel.x(), vel.y(), 0.0, 1.0), block)?
    };

    // Central difference over the cell's faces. Free-slip walls: a wall face is the mean of the
    // edge value and its mirrored negation, so it carries no normal flow.
    let divergence = {
        let t = Expr::texel_size(0);
        let c = Expr::sample(0, &uv);
        let l = select((uv.x() - t.x()).lt(0.0), 0.0, c.x());
        let r = select((uv.x() + t.x()).gt(1.0), 0.0, neighbor(0, 1.0, 0.0).x());
        let up = select((uv.y() - t.y()).lt(0.0), 0.0, c.y());
        let down = select((uv.y() + t.y()).gt(1.0), 0.0, neighbor(0, 0.0, 1.0).y());
        let div = (r - l) + (down - up);
        Program::compile("fluid-divergence", &vec4(div, 0.0, 0.0, 1.0), block)?
    };

    let pressure_decay = {
        let p = Expr::sample(0, &uv).x() * block.expr(u.pressure_decay);
        Program::compile("fluid-pressure-decay", &vec4(p, 0.0, 0.0, 1.0), block)?
    };

    let pressure = pressure::compile(block)?;

    // Face velocity minus the pressure difference across the face; wall faces stay closed.
    let gradient = {
        let t = Expr::texel_size(0);
        let p = Expr::sample(0, &uv).x();
        let vel = Expr::sample(1, &uv).xy();
        let u = select(
            (uv.x() - t.x()).lt(0.0),
            0.0,
            vel.x() - (&p - neighbor(0, -1.0, 0.0).x()),
        );
        let v = select(
            (uv.y() - t.y()).lt(0.0),
            0.0,
            vel.y() - (&p - neighbor(0, 0.0, -1.0).x()),
        );
        Program::compile("fluid-gradient", &vec4(u, v, 0.0, 1.0), block)?
    };

    let advect = {
        // Face velocities averaged to the sample point.
        let t = Expr::texel_size(0);
        let vel = vec2(
            Expr::sample(0, &uv + &t * vec2(0.5, 0.0)).x(),
            Expr::sample(0, &uv + &t * vec2(0.0, 0.5)).y(),
        );
        let back = &uv - &dt * vel * &t;
        let decay = 1.0 + block.expr(u.dissipation) * &dt;
        let moved = Expr::sample(1, back).rgb() / max(decay, 1e-4);
        Program::compile("fluid-advect", &join([moved, Expr::lit(1.0)]), block)?
    };

    let displacement = {
        let p = from_point(uv.clone(), block, u.pointer, &aspect);
        let r = block.expr(u.displace_radius);
        let falloff = (-dot(&p, &p) / max(&r * &r, 1e-6)).exp() * block.expr(u.gate);
        let dir = normalize(&p);
        let dir_uv = vec2(dir.x() / max(&aspect, 1e-4), dir.y());
        Program::compile(
            "fluid-displacement",
            &join([dir_uv * &falloff, falloff, Expr::lit(1.0)]),
            block,
        )?
    };

    Ok(SimPrograms {
        splat,
        splat_radial,
        curl,
        vorticity,
        divergence,
        pressure_decay,
        pressure,
        gradient,
        advect,
        displacement,
    })
}

struct Fields {
    viewport: (u32, u32),
    sim: Extent,
    dye_extent: Extent,
    velocity: PingPong,
    dye: PingPong,
    pressure: PingPong,
    divergence: RenderTarget,
    curl: RenderTarget,
    displacement: RenderTarget,
    hierarchy: Hierarchy,
}

impl Fields {
    fn acquire(
        ctx: &mut RenderCtx<'_>,
        viewport: (u32, u32),
        sim: Extent,
        dye_extent: Extent,
    ) -> StrataResult<Self> {
        let sizes = [sim, sim, dye_extent, dye_extent, sim, sim, sim, sim, sim];
        let mut held = Vec::with_capacity(sizes.len() + Hierarchy::target_count(sim));
        let mut acquire_all = |ctx: &mut RenderCtx<'_>| -> StrataResult<Hierarchy> {
            for e in sizes {
                let t = ctx
                    .pool
                    .acquire(&mut *ctx.device, e.width, e.height, FIELD_TARGETS)?;
                held.push(t);
                ctx.device.clear(t.texture, [0.0; 4])?;
            }
            Hierarchy::acquire(ctx, sim, &mut held)
        };
        let hierarchy = match acquire_all(ctx) {
            Ok(h) => h,
            Err(e) => {
                for t in held {
                    ctx.pool.release(t);
                }
                return Err(e);
            }
        };
        held.truncate(sizes.len());
        let [v0, v1, d0, d1, p0, p1, divergence, curl, displacement]: [RenderTarget; 9] = held
            .try_into()
            .map_err(|_| StrataError::state("fluid field allocation count mismatch"))?;
        Ok(Self {
            viewport,
            sim,
            dye_extent,
            velocity: PingPong::from_pair(v0, v1),
            dye: PingPong::from_pair(d0, d1),
            pressure: PingPong::from_pair(p0, p1),
            divergence,
            curl,
            displacement,
            hierarchy,
        })
    }

    fn release(self, pool: &mut RenderTargetPool) {
        self.velocity.release(pool);
        self.dye.release(pool);
        self.pressure.release(pool);
        pool.release(self.divergence);
        pool.release(self.curl);
        pool.release(self.displacement);
        self.hierarchy.release(pool);
    }
}

pub(super) fn run(
    ctx: &mut RenderCtx<'_>,
    block: &UniformBlock,
    program: &Program,
    inputs: &[TextureId],
    output: TextureId,
) -> StrataResult<()> {
    let uniforms = block.values();
    ctx.device.draw(&DrawCall {
        program,
        uniforms: &uniforms,
        inputs,
        output,
        time: 0.0,
        label: program.label(),
    })
}

/// Pressure-projected fluid over pooled GPU fields sized from the viewport.
pub struct FluidSim {
    config: FluidConfig,
    block: UniformBlock,
    u: SimUniforms,
    programs: Option<SimPrograms>,
    fields: Option<Fields>,
}

impl FluidSim {
    /// A solver with no programs or fields yet.
    pub fn new(config: FluidConfig) -> Self {
        let mut block = UniformBlock::new();
        let u = SimUniforms::declare(&mut block, &config);
        Self {
            config,
            block,
            u,
            programs: None,
            fields: None,
        }
    }

    /// Solver configuration.
    pub fn config(&self) -> &FluidConfig {
        &self.config
    }

    /// Compile the solver programs.
    pub fn build(&mut self) -> StrataResult<()> {
        self.programs = Some(compile(&self.block, &self.u)?);
        Ok(())
    }

    /// Whether [`build`](Self::build) has succeeded.
    pub fn is_built(&self) -> bool {
        self.programs.is_some()
    }

    /// Every compiled solver program; empty before a build.
    pub fn programs(&self) -> Vec<&Program> {
        self.programs
            .as_ref()
            .map(SimPrograms::all)
            .unwrap_or_default()
    }

    /// Sizes of the velocity and dye fields, once allocated.
    pub fn field_sizes(&self) -> Option<(Extent, Extent)> {
        self.fields.as_ref().map(|f| (f.sim, f.dye_extent))
    }

    /// Current dye field.
    pub fn dye_texture(&self) -> Option<TextureId> {
        self.fields.as_ref().map(|f| f.dye.read_texture())
    }

    /// Current velocity field.
    pub fn velocity_texture(&self) -> Option<TextureId> {
        self.fields.as_ref().map(|f| f.velocity.read_texture())
    }

    /// Displacement field derived from velocity.
    pub fn displacement_texture(&self) -> Option<TextureId> {
        self.fields.as_ref().map(|f| f.displacement.texture)
    }

    /// Allocate (or reallocate, cleared) the fields for a viewport. No-op when it is unchanged.
    pub fn ensure(&mut self, ctx: &mut RenderCtx<'_>, width: u32, height: u32) -> StrataResult<()> {
        let viewport = (width.max(1), height.max(1));
        if self.fields.as_ref().is_some_and(|f| f.viewport == viewport) {
            return Ok(());
        }
        if let Some(old) = self.fields.take() {
            old.release(ctx.pool);
        }
        let extent = Extent {
            width: viewport.0,
            height: viewport.1,
        };
        let sim = extent.fit_short_side(self.config.sim_resolution);
        let dye = extent.fit_short_side(self.config.dye_resolution);
        self.fields = Some(Fields::acquire(ctx, viewport, sim, dye)?);
        self.block.set_f32(self.u.aspect, extent.aspect());
        tracing::debug!(
            sim_w = sim.width,
            sim_h = sim.height,
            dye_w = dye.width,
            dye_h = dye.height,
            "fluid fields allocated"
        );
        Ok(())
    }

    fn parts(&mut self) -> StrataResult<(&UniformBlock, &SimPrograms, &mut Fields)> {
        let programs = self
            .programs
            .as_ref()
            .ok_or_else(|| StrataError::state("fluid programs are not built"))?;
        let fields = self
            .fields
            .as_mut()
            .ok_or_else(|| StrataError::state("fluid fields are not allocated"))?;
        Ok((&self.block, programs, fields))
    }

    pub(crate) fn set_dt(&mut self, dt: f32) {
        self.block.set_f32(self.u.dt, dt);
    }

    /// Radius uniform of a splat: percent of the field, widened along the long axis.
    fn splat_radius(&self, multiplier: f32) -> f32 {
        let aspect = self.block.get(self.u.aspect)[0];
        let mut r = self.config.splat_radius / 100.0 * multiplier;
        if aspect > 1.0 {
            r *= aspect;
        }
        r.max(1e-6)
    }

    pub(crate) fn splat(
        &mut self,
        ctx: &mut RenderCtx<'_>,
        splat: &Splat,
        style: &SplatStyle,
    ) -> StrataResult<()> {
        let radius = self.splat_radius(style.radius);
        let u = &self.u;
        self.block.set(u.point, [splat.u, splat.v, 0.0, 0.0]);
        self.block.set_f32(u.radius, radius);
        let (velocity, radial) = match splat.kind {
            SplatKind::Move => {
                let f = self.config.splat_force * style.force;
                ([splat.du * f, splat.dv * f, 0.0, 0.0], false)
            }
            SplatKind::Click => ([self.config.click_force * style.force, 0.0, 0.0, 0.0], true),
        };
        let dye = style.color.map(|c| c * self.config.dye_amount);
        let value = self.u.value;

        self.block.set(value, velocity);
        {
            let (block, programs, fields) = self.parts()?;
            let program = if radial {
                &programs.splat_radial
            } else {
                &programs.splat
            };
            let v = &mut fields.velocity;
            run(ctx, block, program, &[v.read_texture()], v.write_texture())?;
            v.swap();
        }

        self.block.set(value, [dye[0], dye[1], dye[2], 0.0]);
        let (block, programs, fields) = self.parts()?;
        let d = &mut fields.dye;
        run(ctx, block, &programs.splat, &[d.read_texture()], d.write_texture())?;
        d.swap();
        Ok(())
    }

    pub(crate) fn curl(&mut self, ctx: &mut RenderCtx<'_>) -> StrataResult<()> {
        let (block, programs, fields) = self.parts()?;
        run(
            ctx,
            block,
            &programs.curl,
            &[fields.velocity.read_texture()],
            fields.curl.texture,
        )
    }

    pub(crate) fn vorticity(&mut self, ctx: &mut RenderCtx<'_>) -> StrataResult<()> {
        let (block, programs, fields) = self.parts()?;
        let v = &mut fields.velocity;
        run(
            ctx,
            block,
            &programs.vorticity,
            &[v.read_texture(), fields.curl.texture],
            v.write_texture(),
        )?;
        v.swap();
        Ok(())
    }

    pub(crate) fn divergence(&mut self, ctx: &mut RenderCtx<'_>) -> StrataResult<()> {
        let (block, programs, fields) = self.parts()?;
        run(
            ctx,
            block,
            &programs.divergence,
            &[fields.velocity.read_texture()],
            fields.divergence.texture,
        )
    }

    /// Scale last frame's pressure by the decay factor as the solver's starting guess.
    pub(crate) fn decay_pressure(&mut self, ctx: &mut RenderCtx<'_>) -> StrataResult<()> {
        let (block, programs, fields) = self.parts()?;
        let p = &mut fields.pressure;
        run(
            ctx,
            block,
            &programs.pressure_decay,
            &[p.read_texture()],
            p.write_texture(),
        )?;
        p.swap();
        Ok(())
    }

    pub(crate) fn solve_pressure(&mut self, ctx: &mut RenderCtx<'_>) -> StrataResult<()> {
        let iterations = self.config.pressure_iterations;
        let (block, programs, fields) = self.parts()?;
        pressure::solve(
            ctx,
            block,
            &programs.pressure,
            &mut fields.hierarchy,
            &mut fields.pressure,
            fields.divergence.texture,
            iterations,
        )
    }

    pub(crate) fn subtract_gradient(&mut self, ctx: &mut RenderCtx<'_>) -> StrataResult<()> {
        let (block, programs, fields) = self.parts()?;
        let v = &mut fields.velocity;
        run(
            ctx,
            block,
            &programs.gradient,
            &[fields.pressure.read_texture(), v.read_texture()],
            v.write_texture(),
        )?;
        v.swap();
        Ok(())
    }

    pub(crate) fn advect(
        &mut self,
        ctx: &mut RenderCtx<'_>,
        dye_dissipation: f32,
    ) -> StrataResult<()> {
        self.block
            .set_f32(self.u.dissipation, self.config.velocity_dissipation);
        {
            let (block, programs, fields) = self.parts()?;
            let v = &mut fields.velocity;
            let src = v.read_texture();
            run(ctx, block, &programs.advect, &[src, src], v.write_texture())?;
            v.swap();
        }
        self.block.set_f32(self.u.dissipation, dye_dissipation.max(0.0));
        let (block, programs, fields) = self.parts()?;
        let d = &mut fields.dye;
        run(
            ctx,
            block,
            &programs.advect,
            &[fields.velocity.read_texture(), d.read_texture()],
            d.write_texture(),
        )?;
        d.swap();
        Ok(())
    }

    pub(crate) fn displacement(
        &mut self,
        ctx: &mut RenderCtx<'_>,
        pointer: [f32; 2],
        gate: f32,
        radius: f32,
    ) -> StrataResult<()> {
        self.block
            .set(self.u.pointer, [pointer[0], pointer[1], 0.0, 0.0]);
        self.block.set_f32(self.u.gate, gate.clamp(0.0, 1.0));
        self.block.set_f32(self.u.displace_radius, radius.max(1e-3));
        let (block, programs, fields) = self.parts()?;
        run(
            ctx,
            block,
            &programs.displacement,
            &[],
            fields.displacement.texture,
        )
    }

    /// One full frame of the solver.
    pub fn step(&mut self, ctx: &mut RenderCtx<'_>, input: &StepInput<'_>) -> StrataResult<()> {
        self.set_dt(input.dt.clamp(0.0, self.config.max_dt));
        for splat in input.splats {
            self.splat(ctx, splat, &input.style)?;
        }
        self.curl(ctx)?;
        self.vorticity(ctx)?;
        self.divergence(ctx)?;
        self.decay_pressure(ctx)?;
        self.solve_pressure(ctx)?;
        self.subtract_gradient(ctx)?;
        self.advect(ctx, input.dye_dissipation)?;
        self.displacement(ctx, input.pointer, input.gate, input.displace_radius)
    }

    /// Zero every field without reallocating.
    pub fn clear(&mut self, device: &mut dyn Device) -> StrataResult<()> {
        let Some(f) = &self.fields else {
            return Ok(());
        };
        f.velocity.clear(device, [0.0; 4])?;
        f.dye.clear(device, [0.0; 4])?;
        f.pressure.clear(device, [0.0; 4])?;
        for t in [f.divergence, f.curl, f.displacement] {
            device.clear(t.texture, [0.0; 4])?;
        }
        Ok(())
    }

    /// Mean absolute divergence of the face velocity field (closed walls), read back from the
    /// device.
    pub fn measure_divergence(&self, device: &mut dyn Device) -> StrataResult<f32> {
        let f = self
            .fields
            .as_ref()
            .ok_or_else(|| StrataError::state("fluid fields are not allocated"))?;
        let (w, h) = (f.sim.width as usize, f.sim.height as usize);
        let vel = device.read_pixels(f.velocity.read_texture())?;
        let at = |x: usize, y: usize| vel[y * w + x];
        let mut total = 0.0f64;
        for y in 0..h {
            for x in 0..w {
                let c = at(x, y);
                let l = if x == 0 { 0.0 } else { c[0] };
                let r = if x + 1 == w { 0.0 } else { at(x + 1, y)[0] };
                let up = if y == 0 { 0.0 } else { c[1] };
                let down = if y + 1 == h { 0.0 } else { at(x, y + 1)[1] };
                total += f64::from(((r - l) + (down - up)).abs());
            }
        }
        Ok((total / (w * h) as f64) as f32)
    }

    /// Largest dye component currently in the field.
    pub fn dye_peak(&self, device: &mut dyn Device) -> StrataResult<f32> {
        let texels = self.read_dye(device)?;
        Ok(texels
            .iter()
            .flat_map(|t| t[..3].iter().copied())
            .fold(0.0f32, f32::max))
    }

    /// Sum of squared dye components.
    pub fn dye_energy(&self, device: &mut dyn Device) -> StrataResult<f64> {
        let texels = self.read_dye(device)?;
        Ok(texels
            .iter()
            .flat_map(|t| t[..3].iter())
            .map(|&c| f64::from(c) * f64::from(c))
            .sum())
    }

    fn read_dye(&self, device: &mut dyn Device) -> StrataResult<Vec<[f32; 4]>> {
        let f = self
            .fields
            .as_ref()
            .ok_or_else(|| StrataError::state("fluid fields are not allocated"))?;
        device.read_pixels(f.dye.read_texture())
    }

    /// Return every field to the pool.
    pub fn release(&mut self, ctx: &mut RenderCtx<'_>) {
        if let Some(f) = self.fields.take() {
            f.release(ctx.pool);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/fluid/sim.rs"]
mod tests;
