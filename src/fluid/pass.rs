use crate::fluid::config::FluidConfig;
use crate::fluid::pointer::{Interactivity, PointerInput, Splat, SplatKind};
use crate::fluid::sim::{FluidSim, SplatStyle, StepInput, VELOCITY_LIMIT};
use crate::foundation::error::StrataResult;
use crate::layers::model::ShaderType;
use crate::layers::param::{Param, ParamSpec};
use crate::passes::compose::Compose;
use crate::passes::params::ParamState;
use crate::passes::{CompositeSettings, Pass, RenderCtx};
use crate::render::device::{DrawCall, TextureId};
use crate::shader::ir::{Expr, join, luminance, mix};
use crate::shader::program::Program;

const MODES: &[&str] = &[
    "trail",
    "trail-source",
    "tint",
    "displace",
    "repel",
    "attract",
    "glow",
];

/// How the simulated fields reach the picture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FluidMode {
    /// Dye added on top of the input.
    Trail,
    /// Dye replaces the input.
    TrailSource,
    /// Input tinted toward `color` where dye is dense.
    Tint,
    /// Input sampled through the velocity field.
    Displace,
    /// Input pushed away from the pointer.
    Repel,
    /// Input pulled toward the pointer.
    Attract,
    /// Legacy preset value; renders the input unchanged.
    Glow,
}

impl FluidMode {
    /// Mode for a `mode` choice index; unknown indices fall back to [`FluidMode::Trail`].
    pub fn from_index(index: u32) -> Self {
        match index {
            1 => Self::TrailSource,
            2 => Self::Tint,
            3 => Self::Displace,
            4 => Self::Repel,
            5 => Self::Attract,
            6 => Self::Glow,
            _ => Self::Trail,
        }
    }
}

/// Pointer gate decay rate once the pointer is released, per second.
const GATE_FALLOFF: f32 = 6.0;
/// Pointer speed, in pixels per event, that opens the displacement gate fully.
const GATE_FULL_SPEED_PX: f32 = 20.0;

/// Pointer-driven fluid layer: runs the solver every frame and routes its fields through the
/// selected presentation mode.
pub struct FluidPass {
    params: ParamState,
    compose: Compose,
    sim: FluidSim,
    pointer: PointerInput,
    present: Program,
    passthrough: Program,
    built_for: Option<Vec<u32>>,
    /// Upper bound of any dye component; splats add their peak, advection only shrinks it.
    dye_peak: f32,
    /// Estimated peak velocity magnitude in sim texels per second.
    velocity_peak: f32,
    gate: f32,
    stale_fields: bool,
}

impl FluidPass {
    /// Parameters of the interactivity layer.
    pub const SPECS: &'static [ParamSpec] = &[
        ParamSpec::choice("mode", 0, MODES).structural(),
        ParamSpec::float("intensity", 1.0, 0.0, 4.0),
        ParamSpec::color("color", [1.0, 1.0, 1.0]),
        ParamSpec::float("radius", 1.0, 0.1, 4.0),
        ParamSpec::float("force", 1.0, 0.0, 4.0),
        ParamSpec::float("decay", 1.0, 0.0, 10.0),
        ParamSpec::float("displacement", 0.03, 0.0, 0.5),
        ParamSpec::float("displaceRadius", 0.15, 0.01, 1.0),
        ParamSpec::boolean("active", true),
    ];

    /// A pass with an empty splat queue of `queue_cap` entries; moves shorter than `noise_px`
    /// viewport pixels are ignored.
    pub fn new(config: FluidConfig, queue_cap: usize, noise_px: f32) -> Self {
        let mut params = ParamState::new(Self::SPECS);
        let compose = Compose::declare(params.block_mut());
        Self {
            params,
            compose,
            sim: FluidSim::new(config),
            pointer: PointerInput::new(queue_cap, noise_px),
            present: Program::passthrough(),
            passthrough: Program::passthrough(),
            built_for: None,
            dye_peak: 0.0,
            velocity_peak: 0.0,
            gate: 0.0,
            stale_fields: false,
        }
    }

    /// Presentation mode currently selected.
    pub fn mode(&self) -> FluidMode {
        FluidMode::from_index(self.params.choice("mode"))
    }

    /// Whether the layer accepts pointer input and steps the solver.
    pub fn is_active(&self) -> bool {
        self.params.flag("active")
    }

    /// The underlying solver.
    pub fn sim(&self) -> &FluidSim {
        &self.sim
    }

    /// Pointer state and pending splats.
    pub fn pointer(&self) -> &PointerInput {
        &self.pointer
    }

    /// Conservative bound on the dye field's largest component.
    pub fn dye_peak_bound(&self) -> f32 {
        self.dye_peak
    }

    fn present_graph(&self) -> Expr {
        let uv = Expr::uv();
        let input = Expr::sample(0, &uv);
        let intensity = self.params.expr("intensity");
        let strength = self.params.expr("displacement");
        let opaque = |rgb: Expr| join([rgb, Expr::lit(1.0)]);
        match self.mode() {
            FluidMode::Trail => opaque(input.rgb() + Expr::sample(1, &uv).rgb() * &intensity),
            FluidMode::TrailSource => opaque(Expr::sample(1, &uv).rgb() * &intensity),
            FluidMode::Tint => {
                let m = (luminance(&Expr::sample(1, &uv).rgb()) * &intensity).saturate();
                let tinted = self.params.expr("color") * luminance(&input.rgb());
                opaque(mix(input.rgb(), tinted, m))
            }
            FluidMode::Displace => {
                let offset = Expr::sample(2, &uv).xy() * Expr::texel_size(2) * &strength;
                Expr::sample(0, &uv - offset)
            }
            FluidMode::Repel => Expr::sample(0, &uv - Expr::sample(3, &uv).xy() * &strength),
            FluidMode::Attract => Expr::sample(0, &uv + Expr::sample(3, &uv).xy() * &strength),
            FluidMode::Glow => input,
        }
    }

    fn compile(&self) -> StrataResult<Program> {
        let base = Expr::sample(0, Expr::uv());
        let root = self
            .compose
            .apply(self.params.block(), &base, &self.present_graph());
        Program::compile("interactivity", &root, self.params.block())
    }

    fn rebuild_if_stale(&mut self) {
        let Some(built) = &self.built_for else {
            return;
        };
        if *built == self.params.structure() {
            return;
        }
        // Only the presentation program depends on the mode; the fields carry on untouched.
        let structure = self.params.structure();
        match self.compile() {
            Ok(p) => self.present = p,
            Err(e) => {
                tracing::warn!(error = %e, "interactivity rebuild failed; passing through");
                self.present = Program::passthrough();
            }
        }
        self.built_for = Some(structure);
    }

    fn style(&self) -> SplatStyle {
        let c = self.params.value("color");
        SplatStyle {
            color: [c[0], c[1], c[2]],
            force: self.params.f32("force"),
            radius: self.params.f32("radius"),
        }
    }

    fn track_bounds(&mut self, dt: f32, splats: &[Splat]) {
        let config = self.sim.config();
        let style = self.style();
        let dye_added: f32 = splats.len() as f32
            * config.dye_amount
            * style.color.iter().copied().fold(0.0, f32::max);
        let velocity_added: f32 = splats
            .iter()
            .map(|s| match s.kind {
                SplatKind::Move => s.du.hypot(s.dv) * config.splat_force * style.force,
                SplatKind::Click => config.click_force * style.force,
            })
            .sum();
        let dye_rate = config.dye_dissipation * self.params.f32("decay");
        self.dye_peak = (self.dye_peak + dye_added) / (1.0 + dye_rate * dt);
        self.velocity_peak = ((self.velocity_peak + velocity_added)
            / (1.0 + config.velocity_dissipation * dt))
            .min(VELOCITY_LIMIT * std::f32::consts::SQRT_2);

        if self.pointer.is_active() {
            self.gate = (self.pointer.speed_px() / GATE_FULL_SPEED_PX).clamp(0.0, 1.0);
        } else {
            self.gate *= (-GATE_FALLOFF * dt).exp();
            if self.gate < 1e-3 {
                self.gate = 0.0;
            }
        }
    }

    fn forget(&mut self) {
        self.pointer.reset();
        self.dye_peak = 0.0;
        self.velocity_peak = 0.0;
        self.gate = 0.0;
        self.stale_fields = true;
    }

    fn draw_passthrough(
        &self,
        ctx: &mut RenderCtx<'_>,
        input: TextureId,
        output: TextureId,
        time: f32,
    ) -> StrataResult<()> {
        ctx.device.draw(&DrawCall {
            program: &self.passthrough,
            uniforms: &[],
            inputs: &[input],
            output,
            time,
            label: "interactivity-passthrough",
        })
    }
}

impl Pass for FluidPass {
    fn shader_type(&self) -> ShaderType {
        ShaderType::Interactivity
    }

    fn build(&mut self) -> StrataResult<()> {
        self.built_for = Some(self.params.structure());
        self.sim.build()?;
        match self.compile() {
            Ok(p) => {
                self.present = p;
                Ok(())
            }
            Err(e) => {
                self.present = Program::passthrough();
                Err(e)
            }
        }
    }

    fn render(
        &mut self,
        ctx: &mut RenderCtx<'_>,
        input: TextureId,
        output: TextureId,
        time: f32,
        delta: f32,
    ) -> StrataResult<()> {
        self.rebuild_if_stale();
        if !self.is_active() || !self.sim.is_built() {
            return self.draw_passthrough(ctx, input, output, time);
        }
        let (w, h) = ctx.device.texture_size(output).unwrap_or((1, 1));
        self.pointer.set_viewport(w, h);
        self.sim.ensure(ctx, w, h)?;
        if self.stale_fields {
            self.sim.clear(&mut *ctx.device)?;
            self.stale_fields = false;
        }

        let dt = if delta.is_finite() {
            delta.clamp(0.0, self.sim.config().max_dt)
        } else {
            0.0
        };
        let splats = self.pointer.drain();
        self.track_bounds(dt, &splats);
        let step = StepInput {
            dt,
            splats: &splats,
            style: self.style(),
            dye_dissipation: self.sim.config().dye_dissipation * self.params.f32("decay"),
            pointer: self.pointer.position(),
            gate: self.gate,
            displace_radius: self.params.f32("displaceRadius"),
        };
        self.sim.step(ctx, &step)?;

        let (Some(dye), Some(velocity), Some(displacement)) = (
            self.sim.dye_texture(),
            self.sim.velocity_texture(),
            self.sim.displacement_texture(),
        ) else {
            return self.draw_passthrough(ctx, input, output, time);
        };
        let inputs = [input, dye, velocity, displacement];
        let bound = usize::from(self.present.input_slots()).clamp(1, inputs.len());
        let uniforms = self.params.block().values();
        ctx.device.draw(&DrawCall {
            program: &self.present,
            uniforms: &uniforms,
            inputs: &inputs[..bound],
            output,
            time,
            label: "interactivity",
        })
    }

    fn update_uniforms(&mut self, params: &[Param]) {
        let was_active = self.is_active();
        self.params.apply(params);
        if was_active && !self.is_active() {
            tracing::debug!("interactivity deactivated");
            self.forget();
        }
    }

    fn set_composite(&mut self, settings: CompositeSettings) {
        self.compose.write(self.params.block_mut(), settings);
    }

    fn resize(&mut self, ctx: &mut RenderCtx<'_>, width: u32, height: u32) -> StrataResult<()> {
        self.pointer.set_viewport(width, height);
        if self.sim.field_sizes().is_some() {
            self.sim.ensure(ctx, width, height)?;
        }
        Ok(())
    }

    fn needs_continuous_render(&self) -> bool {
        if !self.is_active() {
            return false;
        }
        if self.pointer.is_active() || self.pointer.has_pending() {
            return true;
        }
        let eps = self.sim.config().idle_epsilon;
        match self.mode() {
            FluidMode::Trail | FluidMode::TrailSource | FluidMode::Tint => self.dye_peak > eps,
            FluidMode::Displace => {
                let texel = 1.0 / self.sim.config().sim_resolution.max(1) as f32;
                self.velocity_peak * texel * self.params.f32("displacement") > eps
            }
            FluidMode::Repel | FluidMode::Attract => self.gate > 0.0,
            FluidMode::Glow => false,
        }
    }

    fn dispose(&mut self, ctx: &mut RenderCtx<'_>) {
        self.sim.release(ctx);
        self.pointer.reset();
    }

    fn interactivity(&mut self) -> Option<&mut dyn Interactivity> {
        Some(self)
    }

    fn programs(&self) -> Vec<&Program> {
        let mut all = vec![&self.present];
        all.extend(self.sim.programs());
        all
    }
}

impl Interactivity for FluidPass {
    fn set_pointer(&mut self, u: f32, v: f32, du: f32, dv: f32, active: bool) {
        if self.is_active() {
            self.pointer.pointer(u, v, du, dv, active);
        }
    }

    fn add_click(&mut self, u: f32, v: f32) {
        if self.is_active() {
            self.pointer.click(u, v);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/fluid/pass.rs"]
mod tests;
