use crate::foundation::error::{StrataError, StrataResult};

/// Numeric knobs of the fluid solver.
///
/// The splat and dissipation defaults are tuned by eye, not derived; keep them as tunables.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FluidConfig {
    /// Short-side texels of the velocity and pressure fields.
    pub sim_resolution: u32,
    /// Short-side texels of the dye field.
    pub dye_resolution: u32,
    /// Relaxation budget of the pressure solve per step.
    pub pressure_iterations: u32,
    /// Per-second dissipation rate of velocity; each step divides by `1 + rate * dt`.
    pub velocity_dissipation: f32,
    /// Per-second dissipation rate of dye.
    pub dye_dissipation: f32,
    /// Pressure carried over between frames before the solve.
    pub pressure_decay: f32,
    /// Vorticity confinement strength.
    pub curl_strength: f32,
    /// Gaussian splat radius in percent of the field.
    pub splat_radius: f32,
    /// Velocity scale of pointer-move splats.
    pub splat_force: f32,
    /// Peak speed of the radial burst a click injects.
    pub click_force: f32,
    /// Dye injected at a splat centre, times the layer color.
    pub dye_amount: f32,
    /// Dye peak below which the field counts as idle.
    pub idle_epsilon: f32,
    /// Upper bound for one simulation step, in seconds.
    pub max_dt: f32,
}

impl Default for FluidConfig {
    fn default() -> Self {
        Self {
            sim_resolution: 128,
            dye_resolution: 512,
            pressure_iterations: 20,
            velocity_dissipation: 0.2,
            dye_dissipation: 3.0,
            pressure_decay: 0.8,
            curl_strength: 30.0,
            splat_radius: 0.25,
            splat_force: 6000.0,
            click_force: 3000.0,
            dye_amount: 0.8,
            idle_epsilon: 1.0 / 512.0,
            max_dt: 1.0 / 30.0,
        }
    }
}

impl FluidConfig {
    /// Reject non-finite or negative rates and zero resolutions.
    pub fn validate(&self) -> StrataResult<()> {
        if self.sim_resolution == 0 || self.dye_resolution == 0 {
            return Err(StrataError::validation(
                "fluid resolutions must be non-zero",
            ));
        }
        let rates = [
            ("velocityDissipation", self.velocity_dissipation),
            ("dyeDissipation", self.dye_dissipation),
            ("curlStrength", self.curl_strength),
            ("splatForce", self.splat_force),
            ("clickForce", self.click_force),
            ("dyeAmount", self.dye_amount),
        ];
        for (name, v) in rates {
            if !v.is_finite() || v < 0.0 {
                return Err(StrataError::validation(format!(
                    "fluid {name} must be finite and >= 0, got {v}"
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.pressure_decay) {
            return Err(StrataError::validation(format!(
                "fluid pressureDecay must be in 0..=1, got {}",
                self.pressure_decay
            )));
        }
        if !(self.splat_radius > 0.0 && self.splat_radius.is_finite()) {
            return Err(StrataError::validation("fluid splatRadius must be > 0"));
        }
        if !(self.idle_epsilon > 0.0 && self.max_dt > 0.0) {
            return Err(StrataError::validation(
                "fluid idleEpsilon and maxDt must be > 0",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/fluid/config.rs"]
mod tests;
