use crate::foundation::error::{StrataError, StrataResult};
use crate::layers::param::Param;

/// One entry of the external layer stack, bottom-to-top order.
///
/// Identity is `id`; everything else may change between syncs.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerDescriptor {
    /// Stable identity across syncs.
    pub id: String,
    /// Hidden layers keep their pass but are skipped.
    #[serde(default = "default_visible")]
    pub visible: bool,
    /// Blend weight in `0..=1`.
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    /// Compositing formula.
    #[serde(default)]
    pub blend_mode: BlendMode,
    /// How the blended result is gated.
    #[serde(default)]
    pub filter_mode: FilterMode,
    /// Effect kind; unknown kinds render as a passthrough.
    pub shader_type: ShaderType,
    /// Effect parameters, applied over the defaults.
    #[serde(default)]
    pub params: Vec<Param>,
}

fn default_visible() -> bool {
    true
}

fn default_opacity() -> f32 {
    1.0
}

impl LayerDescriptor {
    /// A visible, fully opaque layer with normal blending and no params.
    pub fn new(id: impl Into<String>, shader_type: ShaderType) -> Self {
        Self {
            id: id.into(),
            visible: true,
            opacity: 1.0,
            blend_mode: BlendMode::Normal,
            filter_mode: FilterMode::Filter,
            shader_type,
            params: Vec::new(),
        }
    }

    /// Replace the opacity.
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    /// Replace the blend mode.
    pub fn with_blend(mut self, blend_mode: BlendMode) -> Self {
        self.blend_mode = blend_mode;
        self
    }

    /// Replace the filter mode.
    pub fn with_filter_mode(mut self, filter_mode: FilterMode) -> Self {
        self.filter_mode = filter_mode;
        self
    }

    /// Show or hide the layer.
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Append a param.
    pub fn with_param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "kebab-case")]
/// Per-channel compositing formula applied between a pass's input and its effect.
pub enum BlendMode {
    /// Source over.
    #[default]
    Normal,
    /// Product of both colors.
    Multiply,
    /// Inverted product of the inverses.
    Screen,
    /// Multiply or screen, keyed on the base.
    Overlay,
    /// Per-channel minimum.
    Darken,
    /// Per-channel maximum.
    Lighten,
    /// Base brightened by the effect.
    #[serde(alias = "colorDodge")]
    ColorDodge,
    /// Base darkened by the effect.
    #[serde(alias = "colorBurn")]
    ColorBurn,
    /// Overlay keyed on the effect.
    #[serde(alias = "hardLight")]
    HardLight,
    /// Gentle overlay.
    #[serde(alias = "softLight")]
    SoftLight,
    /// Absolute difference.
    Difference,
    /// Lower-contrast difference.
    Exclusion,
    /// Effect hue, base saturation and luminosity.
    Hue,
    /// Effect saturation, base hue and luminosity.
    Saturation,
    /// Effect hue and saturation, base luminosity.
    Color,
    /// Effect luminosity, base hue and saturation.
    Luminosity,
}

impl BlendMode {
    /// Every mode in index order.
    pub const ALL: [BlendMode; 16] = [
        BlendMode::Normal,
        BlendMode::Multiply,
        BlendMode::Screen,
        BlendMode::Overlay,
        BlendMode::Darken,
        BlendMode::Lighten,
        BlendMode::ColorDodge,
        BlendMode::ColorBurn,
        BlendMode::HardLight,
        BlendMode::SoftLight,
        BlendMode::Difference,
        BlendMode::Exclusion,
        BlendMode::Hue,
        BlendMode::Saturation,
        BlendMode::Color,
        BlendMode::Luminosity,
    ];

    /// Stable numeric id, written into uniform slots and matched by the WGSL prelude.
    pub fn index(self) -> u32 {
        self as u32
    }

    /// Mode for a numeric id.
    pub fn from_index(index: u32) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
/// How a layer's blended color is applied over its input.
#[serde(rename_all = "kebab-case")]
pub enum FilterMode {
    /// Effect output is anchored on the input, weighted by its alpha.
    #[default]
    Filter,
    /// Effect luminance gates how much of the blended color shows through.
    Mask,
}

/// Effect kind of a layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShaderType {
    /// Rotated ink dot grid.
    Halftone,
    /// Block mosaic.
    Pixelate,
    /// Glyph mosaic.
    Ascii,
    /// Film grain.
    Grain,
    /// Radial RGB split.
    #[serde(alias = "chromaticAberration")]
    ChromaticAberration,
    /// Blur that ramps along an axis.
    #[serde(alias = "progressiveBlur")]
    ProgressiveBlur,
    /// Animated color field.
    #[serde(alias = "meshGradient")]
    MeshGradient,
    /// Signed-distance 2D shape.
    #[serde(alias = "sdf2d")]
    Shape2d,
    /// Ray-marched 3D shape.
    #[serde(alias = "sdf3d")]
    Shape3d,
    /// Fractal noise.
    Noise,
    /// Bright-pass glow.
    Bloom,
    /// Pointer-driven fluid.
    #[serde(alias = "fluid")]
    Interactivity,
    /// Any kind this build does not know.
    #[serde(other)]
    Unknown,
}

impl ShaderType {
    /// Every kind with an effect, in menu order.
    pub const BUILTIN: [ShaderType; 12] = [
        ShaderType::Halftone,
        ShaderType::Pixelate,
        ShaderType::Ascii,
        ShaderType::Grain,
        ShaderType::ChromaticAberration,
        ShaderType::ProgressiveBlur,
        ShaderType::MeshGradient,
        ShaderType::Shape2d,
        ShaderType::Shape3d,
        ShaderType::Noise,
        ShaderType::Bloom,
        ShaderType::Interactivity,
    ];

    /// Canonical kebab-case name.
    pub fn name(self) -> &'static str {
        match self {
            ShaderType::Halftone => "halftone",
            ShaderType::Pixelate => "pixelate",
            ShaderType::Ascii => "ascii",
            ShaderType::Grain => "grain",
            ShaderType::ChromaticAberration => "chromatic-aberration",
            ShaderType::ProgressiveBlur => "progressive-blur",
            ShaderType::MeshGradient => "mesh-gradient",
            ShaderType::Shape2d => "shape2d",
            ShaderType::Shape3d => "shape3d",
            ShaderType::Noise => "noise",
            ShaderType::Bloom => "bloom",
            ShaderType::Interactivity => "interactivity",
            ShaderType::Unknown => "unknown",
        }
    }

    /// Kind for a name in any casing or separator style.
    pub fn parse(name: &str) -> Option<Self> {
        let wanted = normalize_name(name);
        Self::BUILTIN
            .into_iter()
            .find(|t| normalize_name(t.name()) == wanted)
    }
}

/// Lowercase with `-`, `_` and spaces removed, so `colorDodge`, `color-dodge` and
/// `COLOR_DODGE` compare equal.
pub(crate) fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Parse a JSON array of layer descriptors as produced by the external layer store.
pub fn parse_layers_json(json: &str) -> StrataResult<Vec<LayerDescriptor>> {
    let layers: Vec<LayerDescriptor> = serde_json::from_str(json)
        .map_err(|e| StrataError::validation(format!("invalid layer list: {e}")))?;
    for layer in &layers {
        if layer.id.trim().is_empty() {
            return Err(StrataError::validation("layer id must be non-empty"));
        }
    }
    Ok(layers)
}

#[cfg(test)]
#[path = "../../tests/unit/layers/model.rs"]
mod tests;
