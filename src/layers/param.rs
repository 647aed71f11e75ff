use crate::foundation::core::parse_hex_color;
use crate::layers::model::normalize_name;

/// A parameter value as sent by the external layer store.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Param {
    /// Lookup key, matched case- and separator-insensitively.
    pub key: String,
    /// Declared type; informs coercion of `value`.
    #[serde(rename = "type", default)]
    pub ty: ParamType,
    /// Raw value.
    pub value: ParamValue,
    /// Host-side lower bound, applied before the pass range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f32>,
    /// Host-side upper bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f32>,
    /// UI step; not used when rendering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f32>,
    /// Labels of an enum param.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
/// Declared type of a param.
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    /// Scalar.
    #[default]
    Float,
    /// Integer scalar.
    Int,
    /// Flag.
    Bool,
    /// RGB color, as an array or a hex string.
    Color,
    /// Option label or index.
    Enum,
    /// Two components.
    Vec2,
    /// Three components.
    Vec3,
}

/// Untyped JSON value of a param.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// `true`/`false`.
    Bool(bool),
    /// Any JSON number.
    Number(f64),
    /// Number array.
    Array(Vec<f64>),
    /// String: hex colors, option labels, numerals.
    Text(String),
}

impl Param {
    fn with(key: impl Into<String>, ty: ParamType, value: ParamValue) -> Self {
        Self {
            key: key.into(),
            ty,
            value,
            min: None,
            max: None,
            step: None,
            options: None,
        }
    }

    /// A float param.
    pub fn float(key: impl Into<String>, value: f32) -> Self {
        Self::with(key, ParamType::Float, ParamValue::Number(f64::from(value)))
    }

    /// An integer param.
    pub fn int(key: impl Into<String>, value: i32) -> Self {
        Self::with(key, ParamType::Int, ParamValue::Number(f64::from(value)))
    }

    /// A flag param.
    pub fn boolean(key: impl Into<String>, value: bool) -> Self {
        Self::with(key, ParamType::Bool, ParamValue::Bool(value))
    }

    /// An RGB color param.
    pub fn color(key: impl Into<String>, rgb: [f32; 3]) -> Self {
        Self::with(
            key,
            ParamType::Color,
            ParamValue::Array(rgb.iter().map(|&c| f64::from(c)).collect()),
        )
    }

    /// An enum param selecting `option` by label.
    pub fn choice(key: impl Into<String>, option: impl Into<String>) -> Self {
        Self::with(key, ParamType::Enum, ParamValue::Text(option.into()))
    }

    /// A two-component param.
    pub fn vec2(key: impl Into<String>, v: [f32; 2]) -> Self {
        Self::with(
            key,
            ParamType::Vec2,
            ParamValue::Array(v.iter().map(|&c| f64::from(c)).collect()),
        )
    }

    /// Attach a host-side range.
    pub fn with_range(mut self, min: f32, max: f32) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    /// Clamp to the param's own declared range, if any.
    fn declared_clamp(&self, v: f32) -> f32 {
        let mut v = v;
        if let Some(max) = self.max.filter(|m| m.is_finite()) {
            v = v.min(max);
        }
        if let Some(min) = self.min.filter(|m| m.is_finite()) {
            v = v.max(min);
        }
        v
    }

    fn as_number(&self) -> Option<f32> {
        let n = match &self.value {
            ParamValue::Number(n) => *n as f32,
            ParamValue::Bool(b) => f32::from(u8::from(*b)),
            ParamValue::Text(s) => s.trim().parse::<f32>().ok()?,
            ParamValue::Array(a) => *a.first()? as f32,
        };
        n.is_finite().then_some(n)
    }

    fn as_components(&self) -> Option<Vec<f32>> {
        match &self.value {
            ParamValue::Array(a) => {
                let v: Vec<f32> = a.iter().map(|&x| x as f32).collect();
                v.iter().all(|x| x.is_finite()).then_some(v)
            }
            ParamValue::Number(n) => Some(vec![*n as f32]),
            _ => None,
        }
    }
}

/// Declares one parameter a pass understands, with its default and accepted range.
#[derive(Clone, Copy, Debug)]
pub struct ParamSpec {
    /// Param key.
    pub key: &'static str,
    /// Value kind with default and range.
    pub kind: SpecKind,
    /// Structural params select a different shader graph; changing one triggers a rebuild.
    pub structural: bool,
}

/// Kind, default and accepted range of a [`ParamSpec`].
#[derive(Clone, Copy, Debug)]
pub enum SpecKind {
    /// Scalar.
    Float {
        /// Value before any param arrives.
        default: f32,
        /// Lower clamp.
        min: f32,
        /// Upper clamp.
        max: f32,
    },
    /// Integer scalar.
    Int {
        /// Value before any param arrives.
        default: i32,
        /// Lower clamp.
        min: i32,
        /// Upper clamp.
        max: i32,
    },
    /// Flag.
    Bool {
        /// Value before any param arrives.
        default: bool,
    },
    /// RGB color.
    Color {
        /// Value before any param arrives.
        default: [f32; 3],
    },
    /// Option index.
    Choice {
        /// Index before any param arrives.
        default: u32,
        /// Option labels, in index order.
        options: &'static [&'static str],
    },
    /// Two components.
    Vec2 {
        /// Value before any param arrives.
        default: [f32; 2],
        /// Lower clamp of each component.
        min: f32,
        /// Upper clamp of each component.
        max: f32,
    },
}

impl ParamSpec {
    /// A float spec clamped to `min..=max`.
    pub const fn float(key: &'static str, default: f32, min: f32, max: f32) -> Self {
        Self {
            key,
            kind: SpecKind::Float { default, min, max },
            structural: false,
        }
    }

    /// An integer spec clamped to `min..=max`.
    pub const fn int(key: &'static str, default: i32, min: i32, max: i32) -> Self {
        Self {
            key,
            kind: SpecKind::Int { default, min, max },
            structural: false,
        }
    }

    /// A flag spec.
    pub const fn boolean(key: &'static str, default: bool) -> Self {
        Self {
            key,
            kind: SpecKind::Bool { default },
            structural: false,
        }
    }

    /// An RGB color spec.
    pub const fn color(key: &'static str, default: [f32; 3]) -> Self {
        Self {
            key,
            kind: SpecKind::Color { default },
            structural: false,
        }
    }

    /// An enum spec; `default` indexes `options`.
    pub const fn choice(key: &'static str, default: u32, options: &'static [&'static str]) -> Self {
        Self {
            key,
            kind: SpecKind::Choice { default, options },
            structural: false,
        }
    }

    /// A two-component spec, each clamped to `min..=max`.
    pub const fn vec2(key: &'static str, default: [f32; 2], min: f32, max: f32) -> Self {
        Self {
            key,
            kind: SpecKind::Vec2 { default, min, max },
            structural: false,
        }
    }

    /// Mark the spec as structural.
    pub const fn structural(mut self) -> Self {
        self.structural = true;
        self
    }

    /// Default value packed into a uniform-sized slot.
    pub fn default_value(&self) -> [f32; 4] {
        match self.kind {
            SpecKind::Float { default, .. } => [default, 0.0, 0.0, 0.0],
            SpecKind::Int { default, .. } => [default as f32, 0.0, 0.0, 0.0],
            SpecKind::Bool { default } => [f32::from(u8::from(default)), 0.0, 0.0, 0.0],
            SpecKind::Color { default } => [default[0], default[1], default[2], 1.0],
            SpecKind::Choice { default, .. } => [default as f32, 0.0, 0.0, 0.0],
            SpecKind::Vec2 { default, .. } => [default[0], default[1], 0.0, 0.0],
        }
    }

    /// Number of meaningful components in the packed value.
    pub fn width(&self) -> usize {
        match self.kind {
            SpecKind::Color { .. } => 3,
            SpecKind::Vec2 { .. } => 2,
            _ => 1,
        }
    }

    /// Convert an incoming param into a packed value, clamped to both this spec's range and the
    /// param's declared `min`/`max`. Returns `None` when the value cannot be interpreted.
    pub fn resolve(&self, param: &Param) -> Option<[f32; 4]> {
        match self.kind {
            SpecKind::Float { min, max, .. } => {
                let v = param.declared_clamp(param.as_number()?);
                Some([v.clamp(min, max), 0.0, 0.0, 0.0])
            }
            SpecKind::Int { min, max, .. } => {
                let v = param.declared_clamp(param.as_number()?).round();
                Some([v.clamp(min as f32, max as f32), 0.0, 0.0, 0.0])
            }
            SpecKind::Bool { .. } => {
                let b = match &param.value {
                    ParamValue::Bool(b) => *b,
                    ParamValue::Number(n) => *n != 0.0,
                    ParamValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                        "true" | "on" | "1" => true,
                        "false" | "off" | "0" => false,
                        _ => return None,
                    },
                    ParamValue::Array(_) => return None,
                };
                Some([f32::from(u8::from(b)), 0.0, 0.0, 0.0])
            }
            SpecKind::Color { .. } => {
                let rgba = match &param.value {
                    ParamValue::Text(s) => parse_hex_color(s)?,
                    _ => {
                        let c = param.as_components()?;
                        if c.len() < 3 {
                            return None;
                        }
                        [c[0], c[1], c[2], 1.0]
                    }
                };
                Some([
                    rgba[0].clamp(0.0, 1.0),
                    rgba[1].clamp(0.0, 1.0),
                    rgba[2].clamp(0.0, 1.0),
                    1.0,
                ])
            }
            SpecKind::Choice { options, .. } => {
                let last = options.len().saturating_sub(1);
                let idx = match &param.value {
                    ParamValue::Text(s) => {
                        let wanted = normalize_name(s);
                        options.iter().position(|o| normalize_name(o) == wanted)?
                    }
                    ParamValue::Number(n) if n.is_finite() => {
                        (n.round().max(0.0) as usize).min(last)
                    }
                    _ => return None,
                };
                Some([idx as f32, 0.0, 0.0, 0.0])
            }
            SpecKind::Vec2 { min, max, .. } => {
                let c = param.as_components()?;
                if c.len() < 2 {
                    return None;
                }
                Some([
                    param.declared_clamp(c[0]).clamp(min, max),
                    param.declared_clamp(c[1]).clamp(min, max),
                    0.0,
                    0.0,
                ])
            }
        }
    }
}

/// Look up a spec by key in a pass's spec table.
pub fn find_spec<'a>(specs: &'a [ParamSpec], key: &str) -> Option<&'a ParamSpec> {
    specs.iter().find(|s| s.key == key)
}

#[cfg(test)]
#[path = "../../tests/unit/layers/param.rs"]
mod tests;
