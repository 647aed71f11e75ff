use crate::layers::param::{Param, ParamSpec, find_spec};
use crate::shader::ir::{Expr, Ty};
use crate::shader::uniforms::{UniformBlock, UniformHandle};

fn spec_ty(spec: &ParamSpec) -> Ty {
    match spec.width() {
        3 => Ty::Vec3,
        2 => Ty::Vec2,
        _ => Ty::F32,
    }
}

/// Outcome of applying a parameter list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ParamChange {
    /// Some uniform value changed.
    pub values: bool,
    /// A structural param changed; the pass program must be rebuilt.
    pub structure: bool,
}

/// A pass's parameter table bound to uniform slots.
///
/// Every spec is declared as a uniform named after its key, so shader graphs read params by key
/// and updates only ever write slot values.
#[derive(Clone, Debug)]
pub struct ParamState {
    specs: &'static [ParamSpec],
    handles: Vec<UniformHandle>,
    block: UniformBlock,
}

impl ParamState {
    /// Declare one uniform per spec, holding its default.
    pub fn new(specs: &'static [ParamSpec]) -> Self {
        let mut block = UniformBlock::new();
        let handles = specs
            .iter()
            .map(|s| block.declare(s.key, spec_ty(s), s.default_value()))
            .collect();
        Self {
            specs,
            handles,
            block,
        }
    }

    /// Declared specs.
    pub fn specs(&self) -> &'static [ParamSpec] {
        self.specs
    }

    /// Uniform block the params live in.
    pub fn block(&self) -> &UniformBlock {
        &self.block
    }

    /// Mutable block, for passes that declare extra uniforms.
    pub fn block_mut(&mut self) -> &mut UniformBlock {
        &mut self.block
    }

    fn index(&self, key: &str) -> usize {
        self.specs
            .iter()
            .position(|s| s.key == key)
            .unwrap_or_else(|| panic!("pass declares no param `{key}`"))
    }

    /// Uniform expression for `key`. Panics on keys the pass never declared.
    pub fn expr(&self, key: &str) -> Expr {
        self.block.expr(self.handles[self.index(key)])
    }

    /// Current packed value of `key`.
    pub fn value(&self, key: &str) -> [f32; 4] {
        self.block.get(self.handles[self.index(key)])
    }

    /// First component of `key`.
    pub fn f32(&self, key: &str) -> f32 {
        self.value(key)[0]
    }

    /// `key` read as a flag.
    pub fn flag(&self, key: &str) -> bool {
        self.f32(key) > 0.5
    }

    /// Index of the selected option of a choice param.
    pub fn choice(&self, key: &str) -> u32 {
        self.f32(key).round().max(0.0) as u32
    }

    /// Current values of the structural params, in spec order.
    pub fn structure(&self) -> Vec<u32> {
        self.specs
            .iter()
            .filter(|s| s.structural)
            .map(|s| self.choice(s.key))
            .collect()
    }

    /// Apply incoming params. Unknown keys are ignored; out-of-range values are clamped; values
    /// that cannot be interpreted leave the slot untouched.
    pub fn apply(&mut self, params: &[Param]) -> ParamChange {
        let mut change = ParamChange::default();
        for param in params {
            let Some(spec) = find_spec(self.specs, &param.key) else {
                tracing::trace!(key = %param.key, "ignoring unknown param");
                continue;
            };
            let Some(value) = spec.resolve(param) else {
                tracing::warn!(key = %param.key, value = ?param.value, "unusable param value");
                continue;
            };
            let handle = self.handles[self.index(spec.key)];
            if self.block.get(handle) != value {
                self.block.set(handle, value);
                change.values = true;
                change.structure |= spec.structural;
            }
        }
        change
    }
}

#[cfg(test)]
#[path = "../../tests/unit/passes/params.rs"]
mod tests;
