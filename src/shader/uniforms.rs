//! Uniform declarations and their packed values.

use crate::shader::ir::{Expr, MAX_INPUTS, Ty};

/// Number of `vec4` slots reserved ahead of user uniforms in the packed layout:
/// slot 0 holds `(out_w, out_h, time, 0)`, slot `1 + i` holds `(1/w, 1/h, w, h)` of input `i`.
pub const HEADER_SLOTS: usize = 1 + MAX_INPUTS as usize;

/// Stable index of a declared uniform inside its [`UniformBlock`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UniformHandle(pub(crate) u16);

impl UniformHandle {
    /// Position in the block.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug)]
struct Slot {
    name: String,
    ty: Ty,
    value: [f32; 4],
}

/// Per-pass uniform storage. Handles stay valid for the lifetime of the block, so values can be
/// rewritten every frame without touching the compiled program.
#[derive(Clone, Debug, Default)]
pub struct UniformBlock {
    slots: Vec<Slot>,
}

impl UniformBlock {
    /// An empty block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a uniform, or return the existing handle when `name` is already declared.
    pub fn declare(&mut self, name: &str, ty: Ty, initial: [f32; 4]) -> UniformHandle {
        assert!(ty.is_float(), "uniform `{name}` must be a float type");
        if let Some(h) = self.handle(name) {
            assert_eq!(
                self.slots[h.index()].ty,
                ty,
                "uniform `{name}` redeclared with another type"
            );
            return h;
        }
        let idx = u16::try_from(self.slots.len()).unwrap_or(u16::MAX);
        self.slots.push(Slot {
            name: name.to_owned(),
            ty,
            value: initial,
        });
        UniformHandle(idx)
    }

    /// Handle of the uniform named `name`.
    pub fn handle(&self, name: &str) -> Option<UniformHandle> {
        self.slots
            .iter()
            .position(|s| s.name == name)
            .map(|i| UniformHandle(i as u16))
    }

    /// Expression reading the uniform behind `handle`.
    pub fn expr(&self, handle: UniformHandle) -> Expr {
        Expr::uniform(handle, self.slots[handle.index()].ty)
    }

    /// Overwrite a value; unknown handles are ignored.
    pub fn set(&mut self, handle: UniformHandle, value: [f32; 4]) {
        if let Some(slot) = self.slots.get_mut(handle.index()) {
            slot.value = value;
        }
    }

    /// Overwrite a scalar value.
    pub fn set_f32(&mut self, handle: UniformHandle, v: f32) {
        self.set(handle, [v, 0.0, 0.0, 0.0]);
    }

    /// Current value; zero for unknown handles.
    pub fn get(&self, handle: UniformHandle) -> [f32; 4] {
        self.slots
            .get(handle.index())
            .map(|s| s.value)
            .unwrap_or_default()
    }

    /// Declared type.
    pub fn ty(&self, handle: UniformHandle) -> Option<Ty> {
        self.slots.get(handle.index()).map(|s| s.ty)
    }

    /// Declared uniform count.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether nothing is declared.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Declared types in slot order.
    pub fn types(&self) -> impl Iterator<Item = Ty> + '_ {
        self.slots.iter().map(|s| s.ty)
    }

    /// Raw values in declaration order.
    pub fn values(&self) -> Vec<[f32; 4]> {
        self.slots.iter().map(|s| s.value).collect()
    }
}

/// Pack the header and user values into the flat `vec4` array a GPU device uploads.
pub(crate) fn pack(
    resolution: (u32, u32),
    time: f32,
    input_sizes: &[(u32, u32)],
    values: &[[f32; 4]],
) -> Vec<[f32; 4]> {
    let mut out = Vec::with_capacity(HEADER_SLOTS + values.len());
    out.push([resolution.0 as f32, resolution.1 as f32, time, 0.0]);
    for i in 0..MAX_INPUTS as usize {
        out.push(match input_sizes.get(i) {
            Some(&(w, h)) if w > 0 && h > 0 => {
                [1.0 / w as f32, 1.0 / h as f32, w as f32, h as f32]
            }
            _ => [0.0; 4],
        });
    }
    out.extend_from_slice(values);
    out
}

#[cfg(test)]
#[path = "../../tests/unit/shader/uniforms.rs"]
mod tests;
