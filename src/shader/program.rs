//! Lowering of expression graphs into register programs.

use std::collections::HashMap;

use crate::foundation::error::{StrataError, StrataResult};
use crate::foundation::math::Fnv1a64;
use crate::shader::ir::{
    BinaryOp, Builtin, CmpOp, Expr, Func, LogicOp, MAX_INPUTS, Node, NodeKind, Ty, UnaryOp,
};
use crate::shader::uniforms::UniformBlock;

/// Register index; register `i` holds the result of instruction `i`.
pub(crate) type Reg = u32;

pub(crate) const NO_REG: Reg = Reg::MAX;

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Op {
    Const([f32; 4]),
    Uniform(u16),
    Builtin(Builtin),
    TexelSize(u8),
    Sample(u8, Reg),
    Unary(UnaryOp, Reg),
    Binary(BinaryOp, Reg, Reg),
    Compare(CmpOp, Reg, Reg),
    Logic(LogicOp, Reg, Reg),
    Select(Reg, Reg, Reg),
    Func(Func, [Reg; 3]),
    Swizzle(Reg, [u8; 4]),
    Construct(Vec<Reg>),
    Blend([Reg; 4]),
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Instr {
    pub(crate) op: Op,
    pub(crate) ty: Ty,
}

/// A lowered fragment program: straight-line SSA producing one `vec4` per output texel.
#[derive(Clone, Debug)]
pub struct Program {
    label: String,
    pub(crate) instrs: Vec<Instr>,
    pub(crate) output: Reg,
    pub(crate) uniform_types: Vec<Ty>,
    input_slots: u8,
    uses_blend: bool,
    hash: u64,
}

impl Program {
    /// Lower `root` (which must be `vec4`) against the uniforms declared in `uniforms`.
    pub fn compile(label: &str, root: &Expr, uniforms: &UniformBlock) -> StrataResult<Self> {
        if root.ty() != Ty::Vec4 {
            return Err(StrataError::shader(format!(
                "`{label}`: fragment output must be vec4, got {:?}",
                root.ty()
            )));
        }
        let mut lower = Lowering {
            uniforms,
            instrs: Vec::new(),
            memo: HashMap::new(),
            input_slots: 0,
            uses_blend: false,
        };
        let output = lower.lower(root)?;
        let uniform_types: Vec<Ty> = uniforms.types().collect();
        let hash = structural_hash(&lower.instrs, output, &uniform_types);
        Ok(Self {
            label: label.to_owned(),
            instrs: lower.instrs,
            output,
            uniform_types,
            input_slots: lower.input_slots,
            uses_blend: lower.uses_blend,
            hash,
        })
    }

    /// `sample(0, uv)`.
    pub fn passthrough() -> Self {
        let instrs = vec![
            Instr {
                op: Op::Builtin(Builtin::Uv),
                ty: Ty::Vec2,
            },
            Instr {
                op: Op::Sample(0, 0),
                ty: Ty::Vec4,
            },
        ];
        let hash = structural_hash(&instrs, 1, &[]);
        Self {
            label: "passthrough".to_owned(),
            instrs,
            output: 1,
            uniform_types: Vec::new(),
            input_slots: 1,
            uses_blend: false,
            hash,
        }
    }

    /// Debug label given at compile time.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Structural hash over instructions and uniform layout; equal programs share GPU pipelines.
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// Number of texture slots the program reads (highest used slot + 1).
    pub fn input_slots(&self) -> u8 {
        self.input_slots
    }

    /// User uniform slots the program reads.
    pub fn uniform_count(&self) -> usize {
        self.uniform_types.len()
    }

    /// Lowered instruction count.
    pub fn instr_count(&self) -> usize {
        self.instrs.len()
    }

    /// Whether the program composites through the blend prelude.
    pub fn uses_blend(&self) -> bool {
        self.uses_blend
    }
}

struct Lowering<'a> {
    uniforms: &'a UniformBlock,
    instrs: Vec<Instr>,
    memo: HashMap<*const Node, Reg>,
    input_slots: u8,
    uses_blend: bool,
}

impl Lowering<'_> {
    fn lower(&mut self, e: &Expr) -> StrataResult<Reg> {
        let key = std::rc::Rc::as_ptr(&e.0);
        if let Some(&r) = self.memo.get(&key) {
            return Ok(r);
        }
        let op = match &e.0.kind {
            NodeKind::Const(v) => Op::Const(*v),
            NodeKind::Uniform(h) => {
                match self.uniforms.ty(*h) {
                    Some(ty) if ty == e.ty() => {}
                    Some(ty) => {
                        return Err(StrataError::shader(format!(
                            "uniform #{} is {ty:?} but used as {:?}",
                            h.index(),
                            e.ty()
                        )));
                    }
                    None => {
                        return Err(StrataError::shader(format!(
                            "uniform #{} is not declared in this block",
                            h.index()
                        )));
                    }
                }
                Op::Uniform(h.0)
            }
            NodeKind::Builtin(b) => Op::Builtin(*b),
            NodeKind::TexelSize(slot) => {
                self.note_slot(*slot)?;
                Op::TexelSize(*slot)
            }
            NodeKind::Sample(slot, uv) => {
                self.note_slot(*slot)?;
                Op::Sample(*slot, self.lower(uv)?)
            }
            NodeKind::Unary(op, a) => Op::Unary(*op, self.lower(a)?),
            NodeKind::Binary(op, a, b) => Op::Binary(*op, self.lower(a)?, self.lower(b)?),
            NodeKind::Compare(op, a, b) => Op::Compare(*op, self.lower(a)?, self.lower(b)?),
            NodeKind::Logic(op, a, b) => Op::Logic(*op, self.lower(a)?, self.lower(b)?),
            NodeKind::Select(c, t, f) => {
                Op::Select(self.lower(c)?, self.lower(t)?, self.lower(f)?)
            }
            NodeKind::Func(func, args) => {
                let mut regs = [NO_REG; 3];
                for (slot, arg) in regs.iter_mut().zip(args) {
                    *slot = self.lower(arg)?;
                }
                Op::Func(*func, regs)
            }
            NodeKind::Swizzle(a, lanes) => Op::Swizzle(self.lower(a)?, *lanes),
            NodeKind::Construct(parts) => {
                let regs = parts
                    .iter()
                    .map(|p| self.lower(p))
                    .collect::<StrataResult<Vec<_>>>()?;
                Op::Construct(regs)
            }
            NodeKind::Blend {
                base,
                effect,
                mode,
                opacity,
            } => {
                self.uses_blend = true;
                Op::Blend([
                    self.lower(base)?,
                    self.lower(effect)?,
                    self.lower(mode)?,
                    self.lower(opacity)?,
                ])
            }
        };
        let reg = Reg::try_from(self.instrs.len())
            .map_err(|_| StrataError::shader("program too large"))?;
        self.instrs.push(Instr { op, ty: e.ty() });
        self.memo.insert(key, reg);
        Ok(reg)
    }

    fn note_slot(&mut self, slot: u8) -> StrataResult<()> {
        if slot >= MAX_INPUTS {
            return Err(StrataError::shader(format!(
                "texture slot {slot} exceeds the {MAX_INPUTS} supported inputs"
            )));
        }
        self.input_slots = self.input_slots.max(slot + 1);
        Ok(())
    }
}

fn structural_hash(instrs: &[Instr], output: Reg, uniforms: &[Ty]) -> u64 {
    let mut h = Fnv1a64::new_default();
    h.write_u64(instrs.len() as u64);
    for instr in instrs {
        h.write_u8(instr.ty.code());
        match &instr.op {
            Op::Const(v) => {
                h.write_u8(1);
                for c in v {
                    h.write_f32(*c);
                }
            }
            Op::Uniform(i) => {
                h.write_u8(2);
                h.write_u32(u32::from(*i));
            }
            Op::Builtin(b) => {
                h.write_u8(3);
                h.write_u8(*b as u8);
            }
            Op::TexelSize(s) => {
                h.write_u8(4);
                h.write_u8(*s);
            }
            Op::Sample(s, r) => {
                h.write_u8(5);
                h.write_u8(*s);
                h.write_u32(*r);
            }
            Op::Unary(op, a) => {
                h.write_u8(6);
                h.write_u8(*op as u8);
                h.write_u32(*a);
            }
            Op::Binary(op, a, b) => {
                h.write_u8(7);
                h.write_u8(*op as u8);
                h.write_u32(*a);
                h.write_u32(*b);
            }
            Op::Compare(op, a, b) => {
                h.write_u8(8);
                h.write_u8(*op as u8);
                h.write_u32(*a);
                h.write_u32(*b);
            }
            Op::Logic(op, a, b) => {
                h.write_u8(9);
                h.write_u8(*op as u8);
                h.write_u32(*a);
                h.write_u32(*b);
            }
            Op::Select(c, t, f) => {
                h.write_u8(10);
                h.write_u32(*c);
                h.write_u32(*t);
                h.write_u32(*f);
            }
            Op::Func(func, args) => {
                h.write_u8(11);
                h.write_u8(*func as u8);
                for a in args {
                    h.write_u32(*a);
                }
            }
            Op::Swizzle(a, lanes) => {
                h.write_u8(12);
                h.write_u32(*a);
                h.write_bytes(lanes);
            }
            Op::Construct(parts) => {
                h.write_u8(13);
                h.write_u32(parts.len() as u32);
                for p in parts {
                    h.write_u32(*p);
                }
            }
            Op::Blend(regs) => {
                h.write_u8(14);
                for r in regs {
                    h.write_u32(*r);
                }
            }
        }
    }
    h.write_u32(output);
    h.write_u64(uniforms.len() as u64);
    for ty in uniforms {
        h.write_u8(ty.code());
    }
    h.finish()
}

#[cfg(test)]
#[path = "../../tests/unit/shader/program.rs"]
mod tests;
