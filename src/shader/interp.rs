use crate::effects::blend::composite;
use crate::layers::model::BlendMode;
use crate::shader::ir::{BinaryOp, Builtin, CmpOp, Func, LogicOp, Ty, UnaryOp};
use crate::shader::program::{Op, Program, Reg};

/// A texture the interpreter can sample; implemented by the CPU device's texel storage.
pub(crate) trait TexelSource: Sync {
    fn size(&self) -> (u32, u32);
    fn sample(&self, uv: [f32; 2]) -> [f32; 4];
}

/// Per-draw constants shared by every texel.
pub(crate) struct FragmentEnv<'a> {
    pub(crate) resolution: [f32; 2],
    pub(crate) time: f32,
    pub(crate) uniforms: &'a [[f32; 4]],
    pub(crate) textures: &'a [&'a dyn TexelSource],
}

#[inline]
fn lane(v: &[f32; 4], ty: Ty, i: usize) -> f32 {
    if ty.width() == 1 { v[0] } else { v[i] }
}

fn sign(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

fn unary(op: UnaryOp, x: f32) -> f32 {
    match op {
        UnaryOp::Neg => -x,
        UnaryOp::Abs => x.abs(),
        UnaryOp::Floor => x.floor(),
        UnaryOp::Fract => x - x.floor(),
        UnaryOp::Sin => x.sin(),
        UnaryOp::Cos => x.cos(),
        UnaryOp::Sqrt => x.max(0.0).sqrt(),
        UnaryOp::Exp => x.exp(),
        UnaryOp::Sign => sign(x),
        UnaryOp::Saturate => x.clamp(0.0, 1.0),
        UnaryOp::Not => {
            if x != 0.0 {
                0.0
            } else {
                1.0
            }
        }
    }
}

fn binary(op: BinaryOp, a: f32, b: f32) -> f32 {
    match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        BinaryOp::Min => a.min(b),
        BinaryOp::Max => a.max(b),
        BinaryOp::Pow => a.powf(b),
        BinaryOp::Atan2 => a.atan2(b),
        BinaryOp::Step => {
            if b >= a {
                1.0
            } else {
                0.0
            }
        }
        BinaryOp::Mod => a - b * (a / b).floor(),
    }
}

fn smoothstep(e0: f32, e1: f32, x: f32) -> f32 {
    let t = ((x - e0) / (e1 - e0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn bool_f32(v: bool) -> f32 {
    if v { 1.0 } else { 0.0 }
}

/// Execute `program` for one texel at `uv`. `regs` is scratch reused across texels.
pub(crate) fn shade(
    program: &Program,
    env: &FragmentEnv<'_>,
    uv: [f32; 2],
    regs: &mut Vec<[f32; 4]>,
) -> [f32; 4] {
    regs.clear();
    for instr in &program.instrs {
        let ty = instr.ty;
        let w = ty.width();
        let r = |reg: Reg| -> ([f32; 4], Ty) {
            let i = reg as usize;
            (regs[i], program.instrs[i].ty)
        };
        let mut out = [0.0f32; 4];
        match &instr.op {
            Op::Const(v) => out = *v,
            Op::Uniform(slot) => {
                out = env
                    .uniforms
                    .get(*slot as usize)
                    .copied()
                    .unwrap_or_default();
            }
            Op::Builtin(Builtin::Uv) => out[..2].copy_from_slice(&uv),
            Op::Builtin(Builtin::Resolution) => out[..2].copy_from_slice(&env.resolution),
            Op::Builtin(Builtin::Time) => out[0] = env.time,
            Op::TexelSize(slot) => {
                if let Some(tex) = env.textures.get(*slot as usize) {
                    let (tw, th) = tex.size();
                    out[0] = 1.0 / tw.max(1) as f32;
                    out[1] = 1.0 / th.max(1) as f32;
                }
            }
            Op::Sample(slot, uv_reg) => {
                let (c, _) = r(*uv_reg);
                if let Some(tex) = env.textures.get(*slot as usize) {
                    out = tex.sample([c[0], c[1]]);
                }
            }
            Op::Unary(op, a) => {
                let (a, _) = r(*a);
                for i in 0..w {
                    out[i] = unary(*op, a[i]);
                }
            }
            Op::Binary(op, a, b) => {
                let (a, ta) = r(*a);
                let (b, tb) = r(*b);
                for i in 0..w {
                    out[i] = binary(*op, lane(&a, ta, i), lane(&b, tb, i));
                }
            }
            Op::Compare(op, a, b) => {
                let (a, _) = r(*a);
                let (b, _) = r(*b);
                out[0] = bool_f32(match op {
                    CmpOp::Lt => a[0] < b[0],
                    CmpOp::Le => a[0] <= b[0],
                    CmpOp::Gt => a[0] > b[0],
                    CmpOp::Ge => a[0] >= b[0],
                });
            }
            Op::Logic(op, a, b) => {
                let (a, _) = r(*a);
                let (b, _) = r(*b);
                let (a, b) = (a[0] != 0.0, b[0] != 0.0);
                out[0] = bool_f32(match op {
                    LogicOp::And => a && b,
                    LogicOp::Or => a || b,
                });
            }
            Op::Select(c, t, f) => {
                let (c, _) = r(*c);
                out = if c[0] != 0.0 { r(*t).0 } else { r(*f).0 };
            }
            Op::Func(func, args) => {
                let (a, ta) = r(args[0]);
                let aw = ta.width();
                match func {
                    Func::Dot => {
                        let (b, _) = r(args[1]);
                        out[0] = (0..aw).map(|i| a[i] * b[i]).sum();
                    }
                    Func::Length => {
                        out[0] = (0..aw).map(|i| a[i] * a[i]).sum::<f32>().sqrt();
                    }
                    Func::Distance => {
                        let (b, _) = r(args[1]);
                        out[0] = (0..aw)
                            .map(|i| (a[i] - b[i]) * (a[i] - b[i]))
                            .sum::<f32>()
                            .sqrt();
                    }
                    Func::Normalize => {
                        let len = (0..aw).map(|i| a[i] * a[i]).sum::<f32>().sqrt();
                        let d = len.max(1e-6);
                        for i in 0..aw {
                            out[i] = a[i] / d;
                        }
                    }
                    Func::Mix => {
                        let (b, _) = r(args[1]);
                        let (t, tt) = r(args[2]);
                        for i in 0..w {
                            let t = lane(&t, tt, i);
                            out[i] = a[i] * (1.0 - t) + b[i] * t;
                        }
                    }
                    Func::Clamp => {
                        let (lo, tlo) = r(args[1]);
                        let (hi, thi) = r(args[2]);
                        for i in 0..w {
                            out[i] = a[i].max(lane(&lo, tlo, i)).min(lane(&hi, thi, i));
                        }
                    }
                    Func::Smoothstep => {
                        let (e1, t1) = r(args[1]);
                        let (x, _) = r(args[2]);
                        for i in 0..w {
                            out[i] = smoothstep(lane(&a, ta, i), lane(&e1, t1, i), x[i]);
                        }
                    }
                }
            }
            Op::Swizzle(a, lanes) => {
                let (a, _) = r(*a);
                for i in 0..w {
                    out[i] = a[lanes[i] as usize];
                }
            }
            Op::Construct(parts) => {
                if parts.len() == 1 && program.instrs[parts[0] as usize].ty.width() == 1 {
                    let v = regs[parts[0] as usize][0];
                    for o in out.iter_mut().take(w) {
                        *o = v;
                    }
                } else {
                    let mut at = 0;
                    for p in parts {
                        let (v, tv) = r(*p);
                        for c in v.iter().take(tv.width()) {
                            if at < 4 {
                                out[at] = *c;
                            }
                            at += 1;
                        }
                    }
                }
            }
            Op::Blend([base, effect, mode, opacity]) => {
                let (b, _) = r(*base);
                let (e, _) = r(*effect);
                let (m, _) = r(*mode);
                let (o, _) = r(*opacity);
                let mode = BlendMode::from_index(m[0].round().max(0.0) as u32)
                    .unwrap_or(BlendMode::Normal);
                let c = composite([b[0], b[1], b[2]], [e[0], e[1], e[2]], mode, o[0]);
                out[..3].copy_from_slice(&c);
            }
        }
        regs.push(out);
    }
    regs.get(program.output as usize).copied().unwrap_or_default()
}

#[cfg(test)]
#[path = "../../tests/unit/shader/interp.rs"]
mod tests;
