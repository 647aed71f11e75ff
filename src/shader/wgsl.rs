//! WGSL emission for lowered programs.

use std::fmt::Write as _;

use crate::effects::blend::WGSL_PRELUDE;
use crate::shader::ir::{BinaryOp, Builtin, CmpOp, Func, LogicOp, Ty, UnaryOp};
use crate::shader::program::{Op, Program, Reg};
use crate::shader::uniforms::HEADER_SLOTS;

pub(crate) const VERTEX_ENTRY: &str = "vs_main";
pub(crate) const FRAGMENT_ENTRY: &str = "fs_main";

const VERTEX_STAGE: &str = r#"
struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@vertex
fn vs_main(@builtin(vertex_index) vi: u32) -> VsOut {
    var p = array<vec2<f32>, 3>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(3.0, -1.0),
        vec2<f32>(-1.0, 3.0),
    );
    let pos = p[vi];
    var out: VsOut;
    out.pos = vec4<f32>(pos, 0.0, 1.0);
    out.uv = vec2<f32>((pos.x + 1.0) * 0.5, 1.0 - (pos.y + 1.0) * 0.5);
    return out;
}
"#;

fn ty_name(ty: Ty) -> &'static str {
    match ty {
        Ty::F32 => "f32",
        Ty::Vec2 => "vec2<f32>",
        Ty::Vec3 => "vec3<f32>",
        Ty::Vec4 => "vec4<f32>",
        Ty::Bool => "bool",
    }
}

/// WGSL float literal; always carries a `.` or exponent so it never parses as an integer.
fn float_lit(v: f32) -> String {
    let v = if v.is_finite() { v } else { 0.0 };
    let s = format!("{v:?}");
    let s = if s.contains('.') || s.contains('e') || s.contains("inf") || s.contains("NaN") {
        s
    } else {
        format!("{s}.0")
    };
    if v < 0.0 { format!("({s})") } else { s }
}

fn constant(ty: Ty, v: &[f32; 4]) -> String {
    match ty {
        Ty::F32 => float_lit(v[0]),
        Ty::Bool => (if v[0] != 0.0 { "true" } else { "false" }).to_owned(),
        _ => {
            let parts: Vec<String> = v[..ty.width()].iter().map(|c| float_lit(*c)).collect();
            format!("{}({})", ty_name(ty), parts.join(", "))
        }
    }
}

const LANES: [char; 4] = ['x', 'y', 'z', 'w'];

fn slot_read(slot: usize, ty: Ty) -> String {
    let base = format!("u.slots[{slot}]");
    match ty.width() {
        1 => format!("{base}.x"),
        2 => format!("{base}.xy"),
        3 => format!("{base}.xyz"),
        _ => base,
    }
}

/// Emit a complete WGSL module (vertex + fragment) for `program`.
pub fn emit(program: &Program) -> String {
    let slots = HEADER_SLOTS + program.uniform_count();
    let mut src = String::with_capacity(4096);
    let _ = writeln!(src, "// {}", program.label());
    let _ = writeln!(src, "struct Uniforms {{\n    slots: array<vec4<f32>, {slots}>,\n}}");
    let _ = writeln!(src, "@group(0) @binding(0) var<uniform> u: Uniforms;");
    for i in 0..program.input_slots() as u32 {
        let _ = writeln!(
            src,
            "@group(0) @binding({}) var t{i}: texture_2d<f32>;",
            1 + 2 * i
        );
        let _ = writeln!(src, "@group(0) @binding({}) var s{i}: sampler;", 2 + 2 * i);
    }
    src.push_str(VERTEX_STAGE);
    if program.uses_blend() {
        src.push_str(WGSL_PRELUDE);
    }

    let reg = |r: Reg| format!("r{r}");
    let ty_of = |r: Reg| program.instrs[r as usize].ty;
    let splat = |r: Reg, to: Ty| -> String {
        if ty_of(r).width() == 1 && to.width() > 1 {
            format!("{}(r{r})", ty_name(to))
        } else {
            format!("r{r}")
        }
    };

    src.push_str("\n@fragment\nfn fs_main(in: VsOut) -> @location(0) vec4<f32> {\n");
    for (i, instr) in program.instrs.iter().enumerate() {
        let ty = instr.ty;
        let expr = match &instr.op {
            Op::Const(v) => constant(ty, v),
            Op::Uniform(slot) => slot_read(HEADER_SLOTS + *slot as usize, ty),
            Op::Builtin(Builtin::Uv) => "in.uv".to_owned(),
            Op::Builtin(Builtin::Resolution) => "u.slots[0].xy".to_owned(),
            Op::Builtin(Builtin::Time) => "u.slots[0].z".to_owned(),
            Op::TexelSize(s) => format!("u.slots[{}].xy", 1 + *s as usize),
            Op::Sample(s, uv) => format!("textureSampleLevel(t{s}, s{s}, {}, 0.0)", reg(*uv)),
            Op::Unary(op, a) => {
                let a = reg(*a);
                match op {
                    UnaryOp::Neg => format!("-{a}"),
                    UnaryOp::Abs => format!("abs({a})"),
                    UnaryOp::Floor => format!("floor({a})"),
                    UnaryOp::Fract => format!("({a} - floor({a}))"),
                    UnaryOp::Sin => format!("sin({a})"),
                    UnaryOp::Cos => format!("cos({a})"),
                    UnaryOp::Sqrt => format!("sqrt(max({a}, {}))", constant(ty, &[0.0; 4])),
                    UnaryOp::Exp => format!("exp({a})"),
                    UnaryOp::Sign => format!("sign({a})"),
                    UnaryOp::Saturate => format!("saturate({a})"),
                    UnaryOp::Not => format!("!{a}"),
                }
            }
            Op::Binary(op, a, b) => {
                let (ra, rb) = (reg(*a), reg(*b));
                match op {
                    BinaryOp::Add => format!("{ra} + {rb}"),
                    BinaryOp::Sub => format!("{ra} - {rb}"),
                    BinaryOp::Mul => format!("{ra} * {rb}"),
                    BinaryOp::Div => format!("{ra} / {rb}"),
                    BinaryOp::Mod => format!("{ra} - {rb} * floor({ra} / {rb})"),
                    BinaryOp::Min => format!("min({}, {})", splat(*a, ty), splat(*b, ty)),
                    BinaryOp::Max => format!("max({}, {})", splat(*a, ty), splat(*b, ty)),
                    BinaryOp::Pow => format!("pow({}, {})", splat(*a, ty), splat(*b, ty)),
                    BinaryOp::Atan2 => format!("atan2({}, {})", splat(*a, ty), splat(*b, ty)),
                    BinaryOp::Step => format!("step({}, {})", splat(*a, ty), splat(*b, ty)),
                }
            }
            Op::Compare(op, a, b) => {
                let sym = match op {
                    CmpOp::Lt => "<",
                    CmpOp::Le => "<=",
                    CmpOp::Gt => ">",
                    CmpOp::Ge => ">=",
                };
                format!("{} {sym} {}", reg(*a), reg(*b))
            }
            Op::Logic(op, a, b) => {
                let sym = match op {
                    LogicOp::And => "&&",
                    LogicOp::Or => "||",
                };
                format!("{} {sym} {}", reg(*a), reg(*b))
            }
            // WGSL `select(f, t, cond)`.
            Op::Select(c, t, f) => format!("select({}, {}, {})", reg(*f), reg(*t), reg(*c)),
            Op::Func(func, args) => match func {
                Func::Dot => format!("dot({}, {})", reg(args[0]), reg(args[1])),
                Func::Length => format!("length({})", reg(args[0])),
                Func::Distance => format!("distance({}, {})", reg(args[0]), reg(args[1])),
                Func::Normalize => {
                    format!("{0} / max(length({0}), 1e-6)", reg(args[0]))
                }
                Func::Mix => format!(
                    "mix({}, {}, {})",
                    reg(args[0]),
                    reg(args[1]),
                    reg(args[2])
                ),
                Func::Clamp => format!(
                    "clamp({}, {}, {})",
                    reg(args[0]),
                    splat(args[1], ty),
                    splat(args[2], ty)
                ),
                Func::Smoothstep => {
                    let x = reg(args[2]);
                    let e0 = splat(args[0], ty);
                    let e1 = splat(args[1], ty);
                    let zero = constant(ty, &[0.0; 4]);
                    let one = constant(ty, &[1.0; 4]);
                    format!(
                        "smoothstep({zero}, {one}, clamp(({x} - {e0}) / ({e1} - {e0}), {zero}, {one}))"
                    )
                }
            },
            Op::Swizzle(a, lanes) => {
                let pattern: String = lanes[..ty.width()]
                    .iter()
                    .map(|l| LANES[*l as usize])
                    .collect();
                format!("{}.{pattern}", reg(*a))
            }
            Op::Construct(parts) => {
                let args: Vec<String> = parts.iter().map(|p| reg(*p)).collect();
                format!("{}({})", ty_name(ty), args.join(", "))
            }
            Op::Blend([b, e, m, o]) => format!(
                "blend_composite({}, {}, {}, {})",
                reg(*b),
                reg(*e),
                reg(*m),
                reg(*o)
            ),
        };
        let _ = writeln!(src, "    let r{i}: {} = {expr};", ty_name(ty));
    }
    let _ = writeln!(src, "    return r{};\n}}", program.output);
    src
}

#[cfg(test)]
#[path = "../../tests/unit/shader/wgsl.rs"]
mod tests;
