//! Typed expression graph that every pass program is built from.

use std::ops::{Add, Div, Mul, Neg, Sub};
use std::rc::Rc;

use crate::shader::uniforms::UniformHandle;

/// Maximum number of input textures a program may sample.
pub const MAX_INPUTS: u8 = 4;

/// Value type of an expression node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Ty {
    /// Scalar.
    F32,
    /// Two-component vector.
    Vec2,
    /// Three-component vector.
    Vec3,
    /// Four-component vector.
    Vec4,
    /// Comparison result.
    Bool,
}

impl Ty {
    /// Component count; booleans count as one.
    pub fn width(self) -> usize {
        match self {
            Ty::F32 | Ty::Bool => 1,
            Ty::Vec2 => 2,
            Ty::Vec3 => 3,
            Ty::Vec4 => 4,
        }
    }

    /// Float vector of `width` components. Panics outside `1..=4`.
    pub fn vector(width: usize) -> Ty {
        match width {
            1 => Ty::F32,
            2 => Ty::Vec2,
            3 => Ty::Vec3,
            4 => Ty::Vec4,
            _ => panic!("no float vector type of width {width}"),
        }
    }

    /// Whether the type is a float scalar or vector.
    pub fn is_float(self) -> bool {
        self != Ty::Bool
    }

    pub(crate) fn code(self) -> u8 {
        match self {
            Ty::F32 => 1,
            Ty::Vec2 => 2,
            Ty::Vec3 => 3,
            Ty::Vec4 => 4,
            Ty::Bool => 5,
        }
    }
}

/// Per-fragment value provided by the device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Builtin {
    /// Fragment position in `0..1`, origin top-left, at texel centres.
    Uv,
    /// Output target size in pixels.
    Resolution,
    /// Seconds since the host started rendering.
    Time,
}

/// One-operand operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Negation.
    Neg,
    /// Absolute value.
    Abs,
    /// Round down.
    Floor,
    /// `x - floor(x)`.
    Fract,
    /// Sine.
    Sin,
    /// Cosine.
    Cos,
    /// Square root of the clamped-positive operand.
    Sqrt,
    /// Natural exponential.
    Exp,
    /// `-1`, `0` or `1`.
    Sign,
    /// Clamp to `0..=1`.
    Saturate,
    /// Boolean negation.
    Not,
}

/// Two-operand arithmetic; a scalar operand broadcasts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// Sum.
    Add,
    /// Difference.
    Sub,
    /// Product.
    Mul,
    /// Quotient.
    Div,
    /// Minimum.
    Min,
    /// Maximum.
    Max,
    /// Power.
    Pow,
    /// Angle of `(x, y)`.
    Atan2,
    /// `1` where the right operand reaches the edge.
    Step,
    /// Floored modulo.
    Mod,
}

/// Scalar comparisons.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CmpOp {
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

/// Boolean combinators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LogicOp {
    /// Both true.
    And,
    /// Either true.
    Or,
}

/// Built-in functions with more than one argument or a type-changing result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Func {
    /// Dot product.
    Dot,
    /// Euclidean length.
    Length,
    /// Distance between two points.
    Distance,
    /// Unit vector; zero stays zero.
    Normalize,
    /// Linear interpolation.
    Mix,
    /// Clamp between bounds.
    Clamp,
    /// Hermite step between two edges.
    Smoothstep,
}

pub(crate) enum NodeKind {
    Const([f32; 4]),
    Uniform(UniformHandle),
    Builtin(Builtin),
    TexelSize(u8),
    Sample(u8, Expr),
    Unary(UnaryOp, Expr),
    Binary(BinaryOp, Expr, Expr),
    Compare(CmpOp, Expr, Expr),
    Logic(LogicOp, Expr, Expr),
    Select(Expr, Expr, Expr),
    Func(Func, Vec<Expr>),
    Swizzle(Expr, [u8; 4]),
    Construct(Vec<Expr>),
    Blend {
        base: Expr,
        effect: Expr,
        mode: Expr,
        opacity: Expr,
    },
}

pub(crate) struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) ty: Ty,
}

/// Handle to a typed node of a shader expression DAG. Cloning shares the node.
#[derive(Clone)]
pub struct Expr(pub(crate) Rc<Node>);

impl std::fmt::Debug for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Expr<{:?}>", self.ty())
    }
}

/// Anything usable as an operand: expressions, references to them, and float literals.
pub trait IntoExpr {
    /// Convert into an expression node.
    fn into_expr(self) -> Expr;
}

impl IntoExpr for Expr {
    fn into_expr(self) -> Expr {
        self
    }
}

impl IntoExpr for &Expr {
    fn into_expr(self) -> Expr {
        self.clone()
    }
}

impl IntoExpr for f32 {
    fn into_expr(self) -> Expr {
        Expr::lit(self)
    }
}

fn arith_ty(what: &str, a: Ty, b: Ty) -> Ty {
    assert!(
        a.is_float() && b.is_float(),
        "`{what}` expects float operands, got {a:?} and {b:?}"
    );
    if a == b {
        a
    } else if a == Ty::F32 {
        b
    } else if b == Ty::F32 {
        a
    } else {
        panic!("`{what}` operand mismatch: {a:?} vs {b:?}")
    }
}

impl Expr {
    fn node(kind: NodeKind, ty: Ty) -> Self {
        Self(Rc::new(Node { kind, ty }))
    }

    /// Value type.
    pub fn ty(&self) -> Ty {
        self.0.ty
    }

    /// A scalar literal. Panics on non-finite values.
    pub fn lit(v: f32) -> Self {
        assert!(v.is_finite(), "shader literal must be finite, got {v}");
        Self::node(NodeKind::Const([v, 0.0, 0.0, 0.0]), Ty::F32)
    }

    /// A literal of any float type.
    pub fn constant(ty: Ty, value: [f32; 4]) -> Self {
        assert!(ty.is_float(), "constant must be a float type");
        assert!(
            value[..ty.width()].iter().all(|v| v.is_finite()),
            "shader constant must be finite"
        );
        Self::node(NodeKind::Const(value), ty)
    }

    /// Read of a declared uniform.
    pub fn uniform(handle: UniformHandle, ty: Ty) -> Self {
        Self::node(NodeKind::Uniform(handle), ty)
    }

    /// The fragment coordinate.
    pub fn uv() -> Self {
        Self::node(NodeKind::Builtin(Builtin::Uv), Ty::Vec2)
    }

    /// Output size in pixels.
    pub fn resolution() -> Self {
        Self::node(NodeKind::Builtin(Builtin::Resolution), Ty::Vec2)
    }

    /// Host time in seconds.
    pub fn time() -> Self {
        Self::node(NodeKind::Builtin(Builtin::Time), Ty::F32)
    }

    /// `1 / size` of the texture bound at `slot`.
    pub fn texel_size(slot: u8) -> Self {
        assert!(slot < MAX_INPUTS, "texture slot {slot} out of range");
        Self::node(NodeKind::TexelSize(slot), Ty::Vec2)
    }

    /// Bilinear or nearest read of the texture bound at `slot`, per its filters.
    pub fn sample(slot: u8, uv: impl IntoExpr) -> Self {
        let uv = uv.into_expr();
        assert!(slot < MAX_INPUTS, "texture slot {slot} out of range");
        assert_eq!(uv.ty(), Ty::Vec2, "sample coordinates must be vec2");
        Self::node(NodeKind::Sample(slot, uv), Ty::Vec4)
    }

    fn unary(&self, op: UnaryOp) -> Self {
        let ty = self.ty();
        match op {
            UnaryOp::Not => assert_eq!(ty, Ty::Bool, "`not` expects bool"),
            _ => assert!(ty.is_float(), "`{op:?}` expects a float operand"),
        }
        Self::node(NodeKind::Unary(op, self.clone()), ty)
    }

    /// Absolute value.
    pub fn abs(&self) -> Self {
        self.unary(UnaryOp::Abs)
    }

    /// Round down.
    pub fn floor(&self) -> Self {
        self.unary(UnaryOp::Floor)
    }

    /// Fractional part.
    pub fn fract(&self) -> Self {
        self.unary(UnaryOp::Fract)
    }

    /// Sine.
    pub fn sin(&self) -> Self {
        self.unary(UnaryOp::Sin)
    }

    /// Cosine.
    pub fn cos(&self) -> Self {
        self.unary(UnaryOp::Cos)
    }

    /// Square root of `max(x, 0)`.
    pub fn sqrt(&self) -> Self {
        self.unary(UnaryOp::Sqrt)
    }

    /// Natural exponential.
    pub fn exp(&self) -> Self {
        self.unary(UnaryOp::Exp)
    }

    /// Sign.
    pub fn sign(&self) -> Self {
        self.unary(UnaryOp::Sign)
    }

    /// Clamp to `0..=1`.
    pub fn saturate(&self) -> Self {
        self.unary(UnaryOp::Saturate)
    }

    /// Boolean negation.
    pub fn not(&self) -> Self {
        self.unary(UnaryOp::Not)
    }

    /// Euclidean length.
    pub fn length(&self) -> Self {
        call(Func::Length, vec![self.clone()])
    }

    /// Unit vector.
    pub fn normalize(&self) -> Self {
        call(Func::Normalize, vec![self.clone()])
    }

    /// Swizzle with a pattern over `xyzw` (or `rgba`), e.g. `"yx"` or `"rgb"`.
    pub fn swizzle(&self, pattern: &str) -> Self {
        let width = self.ty().width();
        assert!(
            self.ty().is_float() && width > 1,
            "swizzle needs a float vector, got {:?}",
            self.ty()
        );
        assert!(
            (1..=4).contains(&pattern.len()),
            "swizzle pattern `{pattern}` must have 1..=4 components"
        );
        let mut lanes = [0u8; 4];
        for (i, c) in pattern.chars().enumerate() {
            let lane = match c {
                'x' | 'r' => 0,
                'y' | 'g' => 1,
                'z' | 'b' => 2,
                'w' | 'a' => 3,
                _ => panic!("invalid swizzle component `{c}`"),
            };
            assert!(
                (lane as usize) < width,
                "swizzle `{pattern}` reads past a {:?}",
                self.ty()
            );
            lanes[i] = lane;
        }
        Self::node(
            NodeKind::Swizzle(self.clone(), lanes),
            Ty::vector(pattern.len()),
        )
    }

    /// First component.
    pub fn x(&self) -> Self {
        self.swizzle("x")
    }

    /// Second component.
    pub fn y(&self) -> Self {
        self.swizzle("y")
    }

    /// Third component.
    pub fn z(&self) -> Self {
        self.swizzle("z")
    }

    /// Fourth component.
    pub fn w(&self) -> Self {
        self.swizzle("w")
    }

    /// First two components.
    pub fn xy(&self) -> Self {
        self.swizzle("xy")
    }

    /// First three components.
    pub fn rgb(&self) -> Self {
        self.swizzle("xyz")
    }

    /// Broadcast a scalar to a vector type.
    pub fn splat(&self, ty: Ty) -> Self {
        assert_eq!(self.ty(), Ty::F32, "only scalars can be splatted");
        if ty == Ty::F32 {
            return self.clone();
        }
        Self::node(NodeKind::Construct(vec![self.clone()]), ty)
    }

    fn compare(&self, op: CmpOp, other: impl IntoExpr) -> Self {
        let other = other.into_expr();
        assert!(
            self.ty() == Ty::F32 && other.ty() == Ty::F32,
            "comparisons are scalar-only, got {:?} and {:?}",
            self.ty(),
            other.ty()
        );
        Self::node(NodeKind::Compare(op, self.clone(), other), Ty::Bool)
    }

    /// `self < other`
    pub fn lt(&self, other: impl IntoExpr) -> Self {
        self.compare(CmpOp::Lt, other)
    }

    /// `self <= other`
    pub fn le(&self, other: impl IntoExpr) -> Self {
        self.compare(CmpOp::Le, other)
    }

    /// `self > other`
    pub fn gt(&self, other: impl IntoExpr) -> Self {
        self.compare(CmpOp::Gt, other)
    }

    /// `self >= other`
    pub fn ge(&self, other: impl IntoExpr) -> Self {
        self.compare(CmpOp::Ge, other)
    }

    fn logic(&self, op: LogicOp, other: &Expr) -> Self {
        assert!(
            self.ty() == Ty::Bool && other.ty() == Ty::Bool,
            "logic ops expect bool operands"
        );
        Self::node(NodeKind::Logic(op, self.clone(), other.clone()), Ty::Bool)
    }

    /// Logical and.
    pub fn and(&self, other: &Expr) -> Self {
        self.logic(LogicOp::And, other)
    }

    /// Logical or.
    pub fn or(&self, other: &Expr) -> Self {
        self.logic(LogicOp::Or, other)
    }

    /// Bool to `0.0` / `1.0`.
    pub fn to_f32(&self) -> Self {
        assert_eq!(self.ty(), Ty::Bool, "to_f32 expects bool");
        select(self, 1.0, 0.0)
    }

    /// Whether both handles share one node.
    pub fn is_same(&self, other: &Expr) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// Shorthand for [`Expr::lit`].
pub fn lit(v: f32) -> Expr {
    Expr::lit(v)
}

pub(crate) fn binary(op: BinaryOp, a: Expr, b: Expr) -> Expr {
    let ty = arith_ty(&format!("{op:?}"), a.ty(), b.ty());
    Expr::node(NodeKind::Binary(op, a, b), ty)
}

fn call(func: Func, args: Vec<Expr>) -> Expr {
    let ty = match func {
        Func::Dot | Func::Distance => {
            assert_eq!(args[0].ty(), args[1].ty(), "`{func:?}` operands must match");
            assert!(args[0].ty().is_float(), "`{func:?}` expects floats");
            Ty::F32
        }
        Func::Length => {
            assert!(args[0].ty().is_float(), "`length` expects floats");
            Ty::F32
        }
        Func::Normalize => {
            assert!(args[0].ty().is_float(), "`normalize` expects floats");
            args[0].ty()
        }
        Func::Mix => {
            let ty = arith_ty("mix", args[0].ty(), args[1].ty());
            assert_eq!(args[0].ty(), args[1].ty(), "`mix` endpoints must match");
            let t = args[2].ty();
            assert!(t == Ty::F32 || t == ty, "`mix` factor must be scalar or {ty:?}");
            ty
        }
        Func::Clamp => {
            let ty = args[0].ty();
            assert!(ty.is_float(), "`clamp` expects floats");
            for bound in &args[1..] {
                assert!(
                    bound.ty() == Ty::F32 || bound.ty() == ty,
                    "`clamp` bounds must be scalar or {ty:?}"
                );
            }
            ty
        }
        Func::Smoothstep => {
            let ty = args[2].ty();
            assert!(ty.is_float(), "`smoothstep` expects floats");
            for edge in &args[..2] {
                assert!(
                    edge.ty() == Ty::F32 || edge.ty() == ty,
                    "`smoothstep` edges must be scalar or {ty:?}"
                );
            }
            ty
        }
    };
    Expr::node(NodeKind::Func(func, args), ty)
}

/// Component-wise minimum.
pub fn min(a: impl IntoExpr, b: impl IntoExpr) -> Expr {
    binary(BinaryOp::Min, a.into_expr(), b.into_expr())
}

/// Component-wise maximum.
pub fn max(a: impl IntoExpr, b: impl IntoExpr) -> Expr {
    binary(BinaryOp::Max, a.into_expr(), b.into_expr())
}

/// Component-wise power.
pub fn pow(a: impl IntoExpr, b: impl IntoExpr) -> Expr {
    binary(BinaryOp::Pow, a.into_expr(), b.into_expr())
}

/// Angle of `(x, y)` in radians.
pub fn atan2(y: impl IntoExpr, x: impl IntoExpr) -> Expr {
    binary(BinaryOp::Atan2, y.into_expr(), x.into_expr())
}

/// `1.0` where `x >= edge`, else `0.0`.
pub fn step(edge: impl IntoExpr, x: impl IntoExpr) -> Expr {
    binary(BinaryOp::Step, edge.into_expr(), x.into_expr())
}

/// Floored modulo, `a - b * floor(a / b)`.
pub fn modulo(a: impl IntoExpr, b: impl IntoExpr) -> Expr {
    binary(BinaryOp::Mod, a.into_expr(), b.into_expr())
}

/// Dot product.
pub fn dot(a: impl IntoExpr, b: impl IntoExpr) -> Expr {
    call(Func::Dot, vec![a.into_expr(), b.into_expr()])
}

/// Euclidean length.
pub fn length(a: impl IntoExpr) -> Expr {
    call(Func::Length, vec![a.into_expr()])
}

/// Distance between two points.
pub fn distance(a: impl IntoExpr, b: impl IntoExpr) -> Expr {
    call(Func::Distance, vec![a.into_expr(), b.into_expr()])
}

/// `a / max(length(a), 1e-6)`; zero vectors stay zero.
pub fn normalize(a: impl IntoExpr) -> Expr {
    call(Func::Normalize, vec![a.into_expr()])
}

/// `a + (b - a) * t`; a scalar endpoint is broadcast.
pub fn mix(a: impl IntoExpr, b: impl IntoExpr, t: impl IntoExpr) -> Expr {
    let a = a.into_expr();
    let b = b.into_expr();
    let (a, b) = match (a.ty(), b.ty()) {
        (Ty::F32, tb) if tb != Ty::F32 => (a.splat(tb), b),
        (ta, Ty::F32) if ta != Ty::F32 => (a, b.splat(ta)),
        _ => (a, b),
    };
    call(Func::Mix, vec![a, b, t.into_expr()])
}

/// Clamp between `lo` and `hi`.
pub fn clamp(x: impl IntoExpr, lo: impl IntoExpr, hi: impl IntoExpr) -> Expr {
    call(Func::Clamp, vec![x.into_expr(), lo.into_expr(), hi.into_expr()])
}

/// Hermite interpolation of `x` between the edges.
pub fn smoothstep(e0: impl IntoExpr, e1: impl IntoExpr, x: impl IntoExpr) -> Expr {
    call(
        Func::Smoothstep,
        vec![e0.into_expr(), e1.into_expr(), x.into_expr()],
    )
}

/// `if cond { on_true } else { on_false }`; a scalar branch is broadcast to the other's type.
pub fn select(cond: impl IntoExpr, on_true: impl IntoExpr, on_false: impl IntoExpr) -> Expr {
    let cond = cond.into_expr();
    assert_eq!(cond.ty(), Ty::Bool, "select condition must be bool");
    let t = on_true.into_expr();
    let f = on_false.into_expr();
    let (t, f) = match (t.ty(), f.ty()) {
        (a, b) if a == b => (t, f),
        (Ty::F32, b) => (t.splat(b), f),
        (a, Ty::F32) => (t, f.splat(a)),
        (a, b) => panic!("select branch mismatch: {a:?} vs {b:?}"),
    };
    let ty = t.ty();
    Expr::node(NodeKind::Select(cond, t, f), ty)
}

/// Concatenate scalars and vectors into one vector, e.g. `join([rgb, lit(1.0)])`.
pub fn join(parts: impl IntoIterator<Item = Expr>) -> Expr {
    let parts: Vec<Expr> = parts.into_iter().collect();
    let width: usize = parts
        .iter()
        .map(|p| {
            assert!(p.ty().is_float(), "cannot join {:?}", p.ty());
            p.ty().width()
        })
        .sum();
    assert!(
        (2..=4).contains(&width),
        "joined vector width must be 2..=4, got {width}"
    );
    Expr::node(NodeKind::Construct(parts), Ty::vector(width))
}

/// A vec2 from two scalars.
pub fn vec2(x: impl IntoExpr, y: impl IntoExpr) -> Expr {
    join([x.into_expr(), y.into_expr()])
}

/// A vec3 from three scalars.
pub fn vec3(x: impl IntoExpr, y: impl IntoExpr, z: impl IntoExpr) -> Expr {
    join([x.into_expr(), y.into_expr(), z.into_expr()])
}

/// A vec4 from four scalars.
pub fn vec4(x: impl IntoExpr, y: impl IntoExpr, z: impl IntoExpr, w: impl IntoExpr) -> Expr {
    join([x.into_expr(), y.into_expr(), z.into_expr(), w.into_expr()])
}

/// A constant RGB color.
pub fn rgb_const(c: [f32; 3]) -> Expr {
    Expr::constant(Ty::Vec3, [c[0], c[1], c[2], 0.0])
}

/// Composite `effect` over `base` (both vec3) with a blend mode index and opacity.
pub fn blend(
    base: impl IntoExpr,
    effect: impl IntoExpr,
    mode: impl IntoExpr,
    opacity: impl IntoExpr,
) -> Expr {
    let base = base.into_expr();
    let effect = effect.into_expr();
    let mode = mode.into_expr();
    let opacity = opacity.into_expr();
    assert_eq!(base.ty(), Ty::Vec3, "blend base must be vec3");
    assert_eq!(effect.ty(), Ty::Vec3, "blend effect must be vec3");
    assert_eq!(mode.ty(), Ty::F32, "blend mode must be a scalar index");
    assert_eq!(opacity.ty(), Ty::F32, "blend opacity must be scalar");
    Expr::node(
        NodeKind::Blend {
            base,
            effect,
            mode,
            opacity,
        },
        Ty::Vec3,
    )
}

/// Rec. 709 luminance of an rgb expression.
pub fn luminance(rgb: &Expr) -> Expr {
    dot(rgb, rgb_const([0.2126, 0.7152, 0.0722]))
}

/// 2D rotation of `p` by `angle` radians.
pub fn rotate2(p: &Expr, angle: &Expr) -> Expr {
    let c = angle.cos();
    let s = angle.sin();
    vec2(
        p.x() * &c - p.y() * &s,
        p.x() * &s + p.y() * &c,
    )
}

/// Cheap hash of a vec2 into `0..1`.
pub fn hash21(p: &Expr) -> Expr {
    (dot(p, vec2(12.9898, 78.233)).sin() * 43758.547).fract()
}

macro_rules! arith_op {
    ($trait:ident, $method:ident, $op:expr) => {
        impl<R: IntoExpr> $trait<R> for Expr {
            type Output = Expr;
            fn $method(self, rhs: R) -> Expr {
                binary($op, self, rhs.into_expr())
            }
        }

        impl<R: IntoExpr> $trait<R> for &Expr {
            type Output = Expr;
            fn $method(self, rhs: R) -> Expr {
                binary($op, self.clone(), rhs.into_expr())
            }
        }

        impl $trait<Expr> for f32 {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                binary($op, Expr::lit(self), rhs)
            }
        }

        impl $trait<&Expr> for f32 {
            type Output = Expr;
            fn $method(self, rhs: &Expr) -> Expr {
                binary($op, Expr::lit(self), rhs.clone())
            }
        }
    };
}

arith_op!(Add, add, BinaryOp::Add);
arith_op!(Sub, sub, BinaryOp::Sub);
arith_op!(Mul, mul, BinaryOp::Mul);
arith_op!(Div, div, BinaryOp::Div);

impl Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        self.unary(UnaryOp::Neg)
    }
}

impl Neg for &Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        self.unary(UnaryOp::Neg)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/shader/ir.rs"]
mod tests;
