use super::*;
use crate::shader::uniforms::UniformBlock;

#[test]
fn scalar_broadcasts_against_vectors() {
    let v = Expr::uv() * 2.0;
    assert_eq!(v.ty(), Ty::Vec2);
    let w = 1.0 - Expr::sample(0, Expr::uv()).rgb();
    assert_eq!(w.ty(), Ty::Vec3);
    assert_eq!(min(Expr::uv(), 0.5).ty(), Ty::Vec2);
}

#[test]
#[should_panic(expected = "operand mismatch")]
fn mismatched_vectors_panic() {
    let _ = Expr::uv() + Expr::sample(0, Expr::uv());
}

#[test]
#[should_panic(expected = "finite")]
fn non_finite_literal_panics() {
    let _ = lit(f32::NAN);
}

#[test]
fn swizzle_accepts_rgba_and_xyzw() {
    let c = Expr::sample(0, Expr::uv());
    assert_eq!(c.swizzle("bgr").ty(), Ty::Vec3);
    assert_eq!(c.swizzle("w").ty(), Ty::F32);
    assert_eq!(Expr::uv().swizzle("yx").ty(), Ty::Vec2);
}

#[test]
#[should_panic(expected = "reads past")]
fn swizzle_past_width_panics() {
    let _ = Expr::uv().swizzle("xyz");
}

#[test]
fn join_sums_widths() {
    let rgb = Expr::sample(0, Expr::uv()).rgb();
    assert_eq!(join([rgb, lit(1.0)]).ty(), Ty::Vec4);
    assert_eq!(vec3(Expr::uv(), 0.0, 1.0).ty(), Ty::Vec4);
}

#[test]
fn select_splats_scalar_branch() {
    let cond = Expr::uv().x().lt(0.5);
    let e = select(&cond, rgb_const([1.0, 0.0, 0.0]), 0.0);
    assert_eq!(e.ty(), Ty::Vec3);
    assert_eq!(cond.to_f32().ty(), Ty::F32);
}

#[test]
fn uniform_expr_carries_declared_type() {
    let mut block = UniformBlock::new();
    let h = block.declare("tint", Ty::Vec3, [1.0, 0.5, 0.0, 0.0]);
    let e = block.expr(h);
    assert_eq!(e.ty(), Ty::Vec3);
    assert!(e.is_same(&e.clone()));
    assert!(!e.is_same(&block.expr(h)));
}

#[test]
fn mix_promotes_scalar_endpoint() {
    let e = mix(0.0, Expr::uv(), 0.25);
    assert_eq!(e.ty(), Ty::Vec2);
}
