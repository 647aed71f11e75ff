use super::*;
use crate::shader::ir::{blend, lit, mix};

fn tint_graph(block: &mut UniformBlock) -> Expr {
    let amount = block.declare("amount", Ty::F32, [0.5, 0.0, 0.0, 0.0]);
    let src = Expr::sample(0, Expr::uv());
    let amount = block.expr(amount);
    let rgb = mix(src.rgb(), src.rgb() * 0.5, amount);
    crate::shader::ir::join([rgb, src.w()])
}

#[test]
fn shared_nodes_lower_once() {
    let mut block = UniformBlock::new();
    let root = tint_graph(&mut block);
    let program = Program::compile("tint", &root, &block).unwrap();
    let samples = program
        .instrs
        .iter()
        .filter(|i| matches!(i.op, Op::Sample(..)))
        .count();
    assert_eq!(samples, 1);
    assert_eq!(program.input_slots(), 1);
    assert_eq!(program.uniform_count(), 1);
    assert!(!program.uses_blend());
}

#[test]
fn structural_hash_is_stable_and_layout_sensitive() {
    let mut a = UniformBlock::new();
    let mut b = UniformBlock::new();
    let pa = Program::compile("a", &tint_graph(&mut a), &a).unwrap();
    let pb = Program::compile("b", &tint_graph(&mut b), &b).unwrap();
    assert_eq!(pa.hash(), pb.hash(), "label does not affect the hash");

    b.declare("extra", Ty::F32, [0.0; 4]);
    let pc = Program::compile("c", &tint_graph(&mut b), &b).unwrap();
    assert_ne!(pa.hash(), pc.hash());
}

#[test]
fn non_vec4_root_is_rejected() {
    let block = UniformBlock::new();
    let err = Program::compile("bad", &Expr::uv(), &block).unwrap_err();
    assert!(err.to_string().starts_with("shader error:"));
}

#[test]
fn foreign_uniform_handle_is_rejected() {
    let mut other = UniformBlock::new();
    let h = other.declare("x", Ty::F32, [0.0; 4]);
    let root = crate::shader::ir::vec4(other.expr(h), 0.0, 0.0, 1.0);
    let err = Program::compile("bad", &root, &UniformBlock::new()).unwrap_err();
    assert!(err.to_string().contains("not declared"));
}

#[test]
fn blend_nodes_are_tracked() {
    let block = UniformBlock::new();
    let src = Expr::sample(0, Expr::uv());
    let rgb = blend(src.rgb(), src.rgb(), lit(1.0), lit(0.5));
    let root = crate::shader::ir::join([rgb, src.w()]);
    let program = Program::compile("blend", &root, &block).unwrap();
    assert!(program.uses_blend());
}

#[test]
fn passthrough_reads_slot_zero() {
    let p = Program::passthrough();
    assert_eq!(p.input_slots(), 1);
    assert_eq!(p.instr_count(), 2);
    assert_eq!(p.label(), "passthrough");
}
