//! Typed shader intermediate representation.
//!
//! Effects describe their fragment stage as an expression DAG built from [`ir::Expr`] handles.
//! [`program::Program::compile`] lowers the DAG into a linear SSA program that two backends
//! consume: [`interp`] executes it per texel on the CPU device and [`wgsl`] emits WGSL for the
//! wgpu device. Uniform values live in a per-pass [`uniforms::UniformBlock`] addressed by stable
//! handles, so parameter changes never require recompilation.

pub(crate) mod interp;
pub mod ir;
pub mod program;
pub mod uniforms;
pub mod wgsl;
