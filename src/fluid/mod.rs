//! Pointer-driven 2D fluid: input coalescing, the grid solver and the interactivity pass.

pub(crate) mod config;
pub(crate) mod pass;
pub(crate) mod pointer;
pub(crate) mod pressure;
pub(crate) mod sim;
