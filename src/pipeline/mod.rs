//! Layer-stack orchestration: options, the pipeline manager and the host facade.

pub(crate) mod frame_clock;
pub(crate) mod host;
pub(crate) mod manager;
pub(crate) mod opts;
