pub(crate) mod cpu;
pub(crate) mod device;
#[cfg(feature = "gpu")]
pub(crate) mod gpu;
pub(crate) mod ping_pong;
pub(crate) mod target_pool;
