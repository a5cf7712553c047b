//! Headless GPU device helpers.
//!
//! The engine never creates a device for the host's window; these helpers
//! exist for offscreen capture (the studio's `--gpu` path) and for hosts
//! without a windowing layer.

mod gpu;
mod init;
mod target;

pub use gpu::HeadlessGpu;
pub use init::GpuInit;
pub use target::{OffscreenTarget, OFFSCREEN_FORMAT};
