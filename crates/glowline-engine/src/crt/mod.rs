//! CRT phosphor simulation model.
//!
//! - [`CrtProfile`]: the twelve display tunables (plus the legacy
//!   [`RetroParams`] view)
//! - [`rasterize_frame`]: CPU triangle rasterizer into RGBA8 with per-command
//!   jitter/flicker and box-blur bloom
//! - [`effects`]: persistence, scanline, vignette, barrel and noise helpers
//!   for hosts maintaining their own preview/accumulation buffers

mod bloom;
pub mod effects;
mod noise;
mod profile;
mod raster;

pub use bloom::{apply_bloom, apply_bloom_linear, bloom_radius};
pub use effects::persistence_factor;
pub use noise::{hash32, signed_noise};
pub use profile::{CrtProfile, RetroParams};
pub use raster::{rasterize_frame, PixelTarget};
