//! Geometry value types shared by the tessellator, context and rasterizer.
//!
//! Canonical CPU space:
//! - Device pixels
//! - Origin top-left
//! - +X right, +Y down
//!
//! The wgpu backend converts to NDC in the vertex shader using a viewport uniform.

mod affine;
mod color;
mod rect;
mod vec2;

pub use affine::Affine;
pub use color::Color;
pub use rect::Rect;
pub use vec2::Vec2;
