//! Glowline engine crate.
//!
//! Vector stroke rendering with a CRT phosphor look: paths and polylines are
//! tessellated into triangle runs, batched by style and handed to a backend
//! (wgpu or the CPU preview rasterizer).

pub mod backend;
pub mod batch;
pub mod context;
pub mod coords;
pub mod crt;
pub mod device;
pub mod error;
pub mod logging;
pub mod path;
pub mod style;
pub mod tessellate;
pub mod text;
pub mod widgets;

pub use backend::{Backend, BackendDesc, BackendKind, FrameDesc, FrameStats, FrameTarget, WgpuBackendDesc};
pub use context::{Context, ContextConfig, ContextId, Palette};
pub use coords::{Affine, Color, Rect, Vec2};
pub use crt::{CrtProfile, RetroParams};
pub use error::{ErrorCode, VgError, VgResult};
pub use path::Path;
pub use style::{BlendMode, FillStyle, LineCap, LineJoin, StencilMode, StencilState, StrokeStyle};
pub use widgets::ButtonState;
