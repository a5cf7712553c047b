//! Backend abstraction.
//!
//! A context drives exactly one [`Backend`] for its lifetime. Backends own
//! the frame's CPU vertex array ([`FrameGeometry`]) and decide how it reaches
//! pixels: the software backend only keeps it for the CPU preview, the wgpu
//! backend uploads it and records GPU draws at `end_frame`.
//!
//! All points handed to a backend are already in device space.

mod geometry;
mod software;
mod gpu;

pub use geometry::{FrameGeometry, FrameStats, Vertex};
pub use software::SoftwareBackend;
pub use gpu::{WgpuBackend, WgpuBackendDesc, STENCIL_FORMAT};

use crate::coords::{Rect, Vec2};
use crate::crt::{self, CrtProfile, PixelTarget};
use crate::error::{VgError, VgResult};
use crate::path::Subpath;
use crate::style::{FillStyle, StrokeStyle};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BackendKind {
    Software,
    Wgpu,
}

/// Backend selection passed to [`Context::new`](crate::Context::new).
#[derive(Debug, Clone)]
pub enum BackendDesc {
    Software,
    Wgpu(WgpuBackendDesc),
}

impl BackendDesc {
    pub fn create(self) -> VgResult<Box<dyn Backend>> {
        Ok(match self {
            BackendDesc::Software => Box::new(SoftwareBackend::new()),
            BackendDesc::Wgpu(desc) => Box::new(WgpuBackend::new(desc)?),
        })
    }
}

/// Views a GPU backend records into. Owned by the host; the backend only
/// holds them for the duration of one frame.
#[derive(Debug)]
pub struct FrameTarget {
    pub color_view: wgpu::TextureView,
    /// Single-sample resolve target when the color view is multisampled.
    pub resolve_view: Option<wgpu::TextureView>,
    /// `Stencil8` view; required when the backend was created with a stencil attachment.
    pub stencil_view: Option<wgpu::TextureView>,
}

/// Frame request passed to `begin_frame`.
#[derive(Debug)]
pub struct FrameDesc {
    pub width: u32,
    pub height: u32,
    pub dt_seconds: f32,
    pub target: Option<FrameTarget>,
}

impl FrameDesc {
    /// A frame without a GPU target (software preview or stats only).
    pub fn offscreen(width: u32, height: u32, dt_seconds: f32) -> Self {
        Self { width, height, dt_seconds, target: None }
    }

    pub fn with_target(mut self, target: FrameTarget) -> Self {
        self.target = Some(target);
        self
    }

    pub fn info(&self) -> FrameInfo {
        FrameInfo { width: self.width, height: self.height, dt_seconds: self.dt_seconds }
    }
}

/// Plain-value part of the active frame descriptor.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameInfo {
    pub width: u32,
    pub height: u32,
    pub dt_seconds: f32,
}

/// Operation table every backend implements.
pub trait Backend {
    fn kind(&self) -> BackendKind;

    /// Resets per-frame vertex/draw state.
    fn begin_frame(&mut self, frame: &FrameInfo, target: Option<FrameTarget>) -> VgResult<()>;

    /// Flushes the batched frame.
    fn end_frame(&mut self) -> VgResult<()>;

    fn draw_polyline(
        &mut self,
        points: &[Vec2],
        closed: bool,
        style: &StrokeStyle,
        clip: Option<Rect>,
    ) -> VgResult<()>;

    fn draw_path_stroke(
        &mut self,
        subpaths: &[Subpath],
        style: &StrokeStyle,
        clip: Option<Rect>,
    ) -> VgResult<()>;

    fn fill_convex(&mut self, points: &[Vec2], style: &FillStyle, clip: Option<Rect>) -> VgResult<()>;

    /// Resets the stencil buffer to zero before the next draws.
    fn clear_stencil(&mut self) -> VgResult<()> {
        Err(VgError::unsupported(format!("{:?} backend has no stencil buffer", self.kind())))
    }

    /// Geometry recorded since the last `begin_frame`.
    fn geometry(&self) -> &FrameGeometry;

    /// Rasterizes the recorded geometry on the CPU with the CRT model applied.
    fn debug_rasterize_rgba8(
        &self,
        target: &mut PixelTarget<'_>,
        profile: &CrtProfile,
        frame_index: u64,
    ) -> VgResult<()> {
        crt::rasterize_frame(self.geometry(), profile, frame_index, target)
    }
}
