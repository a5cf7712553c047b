use crate::coords::{Rect, Vec2};
use crate::error::VgResult;
use crate::path::Subpath;
use crate::style::{FillStyle, StrokeStyle};

use super::{Backend, BackendKind, FrameGeometry, FrameInfo, FrameTarget};

/// CPU-only backend.
///
/// Records geometry exactly like the GPU backend but never touches a device;
/// the frame is consumed through `debug_rasterize_rgba8`. Stencil state is
/// recorded but ignored by the preview rasterizer.
#[derive(Debug, Default)]
pub struct SoftwareBackend {
    geometry: FrameGeometry,
    frame: Option<FrameInfo>,
    warned_stencil: bool,
    warned_target: bool,
}

impl SoftwareBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn note_stencil(&mut self, used: bool) {
        if used && !self.warned_stencil {
            log::warn!("software backend: stencil state is recorded but not rasterized");
            self.warned_stencil = true;
        }
    }
}

impl Backend for SoftwareBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Software
    }

    fn begin_frame(&mut self, frame: &FrameInfo, target: Option<FrameTarget>) -> VgResult<()> {
        if target.is_some() && !self.warned_target {
            log::debug!("software backend: GPU frame target ignored");
            self.warned_target = true;
        }
        self.geometry.reset();
        self.frame = Some(*frame);
        Ok(())
    }

    fn end_frame(&mut self) -> VgResult<()> {
        let stats = self.geometry.stats();
        if let Some(frame) = self.frame.take() {
            log::trace!(
                "software frame {}x{}: {} commands, {} triangles",
                frame.width,
                frame.height,
                stats.commands,
                stats.triangles
            );
        }
        Ok(())
    }

    fn draw_polyline(
        &mut self,
        points: &[Vec2],
        closed: bool,
        style: &StrokeStyle,
        clip: Option<Rect>,
    ) -> VgResult<()> {
        self.note_stencil(style.stencil.is_some());
        self.geometry.push_stroke(&[(points, closed)], style, clip)
    }

    fn draw_path_stroke(
        &mut self,
        subpaths: &[Subpath],
        style: &StrokeStyle,
        clip: Option<Rect>,
    ) -> VgResult<()> {
        self.note_stencil(style.stencil.is_some());
        self.geometry.push_subpaths(subpaths, style, clip)
    }

    fn fill_convex(&mut self, points: &[Vec2], style: &FillStyle, clip: Option<Rect>) -> VgResult<()> {
        self.note_stencil(style.stencil.is_some());
        self.geometry.push_fill(points, style, clip)
    }

    fn geometry(&self) -> &FrameGeometry {
        &self.geometry
    }
}
