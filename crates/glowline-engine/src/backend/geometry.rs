use bytemuck::{Pod, Zeroable};

use crate::batch::{DrawBatch, DrawCommand, DrawStyle};
use crate::coords::{Rect, Vec2};
use crate::error::{VgError, VgResult};
use crate::path::Subpath;
use crate::style::{FillStyle, StrokeStyle};
use crate::tessellate::{self, TriangleSink};

/// GPU vertex: device-space position plus intensity-scaled straight RGBA.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub pos: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x2, // pos
        1 => Float32x4  // color
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.pos[0], self.pos[1])
    }
}

/// Per-frame counters.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct FrameStats {
    pub commands: usize,
    pub vertices: usize,
    pub triangles: usize,
}

/// CPU-side frame geometry shared by every backend: one vertex array plus
/// the batched command list over it.
///
/// Both arrays are reset at frame start and never shrink.
#[derive(Debug, Default)]
pub struct FrameGeometry {
    vertices: Vec<Vertex>,
    batch: DrawBatch,
}

struct VertexWriter<'a> {
    vertices: &'a mut Vec<Vertex>,
    color: [f32; 4],
}

impl TriangleSink for VertexWriter<'_> {
    #[inline]
    fn push_triangle(&mut self, a: Vec2, b: Vec2, c: Vec2) {
        let color = self.color;
        self.vertices.extend_from_slice(&[
            Vertex { pos: [a.x, a.y], color },
            Vertex { pos: [b.x, b.y], color },
            Vertex { pos: [c.x, c.y], color },
        ]);
    }
}

impl FrameGeometry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.vertices.clear();
        self.batch.clear();
    }

    #[inline]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    #[inline]
    pub fn commands(&self) -> &[DrawCommand] {
        self.batch.commands()
    }

    /// Allocated vertex capacity (high-water mark across frames).
    #[inline]
    pub fn vertex_capacity(&self) -> usize {
        self.vertices.capacity()
    }

    pub fn stats(&self) -> FrameStats {
        FrameStats {
            commands: self.batch.len(),
            vertices: self.vertices.len(),
            triangles: self.vertices.len() / 3,
        }
    }

    /// Strokes every polyline into one vertex run with one (possibly merged)
    /// command.
    pub fn push_stroke(
        &mut self,
        polylines: &[(&[Vec2], bool)],
        style: &StrokeStyle,
        clip: Option<Rect>,
    ) -> VgResult<()> {
        style.validate()?;
        let draw_style = DrawStyle::from_stroke(style, clip);
        self.push_run(draw_style, |sink| {
            for &(points, closed) in polylines {
                tessellate::stroke_polyline(points, closed, style, sink)?;
            }
            Ok(())
        })
    }

    pub fn push_subpaths(
        &mut self,
        subpaths: &[Subpath],
        style: &StrokeStyle,
        clip: Option<Rect>,
    ) -> VgResult<()> {
        let polylines: Vec<(&[Vec2], bool)> = subpaths
            .iter()
            .map(|s| (s.points.as_slice(), s.closed))
            .collect();
        self.push_stroke(&polylines, style, clip)
    }

    pub fn push_fill(&mut self, points: &[Vec2], style: &FillStyle, clip: Option<Rect>) -> VgResult<()> {
        style.validate()?;
        let draw_style = DrawStyle::from_fill(style, clip);
        self.push_run(draw_style, |sink| tessellate::fill_convex(points, sink).map(|_| ()))
    }

    /// Runs `emit` against the vertex array; on failure the partial run is
    /// rolled back so the array never holds half-tessellated geometry.
    fn push_run<F>(&mut self, style: DrawStyle, emit: F) -> VgResult<()>
    where
        F: FnOnce(&mut VertexWriter<'_>) -> VgResult<()>,
    {
        let first = self.vertices.len();
        let mut writer = VertexWriter { vertices: &mut self.vertices, color: style.vertex_color() };
        if let Err(err) = emit(&mut writer) {
            self.vertices.truncate(first);
            return Err(err);
        }

        let (Ok(first_vertex), Ok(end)) = (u32::try_from(first), u32::try_from(self.vertices.len())) else {
            self.vertices.truncate(first);
            return Err(VgError::oom("frame vertex count exceeds u32 range"));
        };
        self.batch.push_run(first_vertex, end - first_vertex, style);
        Ok(())
    }
}
