//! Draw-call batching.
//!
//! Runs are coalesced only with the immediately preceding command, so
//! submission order is preserved exactly and the caller controls batching by
//! ordering draws: back-to-back draws with an identical style merge, an
//! interleaved style breaks the run.

use crate::coords::{Color, Rect};
use crate::style::{BlendMode, FillStyle, StencilState, StrokeStyle};

/// Per-command render state. Compared field-by-field with exact float
/// equality; no epsilon.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DrawStyle {
    pub color: Color,
    pub intensity: f32,
    pub blend: BlendMode,
    pub stencil: Option<StencilState>,
    /// Device-space scissor active when the run was recorded.
    pub clip: Option<Rect>,
}

impl DrawStyle {
    pub fn from_stroke(style: &StrokeStyle, clip: Option<Rect>) -> Self {
        Self {
            color: style.color,
            intensity: style.intensity,
            blend: style.blend,
            stencil: style.stencil,
            clip,
        }
    }

    pub fn from_fill(style: &FillStyle, clip: Option<Rect>) -> Self {
        Self {
            color: style.color,
            intensity: style.intensity,
            blend: style.blend,
            stencil: style.stencil,
            clip,
        }
    }

    /// Vertex color: RGB scaled by intensity, alpha untouched.
    #[inline]
    pub fn vertex_color(&self) -> [f32; 4] {
        self.color.scaled(self.intensity).to_array()
    }
}

/// A contiguous vertex run sharing one style.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DrawCommand {
    pub first_vertex: u32,
    pub vertex_count: u32,
    pub style: DrawStyle,
}

impl DrawCommand {
    #[inline]
    pub fn end_vertex(&self) -> u32 {
        self.first_vertex + self.vertex_count
    }

    #[inline]
    pub fn triangle_count(&self) -> u32 {
        self.vertex_count / 3
    }
}

/// Frame command list.
#[derive(Debug, Default)]
pub struct DrawBatch {
    commands: Vec<DrawCommand>,
}

impl DrawBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a run, extending the previous command when it ends exactly
    /// at `first_vertex` with an identical style. Empty runs are ignored.
    pub fn push_run(&mut self, first_vertex: u32, vertex_count: u32, style: DrawStyle) {
        if vertex_count == 0 {
            return;
        }
        if let Some(last) = self.commands.last_mut() {
            if last.end_vertex() == first_vertex && last.style == style {
                last.vertex_count += vertex_count;
                return;
            }
        }
        self.commands.push(DrawCommand { first_vertex, vertex_count, style });
    }

    /// Drops all commands; capacity is retained.
    #[inline]
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    #[inline]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.commands.capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style(r: f32, blend: BlendMode) -> DrawStyle {
        DrawStyle {
            color: Color::new(r, 1.0, 1.0, 1.0),
            intensity: 1.0,
            blend,
            stencil: None,
            clip: None,
        }
    }

    #[test]
    fn adjacent_identical_runs_merge() {
        let mut b = DrawBatch::new();
        b.push_run(0, 6, style(1.0, BlendMode::Alpha));
        b.push_run(6, 6, style(1.0, BlendMode::Alpha));
        assert_eq!(b.len(), 1);
        assert_eq!(b.commands()[0].vertex_count, 12);
    }

    #[test]
    fn interleaved_style_breaks_the_run() {
        let mut b = DrawBatch::new();
        b.push_run(0, 6, style(1.0, BlendMode::Alpha));
        b.push_run(6, 6, style(0.5, BlendMode::Alpha));
        b.push_run(12, 6, style(1.0, BlendMode::Alpha));
        assert_eq!(b.len(), 3);
    }

    #[test]
    fn non_contiguous_runs_do_not_merge() {
        let mut b = DrawBatch::new();
        b.push_run(0, 6, style(1.0, BlendMode::Additive));
        b.push_run(9, 6, style(1.0, BlendMode::Additive));
        assert_eq!(b.len(), 2);
    }

    #[test]
    fn tiny_float_difference_is_a_different_style() {
        let mut b = DrawBatch::new();
        b.push_run(0, 3, style(1.0, BlendMode::Alpha));
        b.push_run(3, 3, style(1.0 - f32::EPSILON, BlendMode::Alpha));
        assert_eq!(b.len(), 2);
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut b = DrawBatch::new();
        for i in 0..64 {
            b.push_run(i * 3, 3, style(if i % 2 == 0 { 1.0 } else { 0.0 }, BlendMode::Alpha));
        }
        let cap = b.capacity();
        b.clear();
        assert!(b.is_empty());
        assert_eq!(b.capacity(), cap);
    }

    #[test]
    fn empty_runs_are_ignored() {
        let mut b = DrawBatch::new();
        b.push_run(0, 0, style(1.0, BlendMode::Alpha));
        assert!(b.is_empty());
    }
}
