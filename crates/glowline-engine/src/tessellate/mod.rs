//! Stroke and fill tessellation.
//!
//! Everything here produces flat triangle lists; no index buffers. Output goes
//! through [`TriangleSink`] so the same code feeds the frame vertex array and
//! plain position lists in tests.

mod fill;
mod stroke;

pub use fill::fill_convex;
pub use stroke::{stroke_polyline, ROUND_CAP_STEPS};

use crate::coords::Vec2;

/// Receiver for emitted triangles.
pub trait TriangleSink {
    fn push_triangle(&mut self, a: Vec2, b: Vec2, c: Vec2);
}

impl TriangleSink for Vec<Vec2> {
    #[inline]
    fn push_triangle(&mut self, a: Vec2, b: Vec2, c: Vec2) {
        self.extend_from_slice(&[a, b, c]);
    }
}

/// Counts emitted triangles on top of another sink.
pub(crate) struct Counting<'a, S: TriangleSink + ?Sized> {
    pub inner: &'a mut S,
    pub triangles: usize,
}

impl<S: TriangleSink + ?Sized> TriangleSink for Counting<'_, S> {
    #[inline]
    fn push_triangle(&mut self, a: Vec2, b: Vec2, c: Vec2) {
        self.triangles += 1;
        self.inner.push_triangle(a, b, c);
    }
}
