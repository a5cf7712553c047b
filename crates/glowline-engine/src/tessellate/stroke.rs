use std::f32::consts::PI;

use crate::coords::Vec2;
use crate::error::{VgError, VgResult};
use crate::style::{LineCap, LineJoin, StrokeStyle};

use super::{Counting, TriangleSink};

/// Triangles per round cap fan.
pub const ROUND_CAP_STEPS: usize = 12;

/// A non-degenerate segment with its unit direction.
#[derive(Debug, Copy, Clone)]
struct Segment {
    a: Vec2,
    b: Vec2,
    dir: Vec2,
}

/// Strokes a polyline into a constant-width ribbon.
///
/// Each non-degenerate segment becomes exactly two triangles. Joins never add
/// triangles: a miter join moves the shared end corners of two adjacent quads
/// onto the miter point (when within `miter_limit`); bevel and round joins
/// keep rectangular ends. Caps are only emitted for open polylines.
///
/// Returns the number of triangles emitted.
pub fn stroke_polyline<S: TriangleSink + ?Sized>(
    points: &[Vec2],
    closed: bool,
    style: &StrokeStyle,
    sink: &mut S,
) -> VgResult<usize> {
    if points.len() < 2 {
        return Err(VgError::invalid(format!(
            "polyline needs at least 2 points, got {}",
            points.len()
        )));
    }
    if !points.iter().all(|p| p.is_finite()) {
        return Err(VgError::invalid("polyline point is not finite"));
    }

    let hw = style.width * 0.5;
    let segments = collect_segments(points, closed);
    let mut sink = Counting { inner: sink, triangles: 0 };
    if segments.is_empty() {
        return Ok(0);
    }

    let n = segments.len();
    for (i, seg) in segments.iter().enumerate() {
        let normal = seg.dir.perp() * hw;
        let (mut start_l, mut start_r) = (seg.a + normal, seg.a - normal);
        let (mut end_l, mut end_r) = (seg.b + normal, seg.b - normal);

        if !closed && style.cap == LineCap::Square {
            let ext = seg.dir * hw;
            if i == 0 {
                start_l = start_l - ext;
                start_r = start_r - ext;
            }
            if i == n - 1 {
                end_l = end_l + ext;
                end_r = end_r + ext;
            }
        }

        if style.join == LineJoin::Miter {
            let prev = neighbour(i, n, closed, Side::Prev).map(|j| &segments[j]);
            let next = neighbour(i, n, closed, Side::Next).map(|j| &segments[j]);

            if let Some(m) = prev.and_then(|p| miter_offset(p.dir, seg.dir, hw, style.miter_limit)) {
                start_l = seg.a + m;
                start_r = seg.a - m;
            }
            if let Some(m) = next.and_then(|nx| miter_offset(seg.dir, nx.dir, hw, style.miter_limit)) {
                end_l = seg.b + m;
                end_r = seg.b - m;
            }
        }

        sink.push_triangle(start_l, end_l, end_r);
        sink.push_triangle(start_l, end_r, start_r);
    }

    if !closed && style.cap == LineCap::Round {
        let first = segments[0];
        let last = segments[n - 1];
        round_cap(first.a, -first.dir, hw, &mut sink);
        round_cap(last.b, last.dir, hw, &mut sink);
    }

    Ok(sink.triangles)
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Side {
    Prev,
    Next,
}

/// Index of the segment adjacent to `i` on `side`; closed polylines wrap.
fn neighbour(i: usize, n: usize, closed: bool, side: Side) -> Option<usize> {
    let wraps = closed && n > 1;
    match side {
        Side::Prev if i > 0 => Some(i - 1),
        Side::Prev => wraps.then(|| n - 1),
        Side::Next if i + 1 < n => Some(i + 1),
        Side::Next => wraps.then_some(0),
    }
}

fn collect_segments(points: &[Vec2], closed: bool) -> Vec<Segment> {
    let count = if closed { points.len() } else { points.len() - 1 };
    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        // Zero-length segments have no direction; skip instead of emitting NaNs.
        if let Some(dir) = (b - a).normalized() {
            out.push(Segment { a, b, dir });
        }
    }
    out
}

/// Offset from the shared vertex to the miter corner on the left side, or
/// `None` when the join is too sharp for `limit` (or the turn is a reversal).
fn miter_offset(d0: Vec2, d1: Vec2, hw: f32, limit: f32) -> Option<Vec2> {
    let n0 = d0.perp();
    let m = (n0 + d1.perp()).normalized()?;
    let cos_half = m.dot(n0);
    if cos_half <= f32::EPSILON || 1.0 / cos_half > limit {
        return None;
    }
    Some(m * (hw / cos_half))
}

/// Half-disc fan centered on `center`, sweeping −90°..+90° around `outward`.
fn round_cap<S: TriangleSink + ?Sized>(center: Vec2, outward: Vec2, hw: f32, sink: &mut S) {
    let base = outward.y.atan2(outward.x);
    let at = |k: usize| {
        let theta = base - PI * 0.5 + PI * (k as f32 / ROUND_CAP_STEPS as f32);
        center + Vec2::new(theta.cos(), theta.sin()) * hw
    };
    for k in 0..ROUND_CAP_STEPS {
        sink.push_triangle(center, at(k), at(k + 1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Color;

    fn v(x: f32, y: f32) -> Vec2 { Vec2::new(x, y) }

    fn style(cap: LineCap, join: LineJoin) -> StrokeStyle {
        StrokeStyle::new(2.0, Color::white()).with_cap(cap).with_join(join)
    }

    fn zigzag(n: usize) -> Vec<Vec2> {
        (0..n).map(|i| v(i as f32 * 10.0, if i % 2 == 0 { 0.0 } else { 7.0 })).collect()
    }

    // ── segment quads ─────────────────────────────────────────────────────

    #[test]
    fn open_butt_polyline_emits_two_triangles_per_segment() {
        for join in [LineJoin::Miter, LineJoin::Round, LineJoin::Bevel] {
            for n in 2..9 {
                let mut out: Vec<Vec2> = Vec::new();
                let tris = stroke_polyline(&zigzag(n), false, &style(LineCap::Butt, join), &mut out).unwrap();
                assert_eq!(tris, 2 * (n - 1));
                assert_eq!(out.len(), 6 * (n - 1));
            }
        }
    }

    #[test]
    fn horizontal_segment_spans_half_width_each_side() {
        let mut out: Vec<Vec2> = Vec::new();
        stroke_polyline(&[v(0.0, 0.0), v(10.0, 0.0)], false, &style(LineCap::Butt, LineJoin::Miter), &mut out).unwrap();
        let ys: Vec<f32> = out.iter().map(|p| p.y.abs()).collect();
        assert!(ys.iter().all(|&y| (y - 1.0).abs() < 1e-6));
        assert!(out.iter().all(|p| p.x == 0.0 || p.x == 10.0));
    }

    #[test]
    fn degenerate_segments_emit_nothing() {
        let mut out: Vec<Vec2> = Vec::new();
        let pts = [v(1.0, 1.0), v(1.0, 1.0), v(5.0, 1.0)];
        let tris = stroke_polyline(&pts, false, &style(LineCap::Butt, LineJoin::Miter), &mut out).unwrap();
        assert_eq!(tris, 2);
        assert!(out.iter().all(|p| p.is_finite()));

        out.clear();
        let tris = stroke_polyline(&[v(2.0, 2.0), v(2.0, 2.0)], false, &style(LineCap::Round, LineJoin::Miter), &mut out).unwrap();
        assert_eq!(tris, 0);
        assert!(out.is_empty());
    }

    #[test]
    fn rejects_short_or_non_finite_input() {
        let mut out: Vec<Vec2> = Vec::new();
        let s = style(LineCap::Butt, LineJoin::Miter);
        assert!(stroke_polyline(&[v(0.0, 0.0)], false, &s, &mut out).is_err());
        assert!(stroke_polyline(&[v(0.0, 0.0), v(f32::NAN, 1.0)], false, &s, &mut out).is_err());
    }

    #[test]
    fn neighbours_wrap_only_when_closed() {
        assert_eq!(neighbour(0, 3, false, Side::Prev), None);
        assert_eq!(neighbour(2, 3, false, Side::Next), None);
        assert_eq!(neighbour(1, 3, false, Side::Prev), Some(0));
        assert_eq!(neighbour(1, 3, false, Side::Next), Some(2));
        assert_eq!(neighbour(0, 3, true, Side::Prev), Some(2));
        assert_eq!(neighbour(2, 3, true, Side::Next), Some(0));
        // A single closed segment has no distinct neighbour.
        assert_eq!(neighbour(0, 1, true, Side::Prev), None);
    }

    // ── closed polylines ──────────────────────────────────────────────────

    #[test]
    fn closed_polyline_includes_wrap_segment_without_caps() {
        let tri = [v(0.0, 0.0), v(10.0, 0.0), v(5.0, 8.0)];
        for cap in [LineCap::Butt, LineCap::Round, LineCap::Square] {
            let mut out: Vec<Vec2> = Vec::new();
            let tris = stroke_polyline(&tri, true, &style(cap, LineJoin::Bevel), &mut out).unwrap();
            assert_eq!(tris, 2 * tri.len());
        }
    }

    // ── caps ──────────────────────────────────────────────────────────────

    #[test]
    fn round_caps_add_a_fan_per_endpoint() {
        let mut out: Vec<Vec2> = Vec::new();
        let tris = stroke_polyline(&[v(0.0, 0.0), v(10.0, 0.0)], false, &style(LineCap::Round, LineJoin::Miter), &mut out).unwrap();
        assert_eq!(tris, 2 + 2 * ROUND_CAP_STEPS);
        // The start fan bulges to the left of x = 0, the end fan to the right of x = 10.
        let min_x = out.iter().map(|p| p.x).fold(f32::INFINITY, f32::min);
        let max_x = out.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max);
        assert!((min_x + 1.0).abs() < 1e-5);
        assert!((max_x - 11.0).abs() < 1e-5);
    }

    #[test]
    fn square_caps_extend_by_half_width() {
        let mut out: Vec<Vec2> = Vec::new();
        let tris = stroke_polyline(&[v(0.0, 0.0), v(10.0, 0.0)], false, &style(LineCap::Square, LineJoin::Miter), &mut out).unwrap();
        assert_eq!(tris, 2);
        let min_x = out.iter().map(|p| p.x).fold(f32::INFINITY, f32::min);
        let max_x = out.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max);
        assert_eq!(min_x, -1.0);
        assert_eq!(max_x, 11.0);
    }

    // ── joins ─────────────────────────────────────────────────────────────

    #[test]
    fn right_angle_miter_meets_at_corner() {
        let mut out: Vec<Vec2> = Vec::new();
        let pts = [v(0.0, 0.0), v(10.0, 0.0), v(10.0, 10.0)];
        stroke_polyline(&pts, false, &style(LineCap::Butt, LineJoin::Miter), &mut out).unwrap();
        // Outer miter corner of a 90° turn sits at (11, -1) for half-width 1.
        assert!(out.iter().any(|p| (*p - v(11.0, -1.0)).length() < 1e-4));
        assert!(out.iter().any(|p| (*p - v(9.0, 1.0)).length() < 1e-4));
    }

    #[test]
    fn sharp_miter_beyond_limit_falls_back_to_square_ends() {
        let mut out: Vec<Vec2> = Vec::new();
        let pts = [v(0.0, 0.0), v(10.0, 0.0), v(0.0, 0.5)];
        let s = style(LineCap::Butt, LineJoin::Miter).with_miter_limit(1.5);
        stroke_polyline(&pts, false, &s, &mut out).unwrap();
        assert!(out.iter().all(|p| p.x <= 10.0 + 1.0));
    }
}
