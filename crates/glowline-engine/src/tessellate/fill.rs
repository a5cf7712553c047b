use crate::coords::Vec2;
use crate::error::{VgError, VgResult};

use super::{Counting, TriangleSink};

/// Triangulates a convex polygon as a fan around vertex 0: `(0, i, i+1)`.
///
/// Concave input produces overlapping/incorrect coverage; callers that need
/// general polygons must triangulate them first. Returns the triangle count.
pub fn fill_convex<S: TriangleSink + ?Sized>(points: &[Vec2], sink: &mut S) -> VgResult<usize> {
    if points.len() < 3 {
        return Err(VgError::invalid(format!(
            "convex fill needs at least 3 points, got {}",
            points.len()
        )));
    }
    if !points.iter().all(|p| p.is_finite()) {
        return Err(VgError::invalid("convex fill point is not finite"));
    }

    let mut sink = Counting { inner: sink, triangles: 0 };
    let p0 = points[0];
    for w in points[1..].windows(2) {
        sink.push_triangle(p0, w[0], w[1]);
    }
    Ok(sink.triangles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fan_emits_n_minus_two_triangles() {
        let quad = [
            Vec2::new(0.0, 0.0),
            Vec2::new(4.0, 0.0),
            Vec2::new(4.0, 4.0),
            Vec2::new(0.0, 4.0),
        ];
        let mut out: Vec<Vec2> = Vec::new();
        assert_eq!(fill_convex(&quad, &mut out).unwrap(), 2);
        assert_eq!(out, vec![quad[0], quad[1], quad[2], quad[0], quad[2], quad[3]]);
    }

    #[test]
    fn fewer_than_three_points_is_rejected() {
        let mut out: Vec<Vec2> = Vec::new();
        assert!(fill_convex(&[Vec2::zero(), Vec2::new(1.0, 0.0)], &mut out).is_err());
        assert!(out.is_empty());
    }
}
