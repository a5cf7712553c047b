use crate::coords::{Affine, Vec2};
use crate::error::{VgError, VgResult};

use super::PathCmd;

/// Fixed number of line segments each cubic is split into.
pub const CUBIC_SEGMENTS: usize = 16;

/// A flattened polyline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Subpath {
    pub points: Vec<Vec2>,
    pub closed: bool,
}

/// Appends the [`CUBIC_SEGMENTS`] end points of the cubic `p0 c0 c1 p3` to
/// `out` (`p0` itself is not pushed).
pub fn flatten_cubic(p0: Vec2, c0: Vec2, c1: Vec2, p3: Vec2, out: &mut Vec<Vec2>) {
    out.reserve(CUBIC_SEGMENTS);
    for i in 1..=CUBIC_SEGMENTS {
        let t = i as f32 / CUBIC_SEGMENTS as f32;
        let mt = 1.0 - t;
        let w0 = mt * mt * mt;
        let w1 = 3.0 * mt * mt * t;
        let w2 = 3.0 * mt * t * t;
        let w3 = t * t * t;
        out.push(p0 * w0 + c0 * w1 + c1 * w2 + p3 * w3);
    }
}

pub(super) fn flatten_commands(cmds: &[PathCmd], xf: &Affine) -> VgResult<Vec<Subpath>> {
    let identity = xf.is_identity();
    let map = |p: Vec2| if identity { p } else { xf.apply(p) };

    let mut out = Vec::new();
    let mut current: Option<Subpath> = None;

    for (i, cmd) in cmds.iter().enumerate() {
        match *cmd {
            PathCmd::MoveTo(p) => {
                finish(&mut out, current.take());
                current = Some(Subpath { points: vec![map(p)], closed: false });
            }
            PathCmd::LineTo(p) => {
                let sub = open_subpath(&mut current, i, "line_to")?;
                sub.points.push(map(p));
            }
            PathCmd::CubicTo { c0, c1, end } => {
                let sub = open_subpath(&mut current, i, "cubic_to")?;
                // Non-empty by construction: subpaths start with a MoveTo point.
                let p0 = sub.points[sub.points.len() - 1];
                flatten_cubic(p0, map(c0), map(c1), map(end), &mut sub.points);
            }
            PathCmd::Close => {
                let mut sub = current
                    .take()
                    .ok_or_else(|| VgError::invalid(format!("close at command {i} has no current point")))?;
                sub.closed = true;
                finish(&mut out, Some(sub));
            }
        }
    }
    finish(&mut out, current);

    Ok(out)
}

fn open_subpath<'a>(
    current: &'a mut Option<Subpath>,
    index: usize,
    what: &str,
) -> VgResult<&'a mut Subpath> {
    current
        .as_mut()
        .ok_or_else(|| VgError::invalid(format!("{what} at command {index} has no current point")))
}

fn finish(out: &mut Vec<Subpath>, sub: Option<Subpath>) {
    if let Some(sub) = sub {
        if sub.points.len() >= 2 {
            out.push(sub);
        }
    }
}
