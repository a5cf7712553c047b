use crate::context::{Context, ContextId};
use crate::coords::{Affine, Vec2};
use crate::error::VgResult;

use super::flatten::{flatten_commands, Subpath};

/// One path command.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum PathCmd {
    MoveTo(Vec2),
    LineTo(Vec2),
    CubicTo { c0: Vec2, c1: Vec2, end: Vec2 },
    Close,
}

/// Growable command list owned by exactly one context.
///
/// Commands are only validated when the path is drawn, so a path may be built
/// incrementally in any order. `clear` keeps the allocation for reuse.
#[derive(Debug, Clone)]
pub struct Path {
    owner: ContextId,
    cmds: Vec<PathCmd>,
}

impl Path {
    /// Creates an empty path owned by `ctx`.
    pub fn new(ctx: &Context) -> Self {
        Self { owner: ctx.id(), cmds: Vec::new() }
    }

    /// The context this path belongs to.
    #[inline]
    pub fn owner(&self) -> ContextId {
        self.owner
    }

    #[inline]
    pub fn commands(&self) -> &[PathCmd] {
        &self.cmds
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cmds.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cmds.len()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.cmds.capacity()
    }

    /// Drops all commands; capacity is retained.
    #[inline]
    pub fn clear(&mut self) {
        self.cmds.clear();
    }

    pub fn move_to(&mut self, x: f32, y: f32) -> &mut Self {
        self.cmds.push(PathCmd::MoveTo(Vec2::new(x, y)));
        self
    }

    pub fn line_to(&mut self, x: f32, y: f32) -> &mut Self {
        self.cmds.push(PathCmd::LineTo(Vec2::new(x, y)));
        self
    }

    pub fn cubic_to(&mut self, c0: Vec2, c1: Vec2, end: Vec2) -> &mut Self {
        self.cmds.push(PathCmd::CubicTo { c0, c1, end });
        self
    }

    pub fn close(&mut self) -> &mut Self {
        self.cmds.push(PathCmd::Close);
        self
    }

    /// Flattens the path into device-space polylines, transforming every
    /// point (control points included) by `xf` first.
    pub fn flatten(&self, xf: &Affine) -> VgResult<Vec<Subpath>> {
        flatten_commands(&self.cmds, xf)
    }
}
