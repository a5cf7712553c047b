//! Rendering context: frame lifecycle, transform and clip stacks, CRT state.
//!
//! A [`Context`] owns exactly one [`Backend`]. Every point-based draw call is
//! validated, mapped through the active transform and handed to the backend
//! together with the active clip rect.

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::backend::{Backend, BackendDesc, BackendKind, FrameDesc, FrameInfo, FrameStats};
use crate::coords::{Affine, Color, Rect, Vec2};
use crate::crt::{CrtProfile, PixelTarget, RetroParams};
use crate::error::{VgError, VgResult};
use crate::path::Path;
use crate::style::{FillStyle, StrokeStyle};
use crate::text::{measure_text, Glyph, GlyphCache, GLYPH_ADVANCE, GLYPH_HEIGHT};

/// Segments used to approximate a filled circle.
pub const CIRCLE_SEGMENTS: usize = 32;

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique context identity; paths are stamped with it.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ContextId(u64);

impl ContextId {
    fn next() -> Self {
        Self(NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Stack limits.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ContextConfig {
    pub max_transform_depth: usize,
    pub max_clip_depth: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self { max_transform_depth: 32, max_clip_depth: 32 }
    }
}

/// Named colors used by the widget conveniences.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Palette {
    pub background: Color,
    pub primary: Color,
    pub secondary: Color,
    pub accent: Color,
    pub warning: Color,
    pub text: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self::green_phosphor()
    }
}

impl Palette {
    pub const fn green_phosphor() -> Self {
        Self {
            background: Color::rgb(0.0, 0.02, 0.0),
            primary: Color::rgb(0.2, 1.0, 0.35),
            secondary: Color::rgb(0.1, 0.5, 0.18),
            accent: Color::rgb(0.6, 1.0, 0.7),
            warning: Color::rgb(1.0, 0.75, 0.2),
            text: Color::rgb(0.45, 1.0, 0.55),
        }
    }

    pub const fn amber() -> Self {
        Self {
            background: Color::rgb(0.02, 0.01, 0.0),
            primary: Color::rgb(1.0, 0.62, 0.1),
            secondary: Color::rgb(0.5, 0.3, 0.05),
            accent: Color::rgb(1.0, 0.85, 0.5),
            warning: Color::rgb(1.0, 0.25, 0.15),
            text: Color::rgb(1.0, 0.7, 0.3),
        }
    }
}

/// One rendering session.
pub struct Context {
    id: ContextId,
    config: ContextConfig,
    backend: Box<dyn Backend>,

    frame: Option<FrameInfo>,
    frame_index: u64,

    crt: CrtProfile,
    palette: Palette,

    transform: Affine,
    transform_stack: Vec<Affine>,
    clip_stack: Vec<Rect>,

    glyphs: GlyphCache,
    // Reused for transformed points.
    scratch: Vec<Vec2>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("id", &self.id)
            .field("backend", &self.backend.kind())
            .field("frame", &self.frame)
            .field("frame_index", &self.frame_index)
            .field("transform", &self.transform)
            .field("clip", &self.clip())
            .finish_non_exhaustive()
    }
}

impl Context {
    pub fn new(desc: BackendDesc) -> VgResult<Self> {
        Self::with_config(desc, ContextConfig::default())
    }

    pub fn with_config(desc: BackendDesc, config: ContextConfig) -> VgResult<Self> {
        Ok(Self::with_backend(desc.create()?, config))
    }

    /// Wraps an already constructed backend.
    pub fn with_backend(backend: Box<dyn Backend>, config: ContextConfig) -> Self {
        let id = ContextId::next();
        log::debug!("context {} created ({:?} backend)", id.0, backend.kind());
        Self {
            id,
            config,
            backend,
            frame: None,
            frame_index: 0,
            crt: CrtProfile::default(),
            palette: Palette::default(),
            transform: Affine::IDENTITY,
            transform_stack: Vec::with_capacity(config.max_transform_depth),
            clip_stack: Vec::with_capacity(config.max_clip_depth),
            glyphs: GlyphCache::new(),
            scratch: Vec::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> ContextId {
        self.id
    }

    #[inline]
    pub fn config(&self) -> ContextConfig {
        self.config
    }

    #[inline]
    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// Creates an empty path owned by this context.
    pub fn create_path(&self) -> Path {
        Path::new(self)
    }

    // ── frame lifecycle ───────────────────────────────────────────────────

    #[inline]
    pub fn in_frame(&self) -> bool {
        self.frame.is_some()
    }

    /// The open frame, if any.
    #[inline]
    pub fn frame(&self) -> Option<FrameInfo> {
        self.frame
    }

    /// Number of frames begun so far; seeds the CRT noise.
    #[inline]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn begin_frame(&mut self, desc: FrameDesc) -> VgResult<()> {
        if self.frame.is_some() {
            return Err(VgError::invalid("begin_frame while a frame is already open"));
        }
        if desc.width == 0 || desc.height == 0 {
            return Err(VgError::invalid(format!(
                "frame size must be non-zero, got {}x{}",
                desc.width, desc.height
            )));
        }
        if !(desc.dt_seconds.is_finite() && desc.dt_seconds >= 0.0) {
            return Err(VgError::invalid(format!("frame dt must be finite and >= 0, got {}", desc.dt_seconds)));
        }

        let info = desc.info();
        self.backend.begin_frame(&info, desc.target)?;

        self.transform = Affine::IDENTITY;
        self.transform_stack.clear();
        self.clip_stack.clear();
        self.frame = Some(info);
        self.frame_index += 1;
        Ok(())
    }

    /// Flushes the frame. The frame is closed even when the flush fails.
    pub fn end_frame(&mut self) -> VgResult<()> {
        if self.frame.take().is_none() {
            return Err(VgError::invalid("end_frame without an open frame"));
        }
        self.backend.end_frame()
    }

    fn require_frame(&self, op: &str) -> VgResult<FrameInfo> {
        self.frame.ok_or_else(|| VgError::invalid(format!("{op} called outside an open frame")))
    }

    /// Geometry statistics of the current (or last flushed) frame.
    pub fn frame_stats(&self) -> FrameStats {
        self.backend.geometry().stats()
    }

    // ── drawing ───────────────────────────────────────────────────────────

    pub fn draw_polyline(&mut self, points: &[Vec2], closed: bool, style: &StrokeStyle) -> VgResult<()> {
        self.require_frame("draw_polyline")?;
        let clip = self.clip();
        let points = map_points(&self.transform, &mut self.scratch, points);
        self.backend.draw_polyline(points, closed, style, clip)
    }

    /// Strokes every subpath of `path`; the path must belong to this context.
    pub fn draw_path_stroke(&mut self, path: &Path, style: &StrokeStyle) -> VgResult<()> {
        self.require_frame("draw_path_stroke")?;
        if path.owner() != self.id {
            return Err(VgError::invalid(format!(
                "path belongs to context {}, not {}",
                path.owner().0,
                self.id.0
            )));
        }
        let subpaths = path.flatten(&self.transform)?;
        self.backend.draw_path_stroke(&subpaths, style, self.clip())
    }

    /// Fills a convex polygon (fan triangulation; concave input is not corrected).
    pub fn fill_convex(&mut self, points: &[Vec2], style: &FillStyle) -> VgResult<()> {
        self.require_frame("fill_convex")?;
        let clip = self.clip();
        let points = map_points(&self.transform, &mut self.scratch, points);
        self.backend.fill_convex(points, style, clip)
    }

    pub fn fill_rect(&mut self, rect: Rect, style: &FillStyle) -> VgResult<()> {
        if !rect.is_finite() {
            return Err(VgError::invalid(format!("non-finite rect {rect:?}")));
        }
        self.fill_convex(&rect.normalized().corners(), style)
    }

    pub fn fill_circle(&mut self, center: Vec2, radius: f32, style: &FillStyle) -> VgResult<()> {
        if !(center.is_finite() && radius.is_finite() && radius > 0.0) {
            return Err(VgError::invalid(format!("bad circle at {center:?} with radius {radius}")));
        }
        let step = std::f32::consts::TAU / CIRCLE_SEGMENTS as f32;
        let points: Vec<Vec2> = (0..CIRCLE_SEGMENTS)
            .map(|i| {
                let (s, c) = (i as f32 * step).sin_cos();
                center + Vec2::new(c, s) * radius
            })
            .collect();
        self.fill_convex(&points, style)
    }

    /// Strokes the outline of `rect` as a closed polyline.
    pub fn draw_rect(&mut self, rect: Rect, style: &StrokeStyle) -> VgResult<()> {
        if !rect.is_finite() {
            return Err(VgError::invalid(format!("non-finite rect {rect:?}")));
        }
        self.draw_polyline(&rect.normalized().corners(), true, style)
    }

    /// Strokes `text` with the built-in vector font, top-left at `origin`,
    /// `size` pixels tall. Characters without a glyph advance without drawing.
    /// Returns the advance width.
    pub fn draw_text(&mut self, text: &str, origin: Vec2, size: f32, style: &StrokeStyle) -> VgResult<f32> {
        self.require_frame("draw_text")?;
        if !(size.is_finite() && size > 0.0 && origin.is_finite()) {
            return Err(VgError::invalid(format!("bad text size {size} or origin {origin:?}")));
        }
        let scale = size / GLYPH_HEIGHT;
        let mut pen = origin;
        let mut stroke = Vec::new();
        for ch in text.chars() {
            if let Some(glyph) = self.glyphs.get(ch) {
                self.draw_glyph(&glyph, pen, scale, style, &mut stroke)?;
            }
            pen.x += GLYPH_ADVANCE * scale;
        }
        Ok(pen.x - origin.x)
    }

    fn draw_glyph(
        &mut self,
        glyph: &Rc<Glyph>,
        pen: Vec2,
        scale: f32,
        style: &StrokeStyle,
        stroke: &mut Vec<Vec2>,
    ) -> VgResult<()> {
        for points in &glyph.strokes {
            stroke.clear();
            stroke.extend(points.iter().map(|&p| pen + p * scale));
            self.draw_polyline(stroke, false, style)?;
        }
        Ok(())
    }

    /// Advance width of `text` at `size`, without drawing.
    pub fn measure_text(&self, text: &str, size: f32) -> f32 {
        measure_text(text, size)
    }

    /// Resets the stencil buffer; `Unsupported` when the backend has none.
    pub fn clear_stencil(&mut self) -> VgResult<()> {
        self.require_frame("clear_stencil")?;
        self.backend.clear_stencil()
    }

    // ── transform stack ───────────────────────────────────────────────────

    #[inline]
    pub fn transform(&self) -> Affine {
        self.transform
    }

    pub fn transform_depth(&self) -> usize {
        self.transform_stack.len()
    }

    pub fn push_transform(&mut self) -> VgResult<()> {
        if self.transform_stack.len() >= self.config.max_transform_depth {
            return Err(VgError::oom(format!(
                "transform stack overflow (depth {})",
                self.config.max_transform_depth
            )));
        }
        self.transform_stack.push(self.transform);
        Ok(())
    }

    pub fn pop_transform(&mut self) -> VgResult<()> {
        self.transform = self
            .transform_stack
            .pop()
            .ok_or_else(|| VgError::invalid("pop_transform on an empty stack"))?;
        Ok(())
    }

    /// Replaces the active transform.
    pub fn set_transform(&mut self, xf: Affine) -> VgResult<()> {
        if !xf.is_finite() {
            return Err(VgError::invalid(format!("non-finite transform {xf:?}")));
        }
        self.transform = xf;
        Ok(())
    }

    /// `current = current ∘ xf`.
    pub fn apply_transform(&mut self, xf: &Affine) -> VgResult<()> {
        let next = self.transform.then_apply(xf);
        self.set_transform(next)
    }

    pub fn translate(&mut self, tx: f32, ty: f32) -> VgResult<()> {
        self.apply_transform(&Affine::translation(tx, ty))
    }

    pub fn scale(&mut self, sx: f32, sy: f32) -> VgResult<()> {
        self.apply_transform(&Affine::scaling(sx, sy))
    }

    pub fn rotate(&mut self, radians: f32) -> VgResult<()> {
        self.apply_transform(&Affine::rotation(radians))
    }

    // ── clip stack ────────────────────────────────────────────────────────

    /// Active device-space clip rect; `None` when the stack is empty.
    #[inline]
    pub fn clip(&self) -> Option<Rect> {
        self.clip_stack.last().copied()
    }

    pub fn clip_depth(&self) -> usize {
        self.clip_stack.len()
    }

    /// Pushes `rect` (in current user space) intersected with the active clip.
    /// An empty intersection becomes a zero-area rect that discards draws.
    pub fn push_clip(&mut self, rect: Rect) -> VgResult<()> {
        if !rect.is_finite() {
            return Err(VgError::invalid(format!("non-finite clip rect {rect:?}")));
        }
        if self.clip_stack.len() >= self.config.max_clip_depth {
            return Err(VgError::oom(format!("clip stack overflow (depth {})", self.config.max_clip_depth)));
        }
        let device = self.transform.transform_rect_bounds(rect);
        let clip = match self.clip() {
            Some(top) => top.intersect(device).unwrap_or(Rect::new(0.0, 0.0, 0.0, 0.0)),
            None => device,
        };
        self.clip_stack.push(clip);
        Ok(())
    }

    pub fn pop_clip(&mut self) -> VgResult<()> {
        self.clip_stack
            .pop()
            .map(|_| ())
            .ok_or_else(|| VgError::invalid("pop_clip on an empty stack"))
    }

    // ── CRT and palette ───────────────────────────────────────────────────

    #[inline]
    pub fn crt_profile(&self) -> CrtProfile {
        self.crt
    }

    pub fn set_crt_profile(&mut self, profile: CrtProfile) -> VgResult<()> {
        profile.validate()?;
        self.crt = profile;
        Ok(())
    }

    /// Legacy view of the five overlapping profile fields.
    #[inline]
    pub fn retro_params(&self) -> RetroParams {
        self.crt.retro_params()
    }

    /// Writes the five overlapping fields; the rest of the profile is kept.
    pub fn set_retro_params(&mut self, params: RetroParams) -> VgResult<()> {
        let mut next = self.crt;
        next.apply_retro_params(&params);
        self.set_crt_profile(next)
    }

    #[inline]
    pub fn palette(&self) -> Palette {
        self.palette
    }

    pub fn set_palette(&mut self, palette: Palette) {
        self.palette = palette;
    }

    // ── debug capture ─────────────────────────────────────────────────────

    /// Rasterizes the current (or last flushed) frame into a caller-owned
    /// RGBA8 buffer using the context's CRT profile and frame index.
    pub fn debug_rasterize_rgba8(
        &self,
        pixels: &mut [u8],
        width: u32,
        height: u32,
        stride_bytes: usize,
    ) -> VgResult<()> {
        let mut target = PixelTarget::new(pixels, width, height, stride_bytes)?;
        self.backend.debug_rasterize_rgba8(&mut target, &self.crt, self.frame_index)
    }
}

/// Maps `points` through `xf` into `scratch`; identity borrows the input.
fn map_points<'a>(xf: &Affine, scratch: &'a mut Vec<Vec2>, points: &'a [Vec2]) -> &'a [Vec2] {
    if xf.is_identity() {
        return points;
    }
    scratch.clear();
    scratch.extend(points.iter().map(|&p| xf.apply(p)));
    scratch
}
