//! Stroke and fill styles.
//!
//! Styles are plain values validated at every draw call. Validation never
//! corrects input: anything out of range is rejected as `InvalidArgument`.

use crate::coords::Color;
use crate::error::{VgError, VgResult};

/// Geometry terminating an open stroke endpoint.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

/// Geometry connecting two stroke segments at a shared vertex.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum BlendMode {
    /// `src*a + dst*(1-a)`.
    #[default]
    Alpha,
    /// `dst + src*a`, saturating. Used for phosphor glow.
    Additive,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum StencilMode {
    /// Replace the stencil value with `reference` wherever geometry lands.
    Write,
    /// Draw only where the stencil equals `reference`.
    TestEqual,
    /// Draw only where the stencil differs from `reference`.
    TestNotEqual,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct StencilState {
    pub mode: StencilMode,
    pub reference: u8,
}

impl StencilState {
    #[inline]
    pub const fn new(mode: StencilMode, reference: u8) -> Self {
        Self { mode, reference }
    }
}

/// Style for stroked paths and polylines.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct StrokeStyle {
    pub width: f32,
    /// Brightness multiplier applied before blending, in `[0, 1]`.
    pub intensity: f32,
    pub color: Color,
    pub cap: LineCap,
    pub join: LineJoin,
    pub miter_limit: f32,
    pub blend: BlendMode,
    pub stencil: Option<StencilState>,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            width: 1.0,
            intensity: 1.0,
            color: Color::white(),
            cap: LineCap::Butt,
            join: LineJoin::Miter,
            miter_limit: 4.0,
            blend: BlendMode::Alpha,
            stencil: None,
        }
    }
}

impl StrokeStyle {
    pub fn new(width: f32, color: Color) -> Self {
        Self { width, color, ..Self::default() }
    }

    pub fn with_cap(mut self, cap: LineCap) -> Self { self.cap = cap; self }
    pub fn with_join(mut self, join: LineJoin) -> Self { self.join = join; self }
    pub fn with_blend(mut self, blend: BlendMode) -> Self { self.blend = blend; self }
    pub fn with_intensity(mut self, intensity: f32) -> Self { self.intensity = intensity; self }
    pub fn with_miter_limit(mut self, limit: f32) -> Self { self.miter_limit = limit; self }
    pub fn with_stencil(mut self, stencil: StencilState) -> Self { self.stencil = Some(stencil); self }

    pub fn validate(&self) -> VgResult<()> {
        if !(self.width.is_finite() && self.width > 0.0) {
            return Err(VgError::invalid(format!("stroke width must be finite and > 0, got {}", self.width)));
        }
        if !(self.miter_limit.is_finite() && self.miter_limit >= 1.0) {
            return Err(VgError::invalid(format!("miter limit must be finite and >= 1, got {}", self.miter_limit)));
        }
        validate_paint(self.intensity, self.color)
    }
}

/// Style for convex fills.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FillStyle {
    pub intensity: f32,
    pub color: Color,
    pub blend: BlendMode,
    pub stencil: Option<StencilState>,
}

impl Default for FillStyle {
    fn default() -> Self {
        Self {
            intensity: 1.0,
            color: Color::white(),
            blend: BlendMode::Alpha,
            stencil: None,
        }
    }
}

impl FillStyle {
    pub fn new(color: Color) -> Self {
        Self { color, ..Self::default() }
    }

    pub fn with_blend(mut self, blend: BlendMode) -> Self { self.blend = blend; self }
    pub fn with_intensity(mut self, intensity: f32) -> Self { self.intensity = intensity; self }
    pub fn with_stencil(mut self, stencil: StencilState) -> Self { self.stencil = Some(stencil); self }

    pub fn validate(&self) -> VgResult<()> {
        validate_paint(self.intensity, self.color)
    }
}

fn validate_paint(intensity: f32, color: Color) -> VgResult<()> {
    if !(intensity.is_finite() && (0.0..=1.0).contains(&intensity)) {
        return Err(VgError::invalid(format!("intensity must be in [0, 1], got {intensity}")));
    }
    if !color.is_normalized() {
        return Err(VgError::invalid(format!("color channels must be finite and in [0, 1], got {color:?}")));
    }
    Ok(())
}
