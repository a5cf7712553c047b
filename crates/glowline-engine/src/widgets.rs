//! Immediate-mode widget conveniences built on the context primitives.

use crate::context::Context;
use crate::coords::{Rect, Vec2};
use crate::error::{VgError, VgResult};
use crate::style::{BlendMode, FillStyle, StrokeStyle};

/// Visual state of a button; hit testing belongs to the host.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum ButtonState {
    #[default]
    Idle,
    Hover,
    Pressed,
}

const OUTLINE_WIDTH: f32 = 1.5;

impl Context {
    /// Draws a framed button with a centered label.
    pub fn draw_button(&mut self, rect: Rect, label: &str, state: ButtonState) -> VgResult<()> {
        if !rect.is_finite() {
            return Err(VgError::invalid(format!("non-finite button rect {rect:?}")));
        }
        let rect = rect.normalized();
        let palette = self.palette();

        let (fill, fill_intensity, outline, text) = match state {
            ButtonState::Idle => (palette.background, 1.0, palette.secondary, palette.text),
            ButtonState::Hover => (palette.secondary, 0.35, palette.primary, palette.text),
            ButtonState::Pressed => (palette.primary, 0.8, palette.accent, palette.background),
        };

        self.fill_rect(rect, &FillStyle::new(fill).with_intensity(fill_intensity))?;
        self.draw_rect(rect, &StrokeStyle::new(OUTLINE_WIDTH, outline))?;

        if label.is_empty() {
            return Ok(());
        }
        let size = (rect.size.y * 0.5).min(rect.size.x / label.chars().count().max(1) as f32 * 1.2);
        if size <= 0.0 {
            return Ok(());
        }
        let width = self.measure_text(label, size);
        let origin = rect.center() - Vec2::new(width * 0.5, size * 0.5);
        self.draw_text(label, origin, size, &StrokeStyle::new((size / 10.0).max(1.0), text))?;
        Ok(())
    }

    /// Draws a horizontal slider. `value` is clamped to `[0, 1]`; the clamped
    /// value is returned.
    pub fn draw_slider(&mut self, rect: Rect, value: f32) -> VgResult<f32> {
        if !rect.is_finite() {
            return Err(VgError::invalid(format!("non-finite slider rect {rect:?}")));
        }
        if value.is_nan() {
            return Err(VgError::invalid("slider value is NaN"));
        }
        let value = value.clamp(0.0, 1.0);
        let rect = rect.normalized();
        let palette = self.palette();

        let knob_r = (rect.size.y * 0.4).max(1.0);
        let y = rect.center().y;
        let x0 = rect.origin.x + knob_r;
        let x1 = (rect.origin.x + rect.size.x - knob_r).max(x0);
        let knob = Vec2::new(x0 + (x1 - x0) * value, y);

        let track = StrokeStyle::new(2.0, palette.secondary);
        self.draw_polyline(&[Vec2::new(x0, y), Vec2::new(x1, y)], false, &track)?;
        if knob.x > x0 {
            let filled = StrokeStyle::new(2.0, palette.primary).with_blend(BlendMode::Additive);
            self.draw_polyline(&[Vec2::new(x0, y), knob], false, &filled)?;
        }
        self.fill_circle(knob, knob_r, &FillStyle::new(palette.accent))?;
        Ok(value)
    }
}
