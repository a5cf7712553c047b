use std::f32::consts::TAU;

use glowline_engine::widgets::ButtonState;
use glowline_engine::{BlendMode, Color, Context, FillStyle, LineCap, LineJoin, Rect, StrokeStyle, Vec2, VgResult};

/// Draws one frame of the demo scene at time `t` seconds.
pub fn draw(ctx: &mut Context, width: u32, height: u32, t: f32) -> VgResult<()> {
    let palette = ctx.palette();
    let (w, h) = (width as f32, height as f32);

    ctx.fill_rect(Rect::new(0.0, 0.0, w, h), &FillStyle::new(palette.background))?;

    // Perspective floor grid.
    let grid = StrokeStyle::new(1.0, palette.secondary).with_intensity(0.6);
    let horizon = h * 0.55;
    for i in 0..=12 {
        let x = w * i as f32 / 12.0;
        ctx.draw_polyline(&[Vec2::new(w * 0.5, horizon), Vec2::new(x * 2.0 - w * 0.5, h)], false, &grid)?;
    }
    let scroll = (t * 0.5).fract();
    for i in 0..8 {
        let k = (i as f32 + scroll) / 8.0;
        let y = horizon + (h - horizon) * k * k;
        ctx.draw_polyline(&[Vec2::new(0.0, y), Vec2::new(w, y)], false, &grid)?;
    }

    // Spinning wireframe star, additive so it glows over the grid.
    let star = StrokeStyle::new(2.5, palette.primary)
        .with_blend(BlendMode::Additive)
        .with_join(LineJoin::Miter)
        .with_miter_limit(6.0);
    ctx.push_transform()?;
    ctx.translate(w * 0.5, h * 0.32)?;
    ctx.rotate(t * 0.8)?;
    let r = h.min(w) * 0.18;
    let points: Vec<Vec2> = (0..10)
        .map(|i| {
            let a = TAU * i as f32 / 10.0 - TAU / 4.0;
            let radius = if i % 2 == 0 { r } else { r * 0.45 };
            Vec2::new(a.cos(), a.sin()) * radius
        })
        .collect();
    ctx.draw_polyline(&points, true, &star)?;
    ctx.pop_transform()?;

    // Orbiting curve.
    let mut path = ctx.create_path();
    let phase = t * 1.3;
    path.move_to(w * 0.1, h * 0.5).cubic_to(
        Vec2::new(w * 0.3, h * (0.5 - 0.3 * phase.sin())),
        Vec2::new(w * 0.7, h * (0.5 + 0.3 * phase.cos())),
        Vec2::new(w * 0.9, h * 0.5),
    );
    let curve = StrokeStyle::new(2.0, palette.accent)
        .with_cap(LineCap::Round)
        .with_blend(BlendMode::Additive);
    ctx.draw_path_stroke(&path, &curve)?;

    // HUD.
    let size = (h * 0.05).max(8.0);
    let text = StrokeStyle::new((size / 10.0).max(1.0), palette.text).with_cap(LineCap::Round);
    ctx.draw_text("GLOWLINE VECTOR DISPLAY", Vec2::new(size, size), size, &text)?;

    ctx.push_clip(Rect::new(0.0, h - size * 3.0, w, size * 3.0))?;
    let state = if (t * 2.0) as u32 % 2 == 0 { ButtonState::Idle } else { ButtonState::Hover };
    ctx.draw_button(Rect::new(size, h - size * 2.6, size * 6.0, size * 2.0), "FIRE", state)?;
    ctx.draw_slider(
        Rect::new(size * 8.0, h - size * 2.2, w - size * 9.0, size * 1.2),
        0.5 + 0.5 * (t * 0.7).sin(),
    )?;
    ctx.pop_clip()?;

    let warn = palette.warning;
    ctx.fill_circle(
        Vec2::new(w - size * 1.5, size * 1.5),
        size * 0.5,
        &FillStyle::new(Color::new(warn.r, warn.g, warn.b, 0.8)).with_intensity(0.5 + 0.5 * (t * 4.0).sin().abs()),
    )?;
    Ok(())
}
