//! CPU preview path: software backend plus the CRT display model.

use anyhow::{Context as _, Result};
use glowline_engine::crt::effects::{apply_display_effects, apply_persistence};
use glowline_engine::crt::PixelTarget;
use glowline_engine::{BackendDesc, Context, FrameDesc};

use crate::{scene, RenderSettings};

pub fn render(settings: &RenderSettings) -> Result<Vec<u8>> {
    let RenderSettings { width, height, frames, dt_seconds, profile, palette } = *settings;

    let mut ctx = Context::new(BackendDesc::Software).context("failed to create software context")?;
    ctx.set_crt_profile(profile)?;
    ctx.set_palette(palette);

    let stride = width as usize * 4;
    let mut frame = vec![0u8; stride * height as usize];
    let mut history = vec![0u8; frame.len()];

    for i in 0..frames {
        ctx.begin_frame(FrameDesc::offscreen(width, height, dt_seconds))?;
        scene::draw(&mut ctx, width, height, i as f32 * dt_seconds)?;
        ctx.end_frame()?;

        let stats = ctx.frame_stats();
        log::debug!(
            "frame {i}: {} commands, {} triangles",
            stats.commands,
            stats.triangles
        );

        frame.fill(0);
        ctx.debug_rasterize_rgba8(&mut frame, width, height, stride)?;
        apply_persistence(&mut history, &frame, profile.persistence_decay, dt_seconds)?;
    }

    let mut target = PixelTarget::new(&mut history, width, height, stride)?;
    apply_display_effects(&mut target, &profile, ctx.frame_index())?;
    Ok(history)
}
