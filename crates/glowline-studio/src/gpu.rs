//! Headless wgpu path. The GPU draws raw geometry; bloom and the display
//! effects are applied to the read-back pixels.

use anyhow::{Context as _, Result};
use glowline_engine::crt::effects::{apply_display_effects, apply_persistence};
use glowline_engine::crt::{apply_bloom, PixelTarget};
use glowline_engine::device::{GpuInit, HeadlessGpu};
use glowline_engine::{BackendDesc, Context, FrameDesc};

use crate::{scene, RenderSettings};

pub fn render(settings: &RenderSettings) -> Result<Vec<u8>> {
    let RenderSettings { width, height, frames, dt_seconds, profile, palette } = *settings;

    let gpu = HeadlessGpu::new_blocking(GpuInit::default())?;
    let target = gpu.create_target(width, height, false)?;

    let mut ctx = Context::new(BackendDesc::Wgpu(gpu.backend_desc(target.format())))
        .context("failed to create wgpu context")?;
    ctx.set_crt_profile(profile)?;
    ctx.set_palette(palette);

    let stride = width as usize * 4;
    let mut history = vec![0u8; stride * height as usize];

    for i in 0..frames {
        let desc = FrameDesc::offscreen(width, height, dt_seconds).with_target(target.frame_target());
        ctx.begin_frame(desc)?;
        scene::draw(&mut ctx, width, height, i as f32 * dt_seconds)?;
        ctx.end_frame()?;

        let mut frame = gpu.read_rgba8(&target)?;
        {
            let mut view = PixelTarget::new(&mut frame, width, height, stride)?;
            apply_bloom(&mut view, profile.bloom_strength, profile.bloom_radius_px);
        }
        apply_persistence(&mut history, &frame, profile.persistence_decay, dt_seconds)?;
    }

    let mut view = PixelTarget::new(&mut history, width, height, stride)?;
    apply_display_effects(&mut view, &profile, ctx.frame_index())?;
    Ok(history)
}
