//! Glowline studio.
//!
//! Renders an animated demo scene through the engine and writes the last
//! frame, with the CRT phosphor model applied, to a PNG.

mod gpu;
mod preview;
mod scene;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use glowline_engine::logging::{init_logging, LoggingConfig};
use glowline_engine::{CrtProfile, Palette};

/// Offline renderer for the glowline vector engine
#[derive(Parser, Debug)]
#[command(name = "glowline-studio")]
#[command(about = "Render the glowline demo scene to a PNG")]
#[command(version)]
struct Args {
    /// Output PNG path
    #[arg(short, long, default_value = "glowline.png")]
    output: PathBuf,

    /// Frame width in pixels
    #[arg(long, default_value = "640")]
    width: u32,

    /// Frame height in pixels
    #[arg(long, default_value = "480")]
    height: u32,

    /// Frames to simulate; phosphor persistence accumulates across them
    #[arg(short, long, default_value = "30")]
    frames: u32,

    /// Render through the wgpu backend on a headless device
    #[arg(long)]
    gpu: bool,

    /// Display look
    #[arg(long, value_enum, default_value_t = Look::Vector)]
    look: Look,

    /// Log filter (env_logger syntax); falls back to RUST_LOG
    #[arg(long)]
    log: Option<String>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Look {
    /// Green vector monitor
    Vector,
    /// Amber palette, same phosphor model
    Amber,
    /// No display effects
    Clean,
}

impl Look {
    fn profile(self) -> CrtProfile {
        match self {
            Look::Vector | Look::Amber => CrtProfile::vector_monitor(),
            Look::Clean => CrtProfile::clean(),
        }
    }

    fn palette(self) -> Palette {
        match self {
            Look::Amber => Palette::amber(),
            Look::Vector | Look::Clean => Palette::green_phosphor(),
        }
    }
}

/// Settings shared by both render paths.
#[derive(Debug, Clone, Copy)]
pub struct RenderSettings {
    pub width: u32,
    pub height: u32,
    pub frames: u32,
    pub dt_seconds: f32,
    pub profile: CrtProfile,
    pub palette: Palette,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(LoggingConfig { env_filter: args.log.clone(), ..LoggingConfig::default() });

    anyhow::ensure!(args.width > 0 && args.height > 0, "frame size must be non-zero");
    anyhow::ensure!(args.frames > 0, "at least one frame is required");

    let settings = RenderSettings {
        width: args.width,
        height: args.height,
        frames: args.frames,
        dt_seconds: 1.0 / 60.0,
        profile: args.look.profile(),
        palette: args.look.palette(),
    };

    log::info!(
        "rendering {} frame(s) at {}x{} ({})",
        settings.frames,
        settings.width,
        settings.height,
        if args.gpu { "wgpu" } else { "software" }
    );

    let pixels = if args.gpu { gpu::render(&settings)? } else { preview::render(&settings)? };

    image::save_buffer(&args.output, &pixels, settings.width, settings.height, image::ColorType::Rgba8)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    log::info!("wrote {}", args.output.display());
    Ok(())
}
