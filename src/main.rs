use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, LevelFilter};

use raytracer::scene_file::load_scene;
use raytracer::LogCrateSink;

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Parser)]
#[command(name = "raytracer")]
#[command(about = "Renders a scene file with a recursive pinhole ray tracer")]
struct Args {
    /// Scene description file
    scene: PathBuf,

    /// Output image; the extension selects the format (.png, .ppm, ...)
    #[arg(short, long, default_value = "output.png")]
    output: PathBuf,

    /// Image width in pixels
    #[arg(long, default_value = "500")]
    width: u32,

    /// Image height in pixels
    #[arg(long, default_value = "500")]
    height: u32,

    /// Width of the view plane in world units
    #[arg(long, default_value = "2.0")]
    view_plane_width: f64,

    #[arg(long, default_value = "info")]
    log_level: LogLevel,

    /// Show a progress bar while rendering
    #[arg(long)]
    progress: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_default_env()
        .filter_level(args.log_level.clone().into())
        .init();

    let scene = load_scene(&args.scene)?;
    info!(
        "loaded {}: {} surfaces, {} lights",
        scene.name(),
        scene.surfaces().len(),
        scene.lights().len()
    );

    let progress = if args.progress {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar().template("{bar:40} {pos}/{len} ETA: {eta}")?,
        );
        bar
    } else {
        ProgressBar::hidden()
    };
    let image = scene.render_with_progress(
        args.width,
        args.height,
        args.view_plane_width,
        &LogCrateSink,
        progress,
    )?;
    image
        .save(&args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    info!("saved {}", args.output.display());
    Ok(())
}
