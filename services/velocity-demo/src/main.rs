//! Headless velocity layer host.
//!
//! Drives a particle engine from a simulated animation-frame clock over a
//! web-mercator viewport and writes committed frames as PNG files.

mod synthetic;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use particle_engine::{AngleConvention, Engine, FrameOutcome, SpeedUnit, VelocityConfig};
use projection::{MercatorViewport, Projection};
use renderer::PixmapCanvas;
use velocity_common::{GeoExtent, VectorRecord};

#[derive(Parser, Debug)]
#[command(name = "velocity-demo")]
#[command(about = "Animate a u/v vector field headlessly and export PNG frames")]
struct Args {
    /// JSON payload of u/v records (synthetic global field when omitted)
    #[arg(short, long, env = "VELOCITY_DATA")]
    data: Option<PathBuf>,

    /// Layer options file (.json, .yaml or .yml)
    #[arg(short, long, env = "VELOCITY_CONFIG")]
    config: Option<PathBuf>,

    /// Visible extent as "west,south,east,north"
    #[arg(long, default_value = "-180,-80,180,80")]
    extent: String,

    #[arg(long, default_value = "1024")]
    width: u32,

    #[arg(long, default_value = "640")]
    height: u32,

    /// Host animation-frame rate
    #[arg(long, default_value = "60")]
    refresh_hz: f64,

    /// Stop after this many seconds
    #[arg(long, default_value = "10")]
    duration_secs: u64,

    /// Directory for PNG frames (no export when omitted)
    #[arg(short, long, env = "VELOCITY_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Write every Nth committed frame
    #[arg(long, default_value = "15")]
    every: u64,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting velocity demo");

    let config = load_config(args.config.as_deref())?;
    let records = load_records(args.data.as_deref())?;
    let extent = GeoExtent::from_bbox_string(&args.extent)?;
    let viewport = MercatorViewport::new(extent, args.width, args.height)?;
    let bounds = viewport.pixel_bounds(&extent, args.width, args.height);

    if let Some(dir) = &args.output_dir {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("creating {}", dir.display()))?;
    }

    let canvas = PixmapCanvas::new(args.width, args.height)?;
    let mut engine = Engine::new(config, canvas)?;
    engine.on_event(|event| info!(event = event.name(), details = ?event, "Lifecycle event"));

    engine.notify_data_changed(&records)?;
    engine.notify_bounds_changed(viewport, bounds, extent)?;

    let (center_lon, center_lat) = (
        (extent.west + extent.east) / 2.0,
        (extent.south + extent.north) / 2.0,
    );
    match engine.readout(center_lon, center_lat, SpeedUnit::Knots, AngleConvention::MeteoCw) {
        Some(readout) => info!(readout = %readout, "Wind at view centre"),
        None => info!("No data at view centre"),
    }

    engine.start()?;

    let settings = LoopSettings {
        frame_period: Duration::from_secs_f64(1.0 / args.refresh_hz.max(1.0)),
        duration: Duration::from_secs(args.duration_secs),
        every: args.every.max(1),
        output_dir: args.output_dir.clone(),
    };
    let written = run_frames(&mut engine, &settings, tokio::signal::ctrl_c()).await;

    info!(
        frames = engine.frames(),
        written,
        fps = engine.monitor().average_fps(),
        particle_scale = engine.monitor().particle_scale(),
        particles = engine.particles().len(),
        "Demo finished"
    );
    engine.stop();

    Ok(())
}

/// Pacing and export settings for the frame loop.
struct LoopSettings {
    frame_period: Duration,
    duration: Duration,
    every: u64,
    output_dir: Option<PathBuf>,
}

/// Drive animation frames until `duration` elapses or `shutdown` resolves.
/// Returns the number of PNG frames written.
async fn run_frames<F>(
    engine: &mut Engine<MercatorViewport, PixmapCanvas>,
    settings: &LoopSettings,
    shutdown: F,
) -> u64
where
    F: Future,
{
    tokio::pin!(shutdown);
    let mut ticker = tokio::time::interval(settings.frame_period);
    let deadline = Instant::now() + settings.duration;
    let mut written = 0u64;

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                info!("Interrupted");
                break;
            }
            _ = ticker.tick() => {}
        }

        let now = Instant::now();
        if now >= deadline {
            break;
        }

        if let FrameOutcome::Rendered { segments } = engine.on_animation_frame(now) {
            let frame = engine.frames();
            if frame % settings.every != 0 {
                continue;
            }
            if let Some(dir) = &settings.output_dir {
                match write_frame(dir, frame, engine.canvas()).await {
                    Ok(path) => {
                        written += 1;
                        info!(frame, segments, path = %path.display(), "Frame written");
                    }
                    Err(e) => warn!(frame, error = %e, "Failed to write frame"),
                }
            }
        }
    }

    written
}

fn load_config(path: Option<&Path>) -> Result<VelocityConfig> {
    let config = match path {
        Some(path) => VelocityConfig::from_file(path)
            .with_context(|| format!("loading options from {}", path.display()))?,
        None => VelocityConfig::default(),
    };
    Ok(config.with_env(|key| std::env::var(key).ok())?)
}

fn load_records(path: Option<&Path>) -> Result<Vec<VectorRecord>> {
    match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let records = VectorRecord::from_json_array(&json)?;
            info!(path = %path.display(), records = records.len(), "Loaded payload");
            Ok(records)
        }
        None => {
            info!("No payload given, using synthetic global field");
            Ok(synthetic::global_payload())
        }
    }
}

async fn write_frame(dir: &Path, frame: u64, canvas: &PixmapCanvas) -> Result<PathBuf> {
    let path = dir.join(format!("frame_{:05}.png", frame));
    let png = canvas.encode_png()?;
    tokio::fs::write(&path, png).await?;
    Ok(path)
}
