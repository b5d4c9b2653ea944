//! Headless cutscene player.
//!
//! Plays the built-in demo scene at a fixed frame rate and prints the
//! scheduler overlay as it goes.
mod logging;
mod scene;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tale_runtime::{ConfigLoader, Director, FrameOutcome, RuntimeConfig};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "tale")]
#[command(about = "Play the demo cutscene through the tale scheduler", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML configuration file (defaults apply when omitted)
    #[arg(short, long, value_name = "FILE", env = "TALE_CONFIG")]
    config: Option<PathBuf>,

    /// Fixed frame rate; overrides the config file
    #[arg(long)]
    fps: Option<u32>,

    /// Stop after this many frames; overrides the config file
    #[arg(long, value_name = "N")]
    max_frames: Option<u64>,

    /// Print the overlay every N frames (0 disables it)
    #[arg(long, value_name = "N", default_value_t = 30)]
    overlay_every: u64,

    /// Raise the skip trigger on this frame
    #[arg(long, value_name = "FRAME")]
    skip_at: Option<u64>,

    /// Also write logs into this directory
    #[arg(long, value_name = "DIR", env = "TALE_LOG_DIR")]
    log_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _guard = logging::init(cli.log_dir.as_deref())?;

    let mut config = match &cli.config {
        Some(path) => ConfigLoader::load(path)?,
        None => RuntimeConfig::default(),
    };
    config.apply_env();
    if let Some(fps) = cli.fps {
        config.fps = fps;
    }
    if let Some(max_frames) = cli.max_frames {
        config.max_frames = max_frames;
    }

    let mut director = Director::new(&config.director).context("invalid director settings")?;
    let scene = scene::opening(director.scheduler_mut());
    info!(%scene, fps = config.fps, recovery = %director.recovery(), "scene started");

    let delta = config.frame_delta();
    let mut recovered = 0u64;
    let mut frame = 0u64;

    while !director.scheduler().is_idle() {
        if frame >= config.max_frames {
            warn!(frame, "frame budget exhausted before the scene finished");
            break;
        }
        if cli.skip_at == Some(frame) {
            info!(frame, "skip requested");
            director.scheduler_mut().set_trigger(scene::SKIP);
        }

        if let FrameOutcome::Recovered { cancelled, .. } = director.frame(delta)? {
            recovered += 1;
            warn!(frame, ?cancelled, "recovered from a failed action");
        }
        frame += 1;

        if cli.overlay_every > 0 && frame % cli.overlay_every == 0 {
            println!("{}", director.overlay());
        }
    }

    let stats = director.scheduler().stats();
    info!(
        frames = frame,
        seconds = director.clock().elapsed(),
        recovered,
        created = stats.total_created,
        pool_reused = stats.pool_reused,
        pool_released = stats.pool_released,
        "scene finished"
    );
    println!("{}", director.overlay());

    Ok(())
}
