//! # Autoskip
//!
//! Plays a track on the simulated engine with periodic auto-skip enabled.
//! Exits when the track ends or on Ctrl+C.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use autoskip_core::{AutoSkipConfig, ManualSeekBehavior, Player, TrackInfo};
use autoskip_engine::{EngineConfig, SimulatedPlayer};
use autoskip_scheduler::AutoSkipService;
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments. Flags override values from the config file.
#[derive(Parser, Debug)]
#[command(name = "autoskip")]
#[command(about = "Periodically skip forward while a track is playing")]
#[command(version)]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long, env = "AUTOSKIP_CONFIG")]
    config: Option<PathBuf>,

    /// Seconds of playback between auto-skips
    #[arg(short, long)]
    interval: Option<f64>,

    /// Seconds skipped by each auto-skip
    #[arg(short, long)]
    jump: Option<f64>,

    /// Seconds moved by remote jump intents
    #[arg(long)]
    remote_jump: Option<f64>,

    /// Position notification interval in milliseconds
    #[arg(long)]
    progress_ms: Option<u64>,

    /// Move the skip reference forward when the listener seeks
    #[arg(long)]
    rebase_on_seek: bool,

    /// Playback speed of the simulated engine
    #[arg(long, default_value_t = 1.0)]
    speed: f64,

    /// Length of the simulated track in seconds
    #[arg(short, long, default_value_t = 180.0)]
    duration: f64,
}

/// Resolve the effective configuration: file, then flags, then validation.
fn resolve_config(args: &Args) -> Result<AutoSkipConfig> {
    let mut config = match &args.config {
        Some(path) => AutoSkipConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => AutoSkipConfig::load_or_default().context("Failed to load config")?,
    };

    if let Some(interval) = args.interval {
        config.interval_seconds = interval;
    }
    if let Some(jump) = args.jump {
        config.jump_seconds = jump;
    }
    if let Some(remote_jump) = args.remote_jump {
        config.remote_jump_seconds = remote_jump;
    }
    if let Some(progress_ms) = args.progress_ms {
        config.progress_interval_ms = progress_ms;
    }
    if args.rebase_on_seek {
        config.manual_seek = ManualSeekBehavior::Rebase;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "autoskip=info,autoskip_scheduler=debug".into()),
        )
        .init();

    let args = Args::parse();
    info!("Starting Autoskip v{}", env!("CARGO_PKG_VERSION"));

    let config = resolve_config(&args)?;
    let engine = Arc::new(
        SimulatedPlayer::new(EngineConfig {
            progress_interval: config.progress_interval()?,
            speed: args.speed,
        })
        .context("Failed to start playback engine")?,
    );
    let events = engine
        .take_events()
        .context("Engine event stream already taken")?;
    let service = AutoSkipService::from_config(Arc::clone(&engine), &config)?.stop_when_ended();

    // Subscribe before loading so the first track change is seen
    let service = tokio::spawn(service.run_until(events, shutdown_signal()));

    engine.load(TrackInfo::new(
        "1",
        "Test Track",
        "Test Artist",
        args.duration,
    ))?;
    engine.play().await?;

    let stats = service.await.context("Auto-skip service panicked")?;
    engine.shutdown();

    info!(
        "Done: {} skip(s) over {} position update(s)",
        stats.skips, stats.ticks
    );
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
}
