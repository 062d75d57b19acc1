//! Ember CLI
//!
//! Run particle emitter configurations headlessly, validate them, and
//! inspect the built-in presets.

use anyhow::Result;
use clap::{Parser, Subcommand};
use ember_core::{FrameClock, ImageRegistry};
use ember_particles::{Emitter, EmitterConfig, EmitterOptions, EmitterStats, PRESET_NAMES};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;

use config::SimulationFile;

#[derive(Parser)]
#[command(name = "ember")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Ember particle engine CLI", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an emitter without rendering and report particle counts
    Simulate {
        /// Simulation file (.toml or .json)
        config: PathBuf,

        /// Simulated seconds
        #[arg(short, long, default_value = "5")]
        seconds: f64,

        /// Frames per second of the simulated display
        #[arg(short, long, default_value = "60")]
        fps: f64,

        /// Seed for a reproducible run
        #[arg(long)]
        seed: Option<u64>,

        /// Particles to construct in the pool before starting
        #[arg(long, default_value = "0")]
        prewarm: usize,
    },

    /// Check a simulation file for errors
    Check {
        /// Simulation file (.toml or .json)
        config: PathBuf,
    },

    /// List presets, or show one preset's resolved configuration
    Presets {
        /// Preset name
        name: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Simulate {
            config,
            seconds,
            fps,
            seed,
            prewarm,
        } => cmd_simulate(&config, seconds, fps, seed, prewarm),

        Commands::Check { config } => cmd_check(&config),

        Commands::Presets { name } => cmd_presets(name.as_deref()),
    }
}

/// Outcome of a headless run
#[derive(Debug, PartialEq)]
struct SimulationSummary {
    frames: u64,
    stats: EmitterStats,
    live: usize,
    peak_live: usize,
    pooled: usize,
    constructed: u64,
    running: bool,
}

fn cmd_simulate(
    path: &Path,
    seconds: f64,
    fps: f64,
    seed: Option<u64>,
    prewarm: usize,
) -> Result<()> {
    let file = SimulationFile::load(path)?;

    info!(
        "Simulating {} for {}s at {} fps",
        path.display(),
        seconds,
        fps
    );
    let summary = simulate(&file, seconds, fps, seed, prewarm)?;

    let stats = summary.stats;
    info!("Finished after {} frames", summary.frames);
    info!(
        "  batches: {}, spawned: {}, recycled: {}",
        stats.batches, stats.spawned, stats.recycled
    );
    info!(
        "  expired: {}, live: {} (peak {}), pooled: {}, constructed: {}",
        stats.expired, summary.live, summary.peak_live, summary.pooled, summary.constructed
    );
    if !summary.running {
        info!("  emitter stopped itself (totalTime reached)");
    }

    Ok(())
}

fn simulate(
    file: &SimulationFile,
    seconds: f64,
    fps: f64,
    seed: Option<u64>,
    prewarm: usize,
) -> Result<SimulationSummary> {
    if !(seconds.is_finite() && seconds > 0.0) {
        anyhow::bail!("Simulated time must be positive, got {}", seconds);
    }

    let images = file.image_registry();
    let mut emitter = file.build_emitter(&images)?;
    if let Some(seed) = seed {
        emitter = emitter.with_seed(seed);
    }
    if prewarm > 0 {
        emitter.pool().borrow_mut().prewarm(prewarm);
    }

    let duration_ms = (seconds * 1000.0).round() as u64;
    let mut clock = FrameClock::new(fps);
    let mut next_report_ms = 1000;
    let mut peak_live = 0;

    emitter.start();
    while clock.elapsed_ms() < duration_ms {
        clock.advance(&mut emitter);
        peak_live = peak_live.max(emitter.live_count());

        if clock.elapsed_ms() >= next_report_ms {
            report(&emitter, clock.elapsed_ms());
            next_report_ms += 1000;
        }
    }

    let pool = emitter.pool().borrow();
    Ok(SimulationSummary {
        frames: clock.frames(),
        stats: emitter.stats(),
        live: emitter.live_count(),
        peak_live,
        pooled: pool.len(),
        constructed: pool.created(),
        running: emitter.is_running(),
    })
}

fn cmd_check(path: &Path) -> Result<()> {
    let file = SimulationFile::load(path)?;
    let images = file.image_registry();
    let emitter = file.build_emitter(&images)?;
    let config = emitter.config();

    info!("Checking {}", path.display());
    if let Some(preset) = &file.preset {
        info!("  preset: {}", preset);
    }
    info!("  images: {}", images.len());
    info!(
        "  emit every {}±{}s, {}±{} per batch",
        config.emit_interval.value,
        config.emit_interval.var,
        config.emit_count.value,
        config.emit_count.var
    );
    match config.total_time {
        Some(total) => info!("  stops after {}s", total),
        None => info!("  runs until stopped"),
    }
    if let Some(image) = config.particle.image {
        info!(
            "  particle image: {} ({} frame(s))",
            images.name(image.id).unwrap_or("?"),
            config.particle.frames.len().max(1)
        );
    }
    info!("{} is valid", path.display());

    Ok(())
}

fn cmd_presets(name: Option<&str>) -> Result<()> {
    let Some(name) = name else {
        println!("Available presets:");
        for preset in PRESET_NAMES {
            println!("  - {}", preset);
        }
        return Ok(());
    };

    let Some(options) = EmitterOptions::preset(name) else {
        anyhow::bail!("Unknown preset '{}'. Available: {:?}", name, PRESET_NAMES);
    };
    let config = EmitterConfig::from_options(&options, &ImageRegistry::new())?;
    println!("{}:", name);
    println!("{:#?}", config);

    Ok(())
}
