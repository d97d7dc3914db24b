//! Opinion Flocking Engine
//!
//! Headless driver: runs the simulation against a synthetic 60 Hz clock and
//! reports polarization, cost counters and throughput as it goes.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use flock_core::config::DEFAULT_CONFIG_PATH;
use flock_core::{Algorithm, SimConfig, SimError, Simulation};

/// Milliseconds between synthetic host frames
const FRAME_INTERVAL_MS: f64 = 1000.0 / 60.0;

/// Command line arguments for the simulation
#[derive(Parser, Debug)]
#[command(name = "opinion_flock")]
#[command(about = "Two-population opinion flocking simulation")]
struct Args {
    /// TOML configuration file (defaults to opinion_flock.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Number of ticks to simulate
    #[arg(long, default_value_t = 600)]
    ticks: u64,

    /// Number of follower agents
    #[arg(long)]
    agents: Option<usize>,

    /// Number of opinion sources
    #[arg(long)]
    sources: Option<usize>,

    /// Influence strategy: naive or optimized
    #[arg(long)]
    algorithm: Option<Algorithm>,

    /// Speed multiplier applied to every frame delta
    #[arg(long)]
    speed: Option<f32>,

    /// Report naive vs optimized distance checks on the initial population
    #[arg(long)]
    compare: bool,

    /// Print the final snapshot as JSON
    #[arg(long)]
    json: bool,

    /// Interval between progress lines (in ticks)
    #[arg(long, default_value_t = 60)]
    progress_interval: u64,
}

fn load_config(args: &Args) -> Result<SimConfig, SimError> {
    let mut config = match &args.config {
        Some(path) => SimConfig::from_file(path)?,
        None => {
            let default_path = PathBuf::from(DEFAULT_CONFIG_PATH);
            if default_path.exists() {
                SimConfig::from_file(&default_path)?
            } else {
                SimConfig::default()
            }
        }
    };

    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(agents) = args.agents {
        config.agent_count = agents;
    }
    if let Some(sources) = args.sources {
        config.source_count = sources;
    }
    if let Some(algorithm) = args.algorithm {
        config.algorithm = algorithm;
    }
    if let Some(speed) = args.speed {
        config.speed_multiplier = speed;
    }
    Ok(config)
}

fn run(args: &Args) -> Result<(), SimError> {
    let config = load_config(args)?;
    let mut sim = Simulation::new(config)?;

    let comparison = args.compare.then(|| sim.compare_resolvers());
    if let Some(comparison) = comparison {
        info!(
            naive_checks = comparison.naive_checks,
            grid_checks = comparison.grid_checks,
            check_ratio = %format!("{:.3}", comparison.check_ratio()),
            differing_opinions = comparison.differing_opinions,
            "Resolver comparison on initial population"
        );
    }

    let mut snapshot = sim.snapshot();
    for frame in 0..args.ticks {
        snapshot = sim.step(frame as f64 * FRAME_INTERVAL_MS)?;

        if let Some(sample) = snapshot.throughput {
            info!(
                tick = snapshot.tick,
                ticks_per_second = %format!("{:.1}", sample.ticks_per_second()),
                "Throughput"
            );
        }
        if args.progress_interval > 0 && snapshot.tick % args.progress_interval == 0 {
            info!(
                tick = snapshot.tick,
                radical = snapshot.radical_count(),
                neutral = snapshot.neutral_count(),
                polarization = %format!("{:.3}", snapshot.metrics.polarization),
                distance_checks = snapshot.metrics.distance_checks,
                compute_ms = %format!("{:.3}", snapshot.metrics.compute_time_ms),
                "Progress"
            );
        }
    }

    info!(
        ticks = snapshot.tick,
        radical = snapshot.radical_count(),
        neutral = snapshot.neutral_count(),
        polarization = %format!("{:.3}", snapshot.metrics.polarization),
        "Simulation complete"
    );

    if args.json {
        let output = match comparison {
            Some(comparison) => serde_json::to_string_pretty(&serde_json::json!({
                "comparison": {
                    "naive_checks": comparison.naive_checks,
                    "grid_checks": comparison.grid_checks,
                    "differing_opinions": comparison.differing_opinions,
                },
                "snapshot": snapshot,
            })),
            None => snapshot.to_json_pretty(),
        };
        match output {
            Ok(json) => println!("{json}"),
            Err(e) => error!("Could not serialize final snapshot: {}", e),
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
