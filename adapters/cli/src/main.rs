#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays the Siege wave generator against a
//! simulated game clock and prints every wave it produces.

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use siege_core::{EnemyTypeRegistry, GeneratorConfig, Tower, Wave};
use siege_system_wave_generation::{Clock, ManualClock, WaveGeneration, WaveRng};

const DEFAULT_SEED: u64 = 0x5133_6e00_2f1a_77c3;

/// Simulates the normal-difficulty opponent and prints its waves.
#[derive(Debug, Parser)]
#[command(name = "siege", version, about)]
struct CliArgs {
    /// Seed for the generator's random stream.
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,
    /// Number of waves to print before exiting.
    #[arg(long, default_value_t = 12)]
    waves: u32,
    /// Length of a simulated game tick in milliseconds.
    #[arg(
        long = "tick-ms",
        default_value_t = 250,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    tick_ms: u64,
    /// Classification tag of a player tower; repeat for several towers.
    #[arg(long = "tower", value_name = "TAG")]
    towers: Vec<String>,
    /// TOML file overriding the enemy registry and wave patterns.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Log phase changes and wave decisions.
    #[arg(short, long)]
    verbose: bool,
}

/// Entry point for the Siege command-line interface.
fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(args.verbose);

    let config = match &args.config {
        Some(path) => GeneratorConfig::from_path(path)
            .with_context(|| format!("failed to load generator config {}", path.display()))?,
        None => GeneratorConfig::default(),
    };
    let towers: Vec<Tower> = args.towers.iter().map(Tower::new).collect();

    let clock = ManualClock::new();
    let mut generation =
        WaveGeneration::new(config, ChaCha8Rng::seed_from_u64(args.seed), clock.clone())
            .context("generator configuration is inconsistent")?;
    log::info!(
        "simulating {} waves with seed {:#x} against towers [{}]",
        args.waves,
        args.seed,
        towers
            .iter()
            .map(Tower::classification)
            .collect::<Vec<_>>()
            .join(", ")
    );

    let tick = Duration::from_millis(args.tick_ms);
    for line in simulate(&mut generation, &clock, &towers, args.waves, tick) {
        println!("{line}");
    }

    Ok(())
}

/// Advances `clock` tick by tick until `waves` waves have been produced.
fn simulate<R: WaveRng>(
    generation: &mut WaveGeneration<R, ManualClock>,
    clock: &ManualClock,
    towers: &[Tower],
    waves: u32,
    tick: Duration,
) -> Vec<String> {
    let mut lines = Vec::with_capacity(waves as usize);
    while lines.len() < waves as usize {
        if let Some(wave) = generation.generate_wave(towers) {
            lines.push(describe_wave(clock.elapsed(), &wave, generation.registry()));
        }
        clock.advance(tick);
    }
    lines
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    let env = env_logger::Env::default().default_filter_or(default_filter);
    let _ = env_logger::Builder::from_env(env).try_init();
}

fn describe_wave(at: Duration, wave: &Wave, registry: &EnemyTypeRegistry) -> String {
    let summary = wave.summary(registry);
    let adaptation = wave
        .adaptation()
        .map_or_else(|| "-".to_owned(), |adaptation| adaptation.to_string());
    format!(
        "[{:>7.2}s] wave {:>3} {:<5} {:<9} adapt={:<20} cost={:<4} hp={:<5} {}",
        at.as_secs_f64(),
        wave.number(),
        wave.phase().to_string(),
        wave.strategy().name(),
        adaptation,
        summary.total_cost,
        summary.total_hp,
        wave.enemy_names().join(" ")
    )
}
