#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Last Stand session.

mod driver;
mod session;

use std::{path::PathBuf, time::Duration};

use anyhow::{ensure, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::{
    driver::{Driver, DriverOptions},
    session::SessionFile,
};

/// Simulates a co-op survival session driven by the wave director.
#[derive(Debug, Parser)]
#[command(name = "last-stand", version, about)]
struct Args {
    /// TOML session file; the built-in arena is used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Number of local players.
    #[arg(short, long, default_value_t = 1)]
    players: u32,
    /// Rounds to clear before stopping.
    #[arg(short, long, default_value_t = 5)]
    rounds: u32,
    /// Seed overriding the session file for reproducible runs.
    #[arg(short, long)]
    seed: Option<u64>,
    /// Simulated milliseconds per tick.
    #[arg(long, default_value_t = 50)]
    tick_ms: u64,
    /// Enemies the simulated players kill per second.
    #[arg(long, default_value_t = 4.0)]
    kills_per_second: f64,
    /// Chance of each extra player going down when a round activates.
    #[arg(long, default_value_t = 0.1)]
    down_chance: f64,
    /// Tick budget after which the run is abandoned.
    #[arg(long, default_value_t = 5_000_000)]
    max_ticks: u64,
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();
}

/// Entry point for the Last Stand command-line interface.
fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    ensure!(args.tick_ms > 0, "--tick-ms must be positive");
    ensure!(
        args.kills_per_second.is_finite() && args.kills_per_second > 0.0,
        "--kills-per-second must be positive"
    );
    ensure!(
        (0.0..=1.0).contains(&args.down_chance),
        "--down-chance must lie in [0, 1]"
    );

    let mut session = match &args.config {
        Some(path) => SessionFile::load(path)?,
        None => SessionFile::default(),
    };
    if args.seed.is_some() {
        session.director.rng_seed = args.seed;
    }

    let options = DriverOptions {
        players: args.players,
        rounds: args.rounds,
        tick: Duration::from_millis(args.tick_ms),
        kills_per_second: args.kills_per_second,
        down_chance: args.down_chance,
        max_ticks: args.max_ticks,
    };
    let report = Driver::new(session, options)?.run()?;

    println!(
        "cleared {} rounds in {} ticks: {} kills, {} respawns",
        report.rounds_cleared, report.ticks, report.total_killed, report.respawns
    );
    for player in &report.players {
        println!(
            "  player {} ({}) {} with {} points",
            player.identity.slot(),
            player.identity.device(),
            if player.alive { "standing" } else { "down" },
            player.points
        );
    }
    Ok(())
}
