//! # arena_server
//!
//! Runs an authoritative arena match at a fixed tick rate.
//!
//! ## Startup Sequence
//!
//! 1. Install logging (`RUST_LOG`, default `arena_server=info`).
//! 2. Load the optional JSON config and apply command-line overrides.
//! 3. Build the arena and enter the tick loop until `--max-ticks` or Ctrl-C.
//! 4. Print the final match statistics as JSON.

mod config;
mod demo;
mod tick;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::SimConfig;
use demo::Arena;
use tick::TickLoop;

#[derive(Debug, Parser)]
#[command(name = "arena_server", about = "Authoritative arena match simulation")]
struct Args {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Ticks per second, overriding the config file
    #[arg(long)]
    tick_rate: Option<f64>,

    /// Stop after this many ticks (0 = run until Ctrl-C)
    #[arg(long)]
    max_ticks: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("arena_server=info".parse()?))
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => {
            info!(path = %path.display(), "loading config");
            SimConfig::load(path)?
        }
        None => SimConfig::default(),
    }
    .with_overrides(args.tick_rate, args.max_ticks)?;

    info!(
        tick_rate = config.tick_rate,
        max_ticks = config.max_ticks,
        substeps = config.substeps,
        team_size = config.team_size,
        "arena server starting"
    );

    let arena = Arena::build(&config)?;
    let mut tick_loop = TickLoop::new(arena, &config);
    tick_loop.run().await?;

    println!("{}", serde_json::to_string_pretty(tick_loop.arena().stats())?);
    info!("arena server shut down");
    Ok(())
}
