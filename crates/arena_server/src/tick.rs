//! Real-time tick loop.
//!
//! Paces [`Arena::tick`] at the configured rate:
//!
//! 1. Wait for the next interval tick, or for Ctrl-C.
//! 2. Advance the simulation by one fixed step.
//! 3. Warn if the step overran its budget.
//! 4. Stop once `max_ticks` is reached (0 = unlimited).

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::SimConfig;
use crate::demo::{Arena, BLUE, RED};

/// Seconds of simulated time between periodic stat reports.
const REPORT_EVERY_SECS: f64 = 10.0;

/// Drives an [`Arena`] in real time.
#[derive(Debug)]
pub struct TickLoop {
    arena: Arena,
    tick_rate: f64,
    max_ticks: u64,
    delta: f32,
    overruns: u64,
}

impl TickLoop {
    /// Drive `arena` at the rate and tick limit in `config`.
    #[must_use]
    pub fn new(arena: Arena, config: &SimConfig) -> Self {
        Self {
            arena,
            tick_rate: config.tick_rate,
            max_ticks: config.max_ticks,
            delta: config.tick_delta(),
            overruns: 0,
        }
    }

    /// Ticks run so far.
    #[must_use]
    pub fn tick_id(&self) -> u64 {
        self.arena.engine().tick_id()
    }

    /// The match being run.
    #[must_use]
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Ticks that took longer than their budget.
    #[must_use]
    pub fn overruns(&self) -> u64 {
        self.overruns
    }

    fn is_finished(&self) -> bool {
        self.max_ticks > 0 && self.tick_id() >= self.max_ticks
    }

    /// Run one tick and time it against `budget`.
    fn step(&mut self, budget: Duration) {
        let start = Instant::now();
        self.arena.tick(self.delta);
        let elapsed = start.elapsed();
        debug!(tick_id = self.tick_id(), elapsed_us = elapsed.as_micros() as u64, "tick done");

        if elapsed > budget {
            self.overruns += 1;
            warn!(
                tick_id = self.tick_id(),
                elapsed_ms = elapsed.as_millis() as u64,
                budget_ms = budget.as_millis() as u64,
                "tick exceeded time budget"
            );
        }
    }

    /// Run until `max_ticks` or Ctrl-C.
    ///
    /// # Errors
    ///
    /// Fails if the Ctrl-C handler cannot be installed.
    pub async fn run(&mut self) -> Result<()> {
        let budget = Duration::from_secs_f64(1.0 / self.tick_rate);
        let report_every = ((REPORT_EVERY_SECS * self.tick_rate) as u64).max(1);
        let mut interval = tokio::time::interval(budget);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        info!(
            tick_rate = self.tick_rate,
            max_ticks = self.max_ticks,
            "starting tick loop"
        );

        while !self.is_finished() {
            tokio::select! {
                _ = interval.tick() => {}
                signal = &mut shutdown => {
                    signal.context("listening for Ctrl-C")?;
                    info!(tick_id = self.tick_id(), "shutdown requested");
                    break;
                }
            }

            self.step(budget);
            if self.tick_id() % report_every == 0 {
                self.report();
            }
        }

        info!(ticks = self.tick_id(), overruns = self.overruns, "tick loop complete");
        self.report();
        Ok(())
    }

    /// Log the match so far.
    pub fn report(&self) {
        let stats = self.arena.stats();
        info!(
            tick_id = self.tick_id(),
            entities = self.arena.engine().world().entity_count(),
            shots = self.arena.shots_fired(),
            hits = stats.hits,
            damage = stats.damage_dealt,
            downs = stats.downs,
            respawns = stats.respawns,
            captures = stats.captures,
            red_standing = self.arena.standing(RED),
            blue_standing = self.arena.standing(BLUE),
            owner = ?self.arena.capture_owner(),
            "match report"
        );
    }
}
