//! Server configuration.
//!
//! Defaults come from [`SimConfig::default`], a JSON file may override any
//! subset of fields, and command-line flags override the file.

use std::path::Path;

use anyhow::{Context, Result, ensure};
use arena_gameplay::Bounds;
use serde::{Deserialize, Serialize};

/// Tunables for one simulated match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Target ticks per second.
    pub tick_rate: f64,
    /// Maximum number of ticks to run (0 = unlimited).
    pub max_ticks: u64,
    /// Physics sub-steps per tick.
    pub substeps: u32,
    /// Arena rectangle. Entities drifting past it are culled.
    pub bounds: Bounds,
    /// Seconds a downed player waits before respawning.
    pub respawn_delay: f32,
    /// Seconds between volleys fired by every living player.
    pub volley_interval: f32,
    /// Players per team.
    pub team_size: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            max_ticks: 0,
            substeps: 2,
            bounds: Bounds::new(-30.0, -20.0, 30.0, 20.0),
            respawn_delay: 3.0,
            volley_interval: 1.5,
            team_size: 3,
        }
    }
}

impl SimConfig {
    /// Parse a configuration from JSON. Missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON or values rejected by [`SimConfig::validate`].
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).context("invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a configuration file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("loading {}", path.display()))
    }

    /// Apply command-line overrides.
    ///
    /// # Errors
    ///
    /// Fails if the result no longer validates.
    pub fn with_overrides(mut self, tick_rate: Option<f64>, max_ticks: Option<u64>) -> Result<Self> {
        if let Some(tick_rate) = tick_rate {
            self.tick_rate = tick_rate;
        }
        if let Some(max_ticks) = max_ticks {
            self.max_ticks = max_ticks;
        }
        self.validate()?;
        Ok(self)
    }

    /// Reject values the tick loop or the physics world cannot run with.
    ///
    /// # Errors
    ///
    /// Describes the first offending field.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.tick_rate.is_finite() && self.tick_rate > 0.0,
            "tick_rate must be positive, got {}",
            self.tick_rate
        );
        ensure!(self.substeps >= 1, "substeps must be at least 1");
        ensure!(
            self.respawn_delay.is_finite() && self.respawn_delay >= 0.0,
            "respawn_delay must be non-negative, got {}",
            self.respawn_delay
        );
        ensure!(
            self.volley_interval.is_finite() && self.volley_interval > 0.0,
            "volley_interval must be positive, got {}",
            self.volley_interval
        );
        ensure!(
            self.bounds.min.x < self.bounds.max.x && self.bounds.min.y < self.bounds.max.y,
            "bounds are empty"
        );
        Ok(())
    }

    /// Simulated seconds per tick.
    #[must_use]
    pub fn tick_delta(&self) -> f32 {
        (1.0 / self.tick_rate) as f32
    }
}
