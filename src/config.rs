//! Tunable battle rules.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Battle configuration, loadable from RON. Missing fields fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    /// Fraction of max MP restored at the start of each fighter's turn
    pub mana_regen_rate: f64,
    /// How often a paused runner re-checks its flags, in milliseconds
    pub pause_poll_interval_ms: u64,
    /// Defense multiplier granted by a plain `defense` action
    pub defend_multiplier: f64,
    /// Turns a plain `defense` buff lasts
    pub defend_turns: u32,
    /// Agility weight in the flee advantage formula
    pub flee_agility_weight: f64,
    /// Fixed seed for battle randomness; `None` seeds from the OS
    pub rng_seed: Option<u64>,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            mana_regen_rate: 0.05,
            pause_poll_interval_ms: 50,
            defend_multiplier: 2.0,
            defend_turns: 2,
            flee_agility_weight: 0.2,
            rng_seed: None,
        }
    }
}

impl BattleConfig {
    /// Parse a configuration from a RON string.
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(source)?)
    }

    /// Load a configuration from a RON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_ron_str(&content)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    pub fn pause_poll_interval(&self) -> Duration {
        Duration::from_millis(self.pause_poll_interval_ms)
    }
}
