//! # Playback Configuration

use crate::error::{PlaybackError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables of the playback coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Period of elapsed-time events while playing. The first event is
    /// emitted as soon as playback starts.
    ///
    /// Default: 1000 ms.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Volume while another app holds ducking focus.
    ///
    /// Default: 0.3.
    #[serde(default = "default_duck_volume")]
    pub duck_volume: f32,

    /// Volume restored on focus gain and on play.
    ///
    /// Default: 1.0.
    #[serde(default = "default_full_volume")]
    pub full_volume: f32,

    /// Seed for shuffle permutations. `None` seeds from the OS.
    #[serde(default)]
    pub shuffle_seed: Option<u64>,
}

fn default_tick_interval_ms() -> u64 {
    1_000
}

fn default_duck_volume() -> f32 {
    0.3
}

fn default_full_volume() -> f32 {
    1.0
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            duck_volume: default_duck_volume(),
            full_volume: default_full_volume(),
            shuffle_seed: None,
        }
    }
}

impl PlaybackConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn with_duck_volume(mut self, volume: f32) -> Self {
        self.duck_volume = volume;
        self
    }

    pub fn with_shuffle_seed(mut self, seed: u64) -> Self {
        self.shuffle_seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 {
            return Err(PlaybackError::InvalidConfig(
                "tick_interval_ms must be > 0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.duck_volume) {
            return Err(PlaybackError::InvalidConfig(
                "duck_volume must be between 0.0 and 1.0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.full_volume) || self.full_volume < self.duck_volume {
            return Err(PlaybackError::InvalidConfig(
                "full_volume must be between duck_volume and 1.0".to_string(),
            ));
        }

        Ok(())
    }
}
