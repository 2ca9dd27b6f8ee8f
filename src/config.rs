//! Player configuration, read from a JSON file.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PlayerError, PlayerResult};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "HLSPLAY_CONFIG";

/// Limits on in-place recovery of fatal engine errors.
///
/// `None` means retry forever, which is also the default.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_network_retries: Option<u32>,
    pub max_media_recoveries: Option<u32>,
}

impl RetryPolicy {
    pub fn allows_network_retry(&self, attempts_so_far: u32) -> bool {
        self.max_network_retries.is_none_or(|max| attempts_so_far < max)
    }

    pub fn allows_media_recovery(&self, attempts_so_far: u32) -> bool {
        self.max_media_recoveries.is_none_or(|max| attempts_so_far < max)
    }
}

/// Timing of the scripted engine used by the demo binary
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub clip_length_ms: u64,
    pub tick_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            clip_length_ms: 3_000,
            tick_ms: 250,
        }
    }
}

impl SimulationConfig {
    pub fn clip_length(&self) -> Duration {
        Duration::from_millis(self.clip_length_ms)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub retry: RetryPolicy,
    pub log_filter: Option<String>,
    pub simulation: SimulationConfig,
}

impl PlayerConfig {
    pub fn load(path: impl AsRef<Path>) -> PlayerResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: PlayerConfig = serde_json::from_str(&content)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }

    /// Load from the file named by `HLSPLAY_CONFIG`, or defaults when unset.
    pub fn from_env() -> PlayerResult<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> PlayerResult<()> {
        if self.simulation.clip_length_ms == 0 {
            return Err(PlayerError::Config(
                "simulation.clip_length_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
