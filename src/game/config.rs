use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::game::grid::{BorderMode, DEFAULT_SEED};

pub const DEFAULT_CONFIG_PATH: &str = "assets/sim_config.ron";

/// Runner and host settings, loaded once at startup.
/// Missing fields take their default, so a config file may list only overrides.
#[derive(Resource, Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SimConfig {
    /// Ticks per second while running.
    pub tick_rate: f64,
    pub default_width: i32,
    pub default_height: i32,
    pub border_mode: BorderMode,
    /// Seed for the grid RNG used by random-choice cells.
    pub seed: u64,
    /// Stop after this many ticks. `None` runs until interrupted.
    pub max_ticks: Option<u64>,
    /// Level code format written when the runner exits.
    pub export_format: String,
    pub log_filter: String,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_rate: 10.0,
            default_width: 32,
            default_height: 32,
            border_mode: BorderMode::Default,
            seed: DEFAULT_SEED,
            max_ticks: None,
            export_format: "V3".to_string(),
            log_filter: "cellmachine=info".to_string(),
        }
    }
}

impl SimConfig {
    pub fn from_ron(contents: &str) -> Result<SimConfig, ron::error::SpannedError> {
        ron::from_str(contents)
    }

    /// Read `path`, falling back to the defaults if it is missing or invalid.
    pub fn load(path: impl AsRef<Path>) -> SimConfig {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(contents) => match SimConfig::from_ron(&contents) {
                Ok(config) => {
                    info!("Loaded sim config from {}", path.display());
                    config
                }
                Err(e) => {
                    error!("Failed to parse sim config: {}", e);
                    error!("Using default SimConfig");
                    SimConfig::default()
                }
            },
            Err(e) => {
                error!("Failed to read {}: {}", path.display(), e);
                error!("Using default SimConfig");
                SimConfig::default()
            }
        }
    }

    /// Seconds between ticks; non-positive rates fall back to the default.
    pub fn tick_interval(&self) -> f64 {
        if self.tick_rate > 0.0 {
            1.0 / self.tick_rate
        } else {
            1.0 / SimConfig::default().tick_rate
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = SimConfig::from_ron("(tick_rate: 4.0, border_mode: Wrap, max_ticks: Some(12))").unwrap();
        assert_eq!(config.tick_rate, 4.0);
        assert_eq!(config.border_mode, BorderMode::Wrap);
        assert_eq!(config.max_ticks, Some(12));
        assert_eq!(config.default_width, SimConfig::default().default_width);
        assert_eq!(config.export_format, "V3");
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        assert!(SimConfig::from_ron("(tick_rate: \"fast\")").is_err());
    }

    #[test]
    fn test_missing_file_falls_back_to_default() {
        assert_eq!(SimConfig::load("does/not/exist.ron"), SimConfig::default());
    }

    #[test]
    fn test_tick_interval() {
        let mut config = SimConfig { tick_rate: 4.0, ..Default::default() };
        assert_eq!(config.tick_interval(), 0.25);
        config.tick_rate = 0.0;
        assert_eq!(config.tick_interval(), 0.1);
    }
}
