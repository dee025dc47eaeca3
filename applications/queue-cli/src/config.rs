/// Harness configuration
use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use soul_queue::EngineConfig;
use std::path::{Path, PathBuf};

/// Config file picked up when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "soul-queue.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CliConfig {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub simulation: SimulationSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationSettings {
    /// Length of every simulated track
    #[serde(default = "default_track_duration_secs")]
    pub track_duration_secs: f64,

    /// Virtual seconds per simulation step
    #[serde(default = "default_step_secs")]
    pub step_secs: f64,

    /// Stop the simulation after this many virtual seconds
    #[serde(default = "default_max_secs")]
    pub max_secs: f64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            track_duration_secs: default_track_duration_secs(),
            step_secs: default_step_secs(),
            max_secs: default_max_secs(),
        }
    }
}

impl CliConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        let config_path = path.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), Path::to_path_buf);
        if config_path.exists() {
            settings = settings.add_source(config::File::from(config_path));
        } else if path.is_some() {
            return Err(CliError::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )));
        }

        // Override with environment variables, e.g. SOUL_QUEUE_ENGINE__PRIME_NEXT=false
        settings = settings.add_source(
            config::Environment::with_prefix("SOUL_QUEUE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = settings.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.engine.progress_interval_ms == 0 {
            return Err(CliError::Config(
                "engine.progress_interval_ms must be at least 1".to_string(),
            ));
        }

        if !self.engine.preload_lead_secs.is_finite() || self.engine.preload_lead_secs < 0.0 {
            return Err(CliError::Config(format!(
                "engine.preload_lead_secs must be a non-negative number, got {}",
                self.engine.preload_lead_secs
            )));
        }

        let simulation = &self.simulation;
        for (name, value) in [
            ("simulation.track_duration_secs", simulation.track_duration_secs),
            ("simulation.step_secs", simulation.step_secs),
            ("simulation.max_secs", simulation.max_secs),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(CliError::Config(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }

        Ok(())
    }
}

// Default values
fn default_track_duration_secs() -> f64 {
    30.0
}

fn default_step_secs() -> f64 {
    0.25
}

fn default_max_secs() -> f64 {
    600.0
}
