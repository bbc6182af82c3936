use std::path::{Path, PathBuf};
use std::time::Duration;

use marble_maze_shared::config::MazeConfig;

use crate::headless::HeadlessConfig;

/// Environment variable naming an optional JSON config file
pub const CONFIG_ENV_VAR: &str = "MARBLE_MAZE_CONFIG";

/// Highest accepted physics rate; keeps the step at >= 1 ms
pub const MAX_PHYSICS_RATE_HZ: u32 = 1000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Runtime configuration for the headless game binary
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameConfig {
    pub physics_rate_hz: u32,
    pub frame_rate_hz: u32,
    /// How long the headless run lasts (seconds)
    pub run_seconds: f64,
    /// Drive the ball with the seeded autopilot
    pub autopilot: bool,
    pub rng_seed: u64,
    pub maze: MazeConfig,
    pub engine: HeadlessConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            physics_rate_hz: 60,
            frame_rate_hz: 15,
            run_seconds: 30.0,
            autopilot: true,
            rng_seed: 42,
            maze: MazeConfig::default(),
            engine: HeadlessConfig::default(),
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=MAX_PHYSICS_RATE_HZ).contains(&self.physics_rate_hz) {
            return Err(format!(
                "physics_rate_hz must be within 1..={}",
                MAX_PHYSICS_RATE_HZ
            ));
        }
        if self.frame_rate_hz == 0 || self.frame_rate_hz > self.physics_rate_hz {
            return Err("frame_rate_hz must be within 1..=physics_rate_hz".to_string());
        }
        if self.run_seconds <= 0.0 || Duration::try_from_secs_f64(self.run_seconds).is_err() {
            return Err("run_seconds must be > 0 and representable as a duration".to_string());
        }
        self.maze.validate()?;
        self.engine.validate()?;
        Ok(())
    }

    pub fn physics_dt(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.physics_rate_hz as f64)
    }

    pub fn force_interval(&self) -> Duration {
        Duration::from_millis(self.maze.force_interval_ms)
    }

    /// Length of the headless run. Zero if `run_seconds` is out of range,
    /// which `validate` rejects.
    pub fn run_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.run_seconds).unwrap_or_default()
    }

    /// Physics steps between two presentation frames
    pub fn frame_every_n_steps(&self) -> u32 {
        (self.physics_rate_hz / self.frame_rate_hz).max(1)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Load the file named by [`CONFIG_ENV_VAR`], or fall back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::load(Path::new(&path)),
            None => {
                let config = Self::default();
                config.validate().map_err(ConfigError::Invalid)?;
                Ok(config)
            }
        }
    }
}
