use crate::app_dirs::AppDirs;
use crate::{FEEDBACK_DELAY_MS, INITIAL_TIMER, MAX_ROUNDS, OPTION_COUNT, TICK_INTERVAL_MS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// Options are picked with the digit keys, so at most nine fit
pub const MAX_OPTION_COUNT: usize = 9;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub max_rounds: u32,
    pub option_count: usize,
    /// Countdown per round, in whole time units
    pub initial_timer: u32,
    pub tick_interval_ms: u64,
    pub feedback_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_rounds: MAX_ROUNDS,
            option_count: OPTION_COUNT,
            initial_timer: INITIAL_TIMER,
            tick_interval_ms: TICK_INTERVAL_MS,
            feedback_delay_ms: FEEDBACK_DELAY_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("a game needs at least one round")]
    ZeroRounds,
    #[error("option count must be between 1 and {max}, got {count}")]
    OptionCount { count: usize, max: usize },
    #[error("round timer must be at least one unit")]
    ZeroTimer,
    #[error("tick interval must be at least 1ms")]
    ZeroTickInterval,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_rounds == 0 {
            return Err(ConfigError::ZeroRounds);
        }
        if !(1..=MAX_OPTION_COUNT).contains(&self.option_count) {
            return Err(ConfigError::OptionCount {
                count: self.option_count,
                max: MAX_OPTION_COUNT,
            });
        }
        if self.initial_timer == 0 {
            return Err(ConfigError::ZeroTimer);
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::ZeroTickInterval);
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn feedback_delay(&self) -> Duration {
        Duration::from_millis(self.feedback_delay_ms)
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("swatch_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring unreadable config");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}
