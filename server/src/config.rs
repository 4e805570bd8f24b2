use std::path::{Path, PathBuf};

use engine::config::SimConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config file: {0}")]
  Read(#[from] std::io::Error),
  #[error("failed to parse config file: {0}")]
  Parse(#[from] toml::de::Error),
}

/// TOML overlay on top of the engine defaults. Every field is optional; the
/// `[engine]` table may itself be partial.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
  pub seed: Option<u64>,
  /// Ticks per second of wall time.
  pub rate: Option<usize>,
  /// Total simulation length, in ticks.
  pub duration: Option<u64>,
  /// Where to write the per-tick world snapshot.
  pub save_to: Option<PathBuf>,

  pub engine: Option<SimConfig>,
}

impl Config {
  pub fn from_path<T>(path: T) -> Result<Self, ConfigError>
  where
    T: AsRef<Path>,
  {
    let config = std::fs::read_to_string(path.as_ref())?;
    Ok(toml::from_str(&config)?)
  }

  pub fn sim_config(&self) -> SimConfig {
    self.engine.unwrap_or_default()
  }
}
