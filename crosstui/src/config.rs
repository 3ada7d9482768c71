//! Settings read from an optional TOML file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs, io};
use thiserror::Error;

/// Where the config is looked for when no `--config` flag is given.
pub const DEFAULT_CONFIG_FILE: &str = "crosstui.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("could not read {path}: {source}")]
  Read { path: PathBuf, source: io::Error },
  #[error("invalid config {path}: {source}")]
  Parse {
    path: PathBuf,
    source: toml::de::Error,
  },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  pub grid: GridConfig,
  pub progress: ProgressConfig,
  pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
  /// Puzzles are expected to be `size` by `size`.
  pub size: usize,
}

impl Default for GridConfig {
  fn default() -> Self {
    Self {
      size: crossword::STANDARD_SIZE,
    }
  }
}

/// Who is solving and where their progress is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
  pub user: String,
  pub directory: PathBuf,
  pub save_interval_ms: u64,
}

impl Default for ProgressConfig {
  fn default() -> Self {
    Self {
      user: env::var("USER").unwrap_or_else(|_| "anonymous".to_owned()),
      directory: PathBuf::from("progress"),
      save_interval_ms: crossword::progress::DEFAULT_SAVE_INTERVAL.as_millis() as u64,
    }
  }
}

impl ProgressConfig {
  pub fn save_interval(&self) -> Duration {
    Duration::from_millis(self.save_interval_ms)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
  pub file: PathBuf,
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      file: PathBuf::from("crosstui.log"),
    }
  }
}

impl Config {
  /// Reads `path`, or [DEFAULT_CONFIG_FILE] if it exists. With no file at all
  /// the defaults are used; an explicitly named file must exist.
  pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
    let path = match path {
      Some(path) => path.to_path_buf(),
      None => {
        let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
        if !fallback.exists() {
          return Ok(Self::default());
        }
        fallback
      }
    };
    let text = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
      path: path.clone(),
      source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::Parse { path, source })
  }
}
