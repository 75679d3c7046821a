//! Configuration for the admin tools
//!
//! Loaded from a TOML file; environment variables override file values.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ENV_PERMANENT_DIR: &str = "ADMINTOOLS_PERMANENT_DIR";
pub const ENV_INSTALL_ROOT: &str = "ADMINTOOLS_INSTALL_ROOT";
pub const ENV_LOG_LEVEL: &str = "ADMINTOOLS_LOG_LEVEL";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse config file {0}: {1}")]
    Parse(PathBuf, #[source] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminToolsConfig {
    /// Directory for data that must survive restarts (backups, run reports)
    pub permanent_dir: PathBuf,

    /// Root of the installation that uploads are applied to
    pub install_root: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

fn default_permanent_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("admintools")
}

impl Default for AdminToolsConfig {
    fn default() -> Self {
        Self {
            permanent_dir: default_permanent_dir(),
            install_root: PathBuf::from("."),
            log_level: "info".to_string(),
        }
    }
}

impl AdminToolsConfig {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
    }

    /// Load from `path` when given, defaults otherwise, then apply the environment
    ///
    /// # Errors
    /// Returns an error if a given file cannot be loaded
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(config.with_overrides(|key| std::env::var(key).ok()))
    }

    /// Apply overrides from a variable lookup (the process environment in `load`)
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(dir) = lookup(ENV_PERMANENT_DIR).filter(|v| !v.is_empty()) {
            self.permanent_dir = PathBuf::from(dir);
        }
        if let Some(root) = lookup(ENV_INSTALL_ROOT).filter(|v| !v.is_empty()) {
            self.install_root = PathBuf::from(root);
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL).filter(|v| !v.is_empty()) {
            self.log_level = level;
        }
        self
    }

    /// `<permanent>/adminTools/backup`
    #[must_use]
    pub fn backup_root(&self) -> PathBuf {
        self.permanent_dir.join("adminTools").join("backup")
    }

    /// Backup directory owned by one run
    #[must_use]
    pub fn run_backup_dir(&self, run_id: &str) -> PathBuf {
        self.backup_root().join(run_id)
    }

    /// `<permanent>/adminTools/status`
    #[must_use]
    pub fn status_dir(&self) -> PathBuf {
        self.permanent_dir.join("adminTools").join("status")
    }
}
