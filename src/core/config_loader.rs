// src/core/config_loader.rs

//! # Config Loader
//!
//! Loads the optional user configuration from `~/.config/ignite/config.toml`
//! (or the file named by `IGNITE_CONFIG`). A missing file is not an error;
//! every field falls back to its default. Forwarded flags override whatever
//! is loaded here.

use crate::constants::{CONFIG_DIR, CONFIG_FILENAME, CONFIG_PATH_ENV, DEFAULT_SEPARATOR, NO_COLOR_ENV};
use crate::core::completion::Shell;
use serde::Deserialize;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid separator '{0}' in config: it must be a single non-flag token")]
    InvalidSeparator(String),
}

/// User preferences that apply to every run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub separator: String,
    pub verbose: bool,
    pub completion_shell: Shell,
    /// `None` lets the terminal decide.
    pub color: Option<bool>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR.to_string(),
            verbose: false,
            completion_shell: Shell::default(),
            color: None,
        }
    }
}

impl Config {
    /// Loads the configuration from its usual location.
    pub fn load() -> Result<Self, ConfigError> {
        match config_path(std::env::var_os(CONFIG_PATH_ENV)) {
            Some(path) => Self::load_from(&path),
            None => {
                log::debug!("No config directory available, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Loads the configuration from `path`, or the defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("Config file '{}' not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        log::debug!("Loaded config from '{}': {:?}", path.display(), config);
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let separator = self.separator.as_str();
        if separator.is_empty() || separator.starts_with("--") || separator.contains(char::is_whitespace) {
            return Err(ConfigError::InvalidSeparator(self.separator.clone()));
        }
        Ok(())
    }

    /// The colour choice once `IGNITE_NO_COLOR` is taken into account.
    pub fn color_choice(&self) -> Option<bool> {
        color_choice(self.color, std::env::var_os(NO_COLOR_ENV).is_some())
    }
}

fn color_choice(configured: Option<bool>, no_color_env: bool) -> Option<bool> {
    if no_color_env { Some(false) } else { configured }
}

/// `IGNITE_CONFIG` when set, otherwise `<config dir>/ignite/config.toml`.
fn config_path(env_override: Option<OsString>) -> Option<PathBuf> {
    match env_override {
        Some(path) if !path.is_empty() => Some(PathBuf::from(path)),
        _ => dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILENAME)),
    }
}
