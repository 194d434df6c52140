//! Layered configuration for the `limoka` CLI.
//!
//! Precedence, lowest first: built-in defaults, the TOML config file
//! (`--config` or the platform config dir), `LIMOKA_*` environment
//! variables, then command-line flags.
//!
//! # Example Configuration
//!
//! ```toml
//! catalog_url = "https://limoka.vsecoder.dev/api"
//! timeout_secs = 10
//! matcher = "staged"
//! prefix = "."
//!
//! [staged]
//! fuzzy_mode = "per-token"
//! substring_case_sensitive = false
//!
//! [scored]
//! metric = "jaro-winkler"
//! min_confidence = 0.6
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::catalog::{DEFAULT_CATALOG_URL, DEFAULT_TIMEOUT_SECS};
use crate::search::{FuzzyMode, MatcherKind, ScoredConfig, StagedConfig};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub catalog_url: String,
    pub timeout_secs: u64,
    pub matcher: MatcherKind,
    /// Command prefix shown in rendered command lists.
    pub prefix: String,
    pub staged: StagedConfig,
    pub scored: ScoredConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            matcher: MatcherKind::Staged,
            prefix: ".".to_string(),
            staged: StagedConfig::default(),
            scored: ScoredConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load defaults, then the config file, then environment overrides.
    ///
    /// An explicit path must exist; the platform default is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut cfg = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        cfg.apply_env();
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "config_loaded");
        Ok(cfg)
    }

    /// Apply `LIMOKA_*` environment overrides. Unparseable values are
    /// logged and ignored.
    pub fn apply_env(&mut self) {
        if let Ok(val) = dotenvy::var("LIMOKA_CATALOG_URL") {
            self.catalog_url = val;
        }

        if let Ok(val) = dotenvy::var("LIMOKA_TIMEOUT_SECS") {
            match val.parse() {
                Ok(secs) => self.timeout_secs = secs,
                Err(_) => warn!(value = %val, "ignoring invalid LIMOKA_TIMEOUT_SECS"),
            }
        }

        if let Ok(val) = dotenvy::var("LIMOKA_MATCHER") {
            match val.parse() {
                Ok(kind) => self.matcher = kind,
                Err(e) => warn!("ignoring LIMOKA_MATCHER: {e}"),
            }
        }

        if let Ok(val) = dotenvy::var("LIMOKA_PREFIX") {
            self.prefix = val;
        }

        if let Ok(val) = dotenvy::var("LIMOKA_MIN_CONFIDENCE") {
            match val.parse::<f64>() {
                Ok(floor) if (0.0..=1.0).contains(&floor) => self.scored.min_confidence = floor,
                _ => warn!(value = %val, "ignoring invalid LIMOKA_MIN_CONFIDENCE"),
            }
        }

        if let Ok(val) = dotenvy::var("LIMOKA_FUZZY_MODE") {
            match val.trim() {
                "whole-query" => self.staged.fuzzy_mode = FuzzyMode::WholeQuery,
                "per-token" => self.staged.fuzzy_mode = FuzzyMode::PerToken,
                other => warn!(value = other, "ignoring invalid LIMOKA_FUZZY_MODE"),
            }
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// `config.toml` under the platform config dir.
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "limoka", "limoka")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}
