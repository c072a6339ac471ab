//! CLI configuration file support.
//!
//! This module provides support for loading configuration from TOML files.
//! Configuration can be loaded from:
//! 1. An explicit path specified via --config flag
//! 2. The XDG config directory (~/.config/tgx/config.toml)
//! 3. Fall back to defaults

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse TOML config: {0}")]
    TomlError(#[from] toml::de::Error),
}

/// Serialization format for lowered tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// YAML (default).
    #[default]
    Yaml,
    /// Pretty-printed JSON.
    Json,
}

/// Output configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Format used by `tgx lower` (default: yaml).
    #[serde(default)]
    pub format: OutputFormat,
}

/// Top-level configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Output configuration.
    #[serde(default)]
    pub output: OutputConfig,

    /// Parameters handed to every transform stage.
    #[serde(default)]
    pub params: HashMap<String, String>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &PathBuf) -> Result<Self, CliConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Get the default XDG config path (~/.config/tgx/config.toml).
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut path| {
            path.push("tgx");
            path.push("config.toml");
            path
        })
    }

    /// Load configuration with priority:
    /// 1. Explicit config path if provided
    /// 2. XDG config path if it exists
    /// 3. Default configuration
    pub fn load(explicit_path: Option<PathBuf>) -> Result<Self, CliConfigError> {
        if let Some(path) = explicit_path {
            return Self::from_file(&path);
        }

        if let Some(path) = Self::default_config_path()
            && path.exists()
        {
            return Self::from_file(&path);
        }

        Ok(Self::default())
    }

    /// Merge parameters from the command line over the file's `[params]`.
    pub fn merged_params(&self, overrides: Vec<(String, String)>) -> HashMap<String, String> {
        let mut params = self.params.clone();
        params.extend(overrides);
        params
    }
}

/// Parse a `KEY=VALUE` command-line parameter.
pub fn parse_param(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", raw)),
    }
}
