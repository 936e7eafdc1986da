use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use weft_generate::GenerateOptions;

/// File read when `--config` is not given, if it exists.
pub const DEFAULT_CONFIG_FILE: &str = "weft.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Json,
    Jsonl,
    Csv,
}

/// Contents of `weft.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WeftConfig {
    pub generate: GenerateSection,
}

/// `[generate]` defaults. Command-line flags take precedence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerateSection {
    pub size: Option<u64>,
    pub seed: Option<u64>,
    pub null_rate: Option<f64>,
    pub max_unique_attempts: Option<u32>,
    pub max_empty_passes: Option<u32>,
    pub output: Option<OutputFormat>,
    pub out: Option<PathBuf>,
}

impl GenerateSection {
    /// Engine options with every configured value applied over the defaults.
    pub fn options(&self) -> GenerateOptions {
        let defaults = GenerateOptions::default();
        GenerateOptions {
            size: self.size.unwrap_or(defaults.size),
            seed: self.seed,
            collection: None,
            null_rate: self.null_rate.unwrap_or(defaults.null_rate),
            max_unique_attempts: self
                .max_unique_attempts
                .unwrap_or(defaults.max_unique_attempts),
            max_empty_passes: self.max_empty_passes.unwrap_or(defaults.max_empty_passes),
        }
    }
}

/// Loads `path`, or `weft.toml` from the working directory when present.
/// No file at all yields the defaults.
pub fn load_config(path: Option<&Path>) -> Result<WeftConfig, ConfigError> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !fallback.exists() {
                return Ok(WeftConfig::default());
            }
            fallback
        }
    };
    let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    parse_config(&content).map_err(|source| ConfigError::Toml { path, source })
}

pub fn parse_config(content: &str) -> Result<WeftConfig, toml::de::Error> {
    toml::from_str(content)
}
