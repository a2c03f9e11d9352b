//! Configuration management
//!
//! Handles loading and validation of the analysis configuration.

use crate::normality::NormalityMethod;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Inclusive lower bound of the relative offset range
    #[serde(default = "default_period_start")]
    pub period_start: i32,

    /// Exclusive upper bound of the relative offset range
    #[serde(default = "default_period_end")]
    pub period_end: i32,

    /// First calendar year fetched from the sources
    #[serde(default = "default_year_start")]
    pub year_start: i32,

    /// Last calendar year fetched from the sources
    #[serde(default = "default_year_end")]
    pub year_end: i32,

    /// Base directory for CSV and image output
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Normality test to run, if any
    #[serde(default)]
    pub test: Option<NormalityMethod>,

    /// Render one volume chart per event
    #[serde(default)]
    pub plot: bool,
}

fn default_period_start() -> i32 {
    -5
}

fn default_period_end() -> i32 {
    6
}

fn default_year_start() -> i32 {
    2020
}

fn default_year_end() -> i32 {
    2023
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./trading_activity_analysis_results/")
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            period_start: default_period_start(),
            period_end: default_period_end(),
            year_start: default_year_start(),
            year_end: default_year_end(),
            output_dir: default_output_dir(),
            test: None,
            plot: false,
        }
    }
}

impl AnalysisConfig {
    /// Number of entries every event window holds
    pub fn window_len(&self) -> usize {
        (self.period_end - self.period_start).max(0) as usize
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.period_start >= self.period_end {
            return Err(ConfigError::ValidationError(format!(
                "period_start ({}) must be less than period_end ({})",
                self.period_start, self.period_end
            )));
        }

        if self.year_start > self.year_end {
            return Err(ConfigError::ValidationError(format!(
                "year_start ({}) must not exceed year_end ({})",
                self.year_start, self.year_end
            )));
        }

        if self.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "output_dir must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AnalysisConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: AnalysisConfig =
        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    config.validate()?;
    Ok(config)
}
