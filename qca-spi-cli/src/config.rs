//! Configuration loading and merging
//!
//! A TOML file can hold everything the command line accepts; flags given on
//! the command line win over the file.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use qca_spi_decoder::{CaptureFormat, DecoderConfig, TimestampPrecision};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::Args;

/// Main application configuration (loaded from a TOML file)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub decoder: DecoderSection,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InputConfig {
    pub file: Option<PathBuf>,
    #[serde(default)]
    pub format: CaptureFormat,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    pub file: Option<PathBuf>,
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub precision: TimestampPrecision,
    pub summary_json: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DecoderSection {
    #[serde(default)]
    pub verify_footer: bool,
}

/// Problems with the merged configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Input filename not given (use --input or [input] file)")]
    MissingInput,

    #[error("Output filename not given (use --output or [output] file)")]
    MissingOutput,

    #[error("Input and output are the same file: {0:?}")]
    SameFile(PathBuf),
}

/// Everything needed for one conversion
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub input: PathBuf,
    pub output: PathBuf,
    pub summary_json: Option<PathBuf>,
    pub decoder: DecoderConfig,
}

impl AppConfig {
    /// Apply command-line overrides and check that the run is complete
    pub fn merge(self, args: &Args) -> std::result::Result<RunPlan, ConfigError> {
        let input = args
            .input
            .clone()
            .or(self.input.file)
            .ok_or(ConfigError::MissingInput)?;
        let output = args
            .output
            .clone()
            .or(self.output.file)
            .ok_or(ConfigError::MissingOutput)?;

        if input == output {
            return Err(ConfigError::SameFile(input));
        }

        let mut decoder = DecoderConfig::new()
            .with_format(args.format.unwrap_or(self.input.format))
            .with_footer_verification(args.verify_footer || self.decoder.verify_footer)
            .with_precision(args.precision().unwrap_or(self.output.precision));
        if let Some(start_time) = args.start_time.or(self.output.start_time) {
            decoder = decoder.with_start_time(start_time);
        }

        Ok(RunPlan {
            input,
            output,
            summary_json: args.summary_json.clone().or(self.output.summary_json),
            decoder,
        })
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}
