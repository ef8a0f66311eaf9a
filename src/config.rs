//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.complaint-report.toml` files.

use crate::report::{LineTerminator, OutputFormat, DEFAULT_INCLUDE_HEADER};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the current directory.
pub const CONFIG_FILE_NAME: &str = ".complaint-report.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Input table settings.
    #[serde(default)]
    pub input: InputConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Input table settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Field delimiter of the complaint CSV.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
        }
    }
}

fn default_delimiter() -> char {
    ','
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Write a header row first.
    #[serde(default = "default_include_header")]
    pub include_header: bool,

    /// Add the company with the most complaints to every row.
    #[serde(default)]
    pub most_complaints: bool,

    /// Field delimiter of the CSV report.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Record terminator of the CSV report ("lf" or "crlf").
    #[serde(default)]
    pub line_terminator: LineTerminator,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            include_header: default_include_header(),
            most_complaints: false,
            delimiter: default_delimiter(),
            line_terminator: LineTerminator::default(),
        }
    }
}

fn default_include_header() -> bool {
    DEFAULT_INCLUDE_HEADER
}

/// Check that a delimiter can be used as a single CSV byte.
pub fn check_delimiter(delimiter: char) -> Result<(), String> {
    if !delimiter.is_ascii() || delimiter == '"' || delimiter == '\n' || delimiter == '\r' {
        return Err(format!("Invalid delimiter: {:?}", delimiter));
    }
    Ok(())
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .validate()
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Check values that the type system can't.
    pub fn validate(&self) -> Result<(), String> {
        check_delimiter(self.input.delimiter)?;
        check_delimiter(self.report.delimiter)?;
        Ok(())
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(format) = args.format {
            self.report.format = format;
        }

        if args.header {
            self.report.include_header = true;
        } else if args.no_header {
            self.report.include_header = false;
        }

        if args.most_complaints {
            self.report.most_complaints = true;
        }

        if let Some(delimiter) = args.delimiter {
            self.input.delimiter = delimiter;
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
