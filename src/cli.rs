//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::config::check_delimiter;
use crate::report::OutputFormat;
use clap::Parser;
use std::path::PathBuf;

/// complaint-report - consumer complaint statistics by product and year
///
/// Reads a consumer complaint CSV (with `Product`, `Date received` and
/// `Company` columns) and writes, for every product and year, the number
/// of complaints, the number of companies involved, and the highest
/// share of complaints against a single company.
///
/// Examples:
///   complaint-report input/complaints.csv output/report.csv
///   complaint-report complaints.csv report.json --format json
///   complaint-report complaints.csv report.csv --most-complaints --no-header
///   complaint-report complaints.csv --dry-run
///   complaint-report --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Complaint CSV file to read
    #[arg(value_name = "INPUT", required_unless_present = "init_config")]
    pub input: Option<PathBuf>,

    /// Report file to write
    #[arg(value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .complaint-report.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format (csv, json)
    #[arg(long, value_name = "FORMAT", env = "COMPLAINT_REPORT_FORMAT")]
    pub format: Option<OutputFormat>,

    /// Write a header row
    #[arg(long, conflicts_with = "no_header")]
    pub header: bool,

    /// Omit the header row
    #[arg(long, conflicts_with = "header")]
    pub no_header: bool,

    /// Add a `most_complaints` column naming the company with the most complaints
    #[arg(long)]
    pub most_complaints: bool,

    /// Field delimiter of the input CSV
    #[arg(long, value_name = "CHAR")]
    pub delimiter: Option<char>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Dry run: validate and aggregate the input without writing a report
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .complaint-report.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        let input = self
            .input
            .as_ref()
            .ok_or_else(|| "An input file is required".to_string())?;
        if !input.exists() {
            return Err(format!("Input file does not exist: {}", input.display()));
        }
        if input.is_dir() {
            return Err(format!("Input path is a directory: {}", input.display()));
        }

        if !self.dry_run && self.output.is_none() {
            return Err("An output file is required unless --dry-run is set".to_string());
        }

        if let Some(delimiter) = self.delimiter {
            check_delimiter(delimiter)?;
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `verbose_by_default` comes from the config file; `--quiet` still wins.
    pub fn log_level(&self, verbose_by_default: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || verbose_by_default {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
