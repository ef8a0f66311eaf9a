//! complaint-report - consumer complaint statistics by product and year
//!
//! A CLI tool that reads a consumer complaint CSV export and writes a
//! report with, for every (product, year) pair, the number of complaints,
//! the number of companies that received them, and the highest share of
//! complaints filed against a single company.
//!
//! Exit codes:
//!   0 - Success (report written, or dry run passed)
//!   1 - Runtime error (unreadable input, unwritable output, bad config, etc.)
//!   2 - Input data rejected (missing columns, invalid product/company/year)

mod analysis;
mod cli;
mod config;
mod errors;
mod models;
mod report;

use analysis::InputOptions;
use anyhow::{Context, Result};
use cli::Args;
use config::{Config, CONFIG_FILE_NAME};
use errors::ComplaintError;
use indicatif::{ProgressBar, ProgressStyle};
use models::AggregateResult;
use report::ReportOptions;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        if let Err(e) = handle_init_config() {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
        return;
    }

    // Configuration decides the log level, so it is loaded first
    let (config, source) = match configure(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(args.log_level(config.general.verbose));

    info!("complaint-report v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    log_config_source(&source);

    match run(&args, config) {
        Ok(()) => {}
        Err(e) => {
            error!("Report failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(exit_code(&e));
        }
    }
}

/// Exit code for a failed run: 2 when the input data was rejected, 1 otherwise.
fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<ComplaintError>() {
        Some(e) if e.is_data_error() => 2,
        _ => 1,
    }
}

/// Handle --init-config: generate a default .complaint-report.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        anyhow::bail!(
            "{} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the complete report workflow with an already merged configuration.
fn run(args: &Args, config: Config) -> Result<()> {
    let start_time = Instant::now();

    // Validated by Args::validate unless --init-config, which never gets here.
    let input = args.input.as_deref().context("An input file is required")?;

    // Step 1: read and aggregate
    let input_options = InputOptions::from(&config.input);
    let result = load_and_aggregate(input, &input_options, args.quiet)?;

    // Handle --dry-run: summarize and exit
    if args.dry_run {
        print_dry_run(&result, &ReportOptions::from(&config.report));
        return Ok(());
    }

    // Step 2: render and write
    let output = args.output.as_deref().context("An output file is required")?;
    let report_options = ReportOptions::from(&config.report);
    info!("Writing {:?} report to: {}", config.report.format, output.display());

    let rows = report::write_report(
        output,
        config.report.format,
        &input.display().to_string(),
        &result,
        &report_options,
    )
    .with_context(|| format!("Failed to write report to {}", output.display()))?;

    if !args.quiet {
        println!("\n📊 Report Summary:");
        println!("   Complaints: {}", result.total_records());
        println!("   Product/year groups: {}", rows);
        println!("   Duration: {:.1}s", start_time.elapsed().as_secs_f64());
        println!("\n✅ Report saved to: {}", output.display());
    }

    Ok(())
}

/// Open the input file and aggregate it, with a spinner unless quiet.
fn load_and_aggregate(
    input: &Path,
    options: &InputOptions,
    quiet: bool,
) -> Result<AggregateResult> {
    info!("Reading complaints from: {}", input.display());

    let spinner = if quiet {
        None
    } else {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(format!("Aggregating {}", input.display()));
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    };

    let aggregated = File::open(input)
        .with_context(|| format!("Failed to open input file: {}", input.display()))
        .and_then(|file| {
            analysis::aggregate_csv(BufReader::new(file), options).map_err(anyhow::Error::from)
        });

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let result = aggregated?;
    info!(
        "Counted {} complaints in {} groups",
        result.total_records(),
        result.len()
    );
    Ok(result)
}

/// Print what would be written, without touching the output path.
fn print_dry_run(result: &AggregateResult, options: &ReportOptions) {
    println!("\n🔍 Dry run: input is valid.\n");

    if result.is_empty() {
        println!("   No complaint records found.");
    } else {
        for row in report::render(result, options) {
            println!(
                "   {} {}: {} complaints, {} companies, {}% max",
                row.product, row.year, row.num_complaint, row.num_company, row.highest_percent
            );
        }
        println!(
            "\n   Total: {} complaints in {} groups",
            result.total_records(),
            result.len()
        );
    }

    println!("\n✅ Dry run complete. No report was written.");
}

/// Where the effective configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ConfigSource {
    /// Loaded from this file.
    File(PathBuf),
    /// No config file found.
    BuiltIn,
    /// The default config file exists but could not be used.
    DefaultRejected(String),
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is set up; the outcome is reported afterwards
/// through [`log_config_source`].
fn load_config(args: &Args) -> Result<(Config, ConfigSource)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, ConfigSource::File(config_path.clone())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, ConfigSource::File(PathBuf::from(CONFIG_FILE_NAME)))),
        Ok(None) => Ok((Config::default(), ConfigSource::BuiltIn)),
        Err(e) => Ok((
            Config::default(),
            ConfigSource::DefaultRejected(format!("{:#}", e)),
        )),
    }
}

/// Load the configuration, apply CLI overrides, and check the result.
fn configure(args: &Args) -> Result<(Config, ConfigSource)> {
    let (mut config, source) = load_config(args)?;
    config.merge_with_args(args);
    config.validate().map_err(anyhow::Error::msg)?;
    Ok((config, source))
}

fn log_config_source(source: &ConfigSource) {
    match source {
        ConfigSource::File(path) => info!("Loaded config from: {}", path.display()),
        ConfigSource::BuiltIn => debug!("No config file found, using defaults"),
        ConfigSource::DefaultRejected(e) => warn!("Failed to load config: {}", e),
    }
}
