//! vehicle-db main entry point
//!
//! This is the command-line interface for populating and inspecting the
//! local vehicle database, plus the diagnostic probes.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use vehicle_db::config::{load_config_or_default, validate, Config};
use vehicle_db::crawler::{populate, SilentProgress, StderrProgress};
use vehicle_db::output::{load_statistics, print_statistics};
use vehicle_db::probe::{
    probe_interval_types, run_compliance, Category, EndpointTester, ProbeClient,
};
use vehicle_db::storage::SqliteStorage;

/// vehicle-db: a local mirror of the vehicle year/make/model/engine hierarchy
///
/// `populate` crawls the upstream proxy into SQLite and resumes per year
/// across runs. The remaining subcommands inspect the database or probe the
/// remote API.
#[derive(Parser, Debug)]
#[command(name = "vehicle-db")]
#[command(version)]
#[command(about = "Populate and probe a local vehicle database", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(short, long, global = true, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl years, makes, models and engines into the database
    Populate {
        /// Database file (overrides the config)
        #[arg(long, value_name = "FILE")]
        database: Option<PathBuf>,

        /// Maximum number of in-flight requests (overrides the config)
        #[arg(long, value_name = "N")]
        max_concurrent_requests: Option<u32>,
    },

    /// Show populate progress and row counts from the database
    Stats {
        /// Database file (overrides the config)
        #[arg(long, value_name = "FILE")]
        database: Option<PathBuf>,
    },

    /// Find which maintenance interval type the API accepts
    Intervals {
        /// Vehicle to probe (defaults to the configured fallback vehicle)
        #[arg(long)]
        vehicle_id: Option<String>,
    },

    /// Check that content endpoints return their expected list property
    Verify,

    /// Sweep the documented endpoints and save a JSON report
    Endpoints {
        /// Run only the startup and vehicle categories
        #[arg(long, conflicts_with = "category")]
        quick: bool,

        /// Run a single category (startup, vehicles, search, chek-chart, content, common, commercial)
        #[arg(long)]
        category: Option<Category>,

        /// Base URL for the API (overrides the config)
        #[arg(long, conflicts_with = "direct")]
        base_url: Option<String>,

        /// Use the direct MOTOR URL instead of the proxy
        #[arg(long)]
        direct: bool,

        /// Directory for the results file
        #[arg(long, default_value = ".")]
        results_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_config_or_default(cli.config.as_deref())
        .context("Failed to load configuration")?;

    if let Command::Populate {
        database,
        max_concurrent_requests,
    } = &cli.command
    {
        if let Some(database) = database {
            config.output.database_path = database.display().to_string();
        }
        if let Some(ceiling) = max_concurrent_requests {
            config.crawler.max_concurrent_requests = *ceiling;
        }
    }
    if let Command::Stats {
        database: Some(database),
    } = &cli.command
    {
        config.output.database_path = database.display().to_string();
    }

    let log_file = match cli.command {
        Command::Populate { .. } => Some(open_log_file(Path::new(&config.output.log_path))?),
        _ => None,
    };
    setup_logging(cli.verbose, cli.quiet, log_file);

    validate(&config).context("Invalid configuration")?;

    match cli.command {
        Command::Populate { .. } => handle_populate(&config, cli.quiet).await,
        Command::Stats { .. } => handle_stats(&config),
        Command::Intervals { vehicle_id } => handle_intervals(&config, vehicle_id).await,
        Command::Verify => handle_verify(&config).await,
        Command::Endpoints {
            quick,
            category,
            base_url,
            direct,
            results_dir,
        } => handle_endpoints(&config, quick, category, base_url, direct, &results_dir).await,
    }
}

fn open_log_file(path: &Path) -> anyhow::Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))
}

/// Filter for the `populate` log file, independent of `-v`/`-q`
const LOG_FILE_FILTER: &str = "vehicle_db=info,warn";

/// Maps the verbosity flags to the stderr filter
fn stderr_filter(verbose: u8, quiet: bool) -> EnvFilter {
    if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("vehicle_db=info,warn"),
            1 => EnvFilter::new("vehicle_db=debug,info"),
            2 => EnvFilter::new("vehicle_db=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Everything goes to stderr; `populate` also appends plain-text lines to
/// its log file. The file always records info and above.
fn setup_logging(verbose: u8, quiet: bool, log_file: Option<File>) {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_filter(stderr_filter(verbose, quiet));

    let file_layer = log_file.map(|file| {
        fmt::layer()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_target(false)
            .with_filter(EnvFilter::new(LOG_FILE_FILTER))
    });

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();
}

/// Handles `populate`: crawls and prints the run totals
async fn handle_populate(config: &Config, quiet: bool) -> anyhow::Result<()> {
    let report = if quiet {
        populate(config, &SilentProgress).await
    } else {
        populate(config, &StderrProgress).await
    };

    let report = match report {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Populate failed: {}", e);
            return Err(e.into());
        }
    };

    tracing::info!(
        "Run finished: {} of {} years completed ({} already done, {} pending), {} makes, {} models, {} engines, {} failed requests",
        report.years_completed,
        report.years_total,
        report.years_already_completed,
        report.years_pending,
        report.makes,
        report.models,
        report.engines,
        report.fetch_failures
    );

    if report.years_pending > 0 {
        tracing::warn!(
            "{} years left pending; run populate again to retry them",
            report.years_pending
        );
    }

    Ok(())
}

/// Handles `stats`: shows statistics from an existing database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let path = Path::new(&config.output.database_path);
    if !path.exists() {
        anyhow::bail!("Database {} does not exist", path.display());
    }

    println!("Database: {}\n", config.output.database_path);

    let storage = SqliteStorage::open_existing(path)
        .with_context(|| format!("Failed to open database {}", path.display()))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles `intervals`: probes interval types for one vehicle
async fn handle_intervals(config: &Config, vehicle_id: Option<String>) -> anyhow::Result<()> {
    let probe = ProbeClient::new(&config.probe)?;
    let vehicle_id = vehicle_id.unwrap_or_else(|| config.probe.fallback_vehicle_id.clone());

    let attempts = probe_interval_types(&probe, &vehicle_id).await;
    let accepted: Vec<&str> = attempts
        .iter()
        .filter(|a| a.accepted)
        .map(|a| a.interval_type)
        .collect();
    tracing::debug!("Accepted interval types: {:?}", accepted);

    Ok(())
}

/// Handles `verify`: runs the content-endpoint compliance checks
async fn handle_verify(config: &Config) -> anyhow::Result<()> {
    let probe = ProbeClient::new(&config.probe)?;

    match run_compliance(&probe, &config.probe.fallback_vehicle_id).await {
        Ok(report) => {
            tracing::debug!(
                "Compliance for vehicle {}: {}/{}",
                report.vehicle_id,
                report.passed(),
                report.total()
            );
            Ok(())
        }
        Err(e) => {
            println!("Could not get vehicle ID, aborting.");
            Err(e.into())
        }
    }
}

/// Handles `endpoints`: runs the endpoint sweep and saves the report
async fn handle_endpoints(
    config: &Config,
    quick: bool,
    category: Option<Category>,
    base_url: Option<String>,
    direct: bool,
    results_dir: &Path,
) -> anyhow::Result<()> {
    let base_url = if direct {
        config.probe.direct_url.clone()
    } else {
        base_url.unwrap_or_else(|| config.probe.base_url.clone())
    };

    let probe = ProbeClient::with_base_url(&config.probe, &base_url)?;
    let mut tester = EndpointTester::new(probe);

    match (quick, category) {
        (true, _) => tester.run_quick().await,
        (false, Some(category)) => tester.run_category(category).await,
        (false, None) => tester.run_all().await,
    }

    tester
        .save_results(results_dir)
        .with_context(|| format!("Failed to save results in {}", results_dir.display()))?;

    Ok(())
}
