//! ETL - command line entry point for the ingest jobs

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use etl_common::logging::{init_logging, LogConfig, LogLevel};
use etl_ingest::db::QueryRun;
use etl_ingest::{banks, gdp, pipeline, staff, BanksConfig, GdpConfig, PipelineConfig, StaffConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "etl")]
#[command(author, version, about = "Course ETL jobs")]
struct Cli {
    #[command(subcommand)]
    job: Job,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Environment file loaded before reading ETL_* variables
    #[arg(long, global = true, env = "ETL_ENV_FILE")]
    env_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Job {
    /// Convert person records from CSV, JSON and XML files to metric units
    Pipeline {
        /// Directory scanned for source files
        #[arg(short, long)]
        source_dir: Option<PathBuf>,

        /// Output CSV file
        #[arg(short, long)]
        target: Option<PathBuf>,

        /// Progress log file
        #[arg(short, long)]
        log_file: Option<PathBuf>,

        /// Also load the result into this SQLite database
        #[arg(long)]
        database: Option<PathBuf>,

        /// Table name used with --database
        #[arg(long)]
        table: Option<String>,
    },

    /// Scrape the largest banks and convert their market caps
    Banks {
        #[arg(long)]
        url: Option<String>,

        /// Exchange rate CSV, as a URL or a local path
        #[arg(long)]
        exchange_rates: Option<String>,

        #[arg(long)]
        csv: Option<PathBuf>,

        #[arg(long)]
        db: Option<PathBuf>,

        #[arg(long)]
        log_file: Option<PathBuf>,

        /// Number of banks to keep
        #[arg(long)]
        top: Option<usize>,

        /// HTTP timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Scrape countries by GDP
    Gdp {
        #[arg(long)]
        url: Option<String>,

        #[arg(long)]
        csv: Option<PathBuf>,

        #[arg(long)]
        db: Option<PathBuf>,

        #[arg(long)]
        log_file: Option<PathBuf>,

        /// Reporting threshold in billions of USD
        #[arg(long)]
        min_gdp: Option<f64>,

        /// HTTP timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Load the instructor table into SQLite
    Staff {
        #[arg(long)]
        csv: Option<PathBuf>,

        #[arg(long)]
        db: Option<PathBuf>,

        #[arg(long)]
        log_file: Option<PathBuf>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match &cli.env_file {
        Some(path) => {
            if let Err(e) = dotenvy::from_path(path) {
                eprintln!("Failed to load {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => {
            dotenvy::dotenv().ok();
        },
    }

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    // Environment variables take precedence over the flag
    let log_config = match LogConfig::builder()
        .level(log_level)
        .log_file_prefix("etl")
        .build()
        .with_env_overrides()
    {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid logging configuration: {:#}", e);
            return ExitCode::FAILURE;
        },
    };

    let _guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {:#}", e);
            return ExitCode::FAILURE;
        },
    };

    match run(cli.job).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Job failed: {:#}", e);
            ExitCode::FAILURE
        },
    }
}

async fn run(job: Job) -> Result<()> {
    match job {
        Job::Pipeline {
            source_dir,
            target,
            log_file,
            database,
            table,
        } => {
            let mut config = PipelineConfig::from_env()?;
            if let Some(dir) = source_dir {
                config.source_dir = dir;
            }
            if let Some(target) = target {
                config.target_file = target;
            }
            if let Some(log) = log_file {
                config.log_file = log;
            }
            if database.is_some() {
                config.database = database;
            }
            if let Some(table) = table {
                config.table_name = table;
            }

            let report = pipeline::run(&config).context("Pipeline failed")?;
            info!(
                rows = report.rows_loaded,
                target = %report.target_file.display(),
                "Pipeline complete"
            );
        },
        Job::Banks {
            url,
            exchange_rates,
            csv,
            db,
            log_file,
            top,
            timeout,
        } => {
            let mut config = BanksConfig::from_env()?;
            if let Some(url) = url {
                config.url = url;
            }
            if let Some(rates) = exchange_rates {
                config.exchange_rates = rates;
            }
            if let Some(csv) = csv {
                config.csv_path = csv;
            }
            if let Some(db) = db {
                config.db_path = db;
            }
            if let Some(log) = log_file {
                config.log_file = log;
            }
            if let Some(top) = top {
                config.top_n = top;
            }
            if let Some(secs) = timeout {
                config.http_timeout = Duration::from_secs(secs);
            }

            let report = banks::run(&config).await.context("Banks job failed")?;
            print_queries(&report.queries);
            info!(banks = report.banks.len(), "Banks job complete");
        },
        Job::Gdp {
            url,
            csv,
            db,
            log_file,
            min_gdp,
            timeout,
        } => {
            let mut config = GdpConfig::from_env()?;
            if let Some(url) = url {
                config.url = url;
            }
            if let Some(csv) = csv {
                config.csv_path = csv;
            }
            if let Some(db) = db {
                config.db_path = db;
            }
            if let Some(log) = log_file {
                config.log_file = log;
            }
            if let Some(min) = min_gdp {
                config.min_gdp_billions = min;
            }
            if let Some(secs) = timeout {
                config.http_timeout = Duration::from_secs(secs);
            }

            let report = gdp::run(&config).await.context("GDP job failed")?;
            print_queries(std::slice::from_ref(&report.query));
            info!(countries = report.countries.len(), "GDP job complete");
        },
        Job::Staff { csv, db, log_file } => {
            let mut config = StaffConfig::from_env()?;
            if let Some(csv) = csv {
                config.csv_path = csv;
            }
            if let Some(db) = db {
                config.db_path = db;
            }
            if let Some(log) = log_file {
                config.log_file = log;
            }

            let report = staff::run(&config).context("Staff job failed")?;
            print_queries(&report.queries);
            info!(
                before = report.count_before_append,
                after = report.count_after_append,
                "Staff job complete"
            );
        },
    }

    Ok(())
}

fn print_queries(queries: &[QueryRun]) {
    for query in queries {
        println!("{}\n", query);
    }
}
