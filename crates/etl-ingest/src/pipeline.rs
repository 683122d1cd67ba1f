//! Person pipeline runner
//!
//! Runs extract, transform and load once, in that order, and records every
//! phase boundary in the progress log:
//!
//! ```text
//! 2024-Mar-05-14:07:09,ETL Job Started
//! 2024-Mar-05-14:07:09,Extract phase Started
//! 2024-Mar-05-14:07:09,Extract phase Ended
//! ...
//! 2024-Mar-05-14:07:09,ETL Job Ended
//! ```
//!
//! A failing phase writes `<Phase> phase Failed: <error>` and the run stops
//! there.

use crate::config::PipelineConfig;
use crate::db::{Database, IfExists};
use crate::extract::extract;
use crate::load::{load_to_csv, load_to_db};
use crate::record::RecordTable;
use crate::transform::transform;
use etl_common::progress::{ProgressLog, Separator};
use etl_common::Result;
use std::fmt;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};

pub const JOB_STARTED: &str = "ETL Job Started";
pub const JOB_ENDED: &str = "ETL Job Ended";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Extract,
    Transform,
    Load,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Extract => "Extract",
            Phase::Transform => "Transform",
            Phase::Load => "Load",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    pub rows_extracted: usize,
    pub rows_loaded: usize,
    pub target_file: PathBuf,
    pub database: Option<PathBuf>,
}

/// Run the pipeline once
pub fn run(config: &PipelineConfig) -> Result<PipelineReport> {
    let log = ProgressLog::new(&config.log_file, Separator::Comma);
    info!(source_dir = %config.source_dir.display(), target = %config.target_file.display(), "Starting pipeline");

    log.log(JOB_STARTED)?;

    let extracted = run_phase(&log, Phase::Extract, || extract(config))?;
    let rows_extracted = extracted.len();

    let transformed = run_phase(&log, Phase::Transform, move || Ok(transform(extracted)))?;

    let rows_loaded = run_phase(&log, Phase::Load, || load(config, &transformed))?;

    log.log(JOB_ENDED)?;

    Ok(PipelineReport {
        rows_extracted,
        rows_loaded,
        target_file: config.target_file.clone(),
        database: config.database.clone(),
    })
}

fn load(config: &PipelineConfig, table: &RecordTable) -> Result<usize> {
    load_to_csv(&config.target_file, table)?;

    if let Some(path) = &config.database {
        let mut db = Database::open(path)?;
        load_to_db(&mut db, &config.table_name, table.rows(), IfExists::Replace)?;
    }

    Ok(table.len())
}

/// Run one phase between its Started and Ended lines
fn run_phase<T>(log: &ProgressLog, phase: Phase, body: impl FnOnce() -> Result<T>) -> Result<T> {
    log.log(&format!("{} phase Started", phase))?;
    let started = Instant::now();

    match body() {
        Ok(value) => {
            debug!(phase = %phase, elapsed_ms = started.elapsed().as_millis() as u64, "Phase finished");
            log.log(&format!("{} phase Ended", phase))?;
            Ok(value)
        },
        Err(err) => {
            // The phase error wins over a failure to record it
            if let Err(log_err) = log.log(&format!("{} phase Failed: {}", phase, err)) {
                warn!(phase = %phase, error = %log_err, "Could not record phase failure");
            }
            Err(err)
        },
    }
}
