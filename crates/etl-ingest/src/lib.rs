//! ETL Ingest Library
//!
//! Extract-transform-load jobs over local files and scraped web pages.
//!
//! # Jobs
//!
//! - **pipeline**: reads person records from CSV, JSON Lines and XML files,
//!   converts them to metric units and writes a CSV (optionally SQLite too)
//! - **banks**: largest banks by market cap, converted to GBP, EUR and INR
//! - **gdp**: countries by nominal GDP in billions of USD
//! - **staff**: loads the instructor table into SQLite and appends a record
//!
//! # Example
//!
//! ```no_run
//! use etl_ingest::{pipeline, PipelineConfig};
//!
//! fn main() -> etl_common::Result<()> {
//!     let report = pipeline::run(&PipelineConfig::in_dir("./data"))?;
//!     println!("{} rows loaded", report.rows_loaded);
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod banks;
pub mod config;
pub mod db;
pub mod extract;
pub mod gdp;
pub mod html;
pub mod http;
pub mod load;
pub mod pipeline;
pub mod readers;
pub mod record;
pub mod staff;
pub mod transform;

pub use config::{BanksConfig, GdpConfig, PipelineConfig, StaffConfig};
pub use record::{PersonRecord, RecordTable};
