//! ETL Common Library
//!
//! Shared error handling, logging and progress tracking for the ETL jobs.
//!
//! # Overview
//!
//! This crate provides common functionality used by every job in the workspace:
//!
//! - **Error Handling**: [`EtlError`] and the [`Result`] alias
//! - **Logging**: `tracing` subscriber setup
//! - **Progress Log**: the timestamped, append-only job log file
//! - **Numeric**: the shared decimal rounding policy
//!
//! # Example
//!
//! ```no_run
//! use etl_common::progress::{ProgressLog, Separator};
//! use etl_common::Result;
//!
//! fn run() -> Result<()> {
//!     let log = ProgressLog::new("log_file.txt", Separator::Comma);
//!     log.log("ETL Job Started")?;
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod error;
pub mod logging;
pub mod numeric;
pub mod progress;

// Re-export commonly used types
pub use error::{EtlError, Result};
