//! Append-only progress log
//!
//! Every job records its lifecycle in a plain text file, one line per event:
//!
//! ```text
//! 2024-Mar-05-14:07:09,Extract phase Started
//! ```
//!
//! The separator between timestamp and message is chosen per job. The file is
//! only ever appended to; nothing here truncates or rotates it. Each line is
//! also emitted as a `tracing` event so the console shows the same progress.

use crate::error::{EtlError, Result};
use chrono::{Local, NaiveDateTime};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// chrono pattern for `YYYY-Mon-DD-HH:MM:SS`
pub const TIMESTAMP_FORMAT: &str = "%Y-%b-%d-%H:%M:%S";

/// Separator between timestamp and message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Separator {
    /// `<timestamp>,<message>`
    #[default]
    Comma,
    /// `<timestamp> : <message>`
    Colon,
}

impl Separator {
    pub fn as_str(self) -> &'static str {
        match self {
            Separator::Comma => ",",
            Separator::Colon => " : ",
        }
    }
}

/// Format a timestamp the way the progress log writes it
pub fn format_timestamp(at: NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Writer for a job's progress log file
#[derive(Debug, Clone)]
pub struct ProgressLog {
    path: PathBuf,
    separator: Separator,
}

impl ProgressLog {
    pub fn new(path: impl Into<PathBuf>, separator: Separator) -> Self {
        Self {
            path: path.into(),
            separator,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn separator(&self) -> Separator {
        self.separator
    }

    /// Append `message` stamped with the current local time
    pub fn log(&self, message: &str) -> Result<()> {
        self.log_at(Local::now().naive_local(), message)
    }

    /// Append `message` stamped with `at`
    pub fn log_at(&self, at: NaiveDateTime, message: &str) -> Result<()> {
        let line = self.render(at, message);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| EtlError::io(parent, e))?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| EtlError::io(&self.path, e))?;

        writeln!(file, "{}", line).map_err(|e| EtlError::io(&self.path, e))?;

        info!(log_file = %self.path.display(), "{}", message);
        Ok(())
    }

    /// Render a line without writing it
    pub fn render(&self, at: NaiveDateTime, message: &str) -> String {
        format!("{}{}{}", format_timestamp(at), self.separator.as_str(), message)
    }
}
