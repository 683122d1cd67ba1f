//! Format readers
//!
//! Each reader turns one source file into a [`RecordTable`] with the fixed
//! `name, height, weight` column set, so tables from different formats can
//! be concatenated without checks.
//!
//! | Format | Extension | Reader |
//! |--------|-----------|--------|
//! | Delimited text | `.csv` | [`CsvReader`] |
//! | Line-delimited JSON | `.json` | [`JsonLinesReader`] |
//! | Hierarchical markup | `.xml` | [`XmlReader`] |

mod csv_reader;
mod jsonl_reader;
mod xml_reader;

pub use csv_reader::CsvReader;
pub use jsonl_reader::JsonLinesReader;
pub use xml_reader::XmlReader;

use crate::record::RecordTable;
use etl_common::{EtlError, Result};
use std::path::Path;

/// Source file formats understood by the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    Csv,
    Json,
    Xml,
}

impl SourceFormat {
    /// Scan order used by the dispatcher
    pub const ALL: [SourceFormat; 3] = [SourceFormat::Csv, SourceFormat::Json, SourceFormat::Xml];

    /// File extension without the dot
    pub fn extension(self) -> &'static str {
        match self {
            SourceFormat::Csv => "csv",
            SourceFormat::Json => "json",
            SourceFormat::Xml => "xml",
        }
    }

    /// Format for `path`, matched exactly on its extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        Self::ALL.into_iter().find(|f| f.extension() == ext)
    }
}

impl std::fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Reads one source file into a table
pub trait SourceReader {
    fn format(&self) -> SourceFormat;

    /// Parse the file at `path`
    ///
    /// Content problems are [`EtlError::Format`]; open and read failures are
    /// [`EtlError::Io`].
    fn read(&self, path: &Path) -> Result<RecordTable>;
}

/// Reader for `format`
pub fn reader_for(format: SourceFormat) -> &'static dyn SourceReader {
    match format {
        SourceFormat::Csv => &CsvReader,
        SourceFormat::Json => &JsonLinesReader,
        SourceFormat::Xml => &XmlReader,
    }
}

/// Read `path` with the reader matching its extension
pub fn read_file(path: &Path) -> Result<RecordTable> {
    let format = SourceFormat::from_path(path).ok_or_else(|| {
        EtlError::config(format!("Unsupported source file type: {}", path.display()))
    })?;
    reader_for(format).read(path)
}

/// Map a `csv` crate error onto the I/O versus format split
pub(crate) fn csv_error(path: &Path, err: csv::Error) -> EtlError {
    let line = err.position().map(|p| p.line());
    let message = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(source) => EtlError::io(path, source),
        _ => EtlError::format(path, line, message),
    }
}

pub(crate) fn parse_number(path: &Path, line: Option<u64>, field: &str, raw: &str) -> Result<f64> {
    raw.trim().parse::<f64>().map_err(|e| {
        EtlError::format(path, line, format!("invalid {} value '{}': {}", field, raw, e))
    })
}
