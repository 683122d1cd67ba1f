//! CSV and SQLite loaders
//!
//! Output is written to a temporary file next to the target and renamed over
//! it once complete, so an interrupted run leaves the previous file intact
//! instead of a truncated one.

use crate::db::{Database, IfExists, TableRow};
use crate::readers::csv_error;
use crate::record::{PersonRecord, RecordTable};
use csv::WriterBuilder;
use etl_common::{EtlError, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

/// Write the person table to `path` with a `name,height,weight` header
pub fn load_to_csv(path: &Path, table: &RecordTable) -> Result<()> {
    write_csv(path, &PersonRecord::COLUMNS, table.rows())
}

/// Write `rows` to `path` with their table column names as the header
pub fn write_rows_csv<T: TableRow + Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let headers: Vec<&str> = T::columns().iter().map(|c| c.name).collect();
    write_csv(path, &headers, rows)
}

/// Write `headers` and then one line per row to `path`, replacing any existing file
///
/// Rows are serialized positionally, so their field order must match `headers`.
pub fn write_csv<T: Serialize>(path: &Path, headers: &[&str], rows: &[T]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(|e| EtlError::io(&dir, e))?;

    let staging = NamedTempFile::new_in(&dir).map_err(|e| EtlError::io(&dir, e))?;
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(staging);

    writer.write_record(headers).map_err(|e| csv_error(path, e))?;
    for row in rows {
        writer.serialize(row).map_err(|e| csv_error(path, e))?;
    }

    let staging = writer
        .into_inner()
        .map_err(|e| EtlError::io(path, e.into_error()))?;
    staging
        .as_file()
        .sync_all()
        .map_err(|e| EtlError::io(staging.path(), e))?;
    staging
        .persist(path)
        .map_err(|e| EtlError::io(path, e.error))?;

    info!(path = %path.display(), rows = rows.len(), "CSV written");
    Ok(())
}

/// Store `rows` in `table` of an open database
pub fn load_to_db<T: TableRow>(db: &mut Database, table: &str, rows: &[T], if_exists: IfExists) -> Result<usize> {
    let written = db.write_rows(table, rows, if_exists)?;
    if let Some(path) = db.path() {
        info!(db = %path.display(), table, rows = written, "Table loaded");
    }
    Ok(written)
}
