//! Extraction dispatcher
//!
//! Scans the source directory for `*.csv`, `*.json` and `*.xml` files, reads
//! each with its format reader and concatenates the results. The pipeline's
//! own output file is never read, even when it sits in the source directory,
//! so rerunning the pipeline does not feed old output back in.

use crate::config::PipelineConfig;
use crate::readers::{reader_for, SourceFormat};
use crate::record::RecordTable;
use etl_common::{EtlError, Result};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Extract every source file under `config.source_dir`, skipping `config.target_file`
pub fn extract(config: &PipelineConfig) -> Result<RecordTable> {
    extract_dir(&config.source_dir, Some(&config.target_file))
}

/// Extract every source file directly inside `dir`
///
/// Formats are read in the order CSV, JSON, XML; files of one format are read
/// in file-name order. Rows keep reader order. The first file that fails to
/// read aborts the extraction.
pub fn extract_dir(dir: &Path, exclude: Option<&Path>) -> Result<RecordTable> {
    let metadata = std::fs::metadata(dir).map_err(|e| EtlError::io(dir, e))?;
    if !metadata.is_dir() {
        return Err(EtlError::io(
            dir,
            io::Error::new(io::ErrorKind::InvalidInput, "source path is not a directory"),
        ));
    }

    let excluded = exclude.map(canonical);
    let sources = list_sources(dir)?;
    let mut table = RecordTable::new();

    for format in SourceFormat::ALL {
        for path in sources.iter().filter(|(f, _)| *f == format).map(|(_, p)| p) {
            if excluded.as_deref() == Some(canonical(path).as_path()) {
                info!(path = %path.display(), "Skipping pipeline output file");
                continue;
            }

            let rows = reader_for(format).read(path)?;
            debug!(path = %path.display(), format = %format, rows = rows.len(), "Read source file");
            table.append(rows);
        }
    }

    info!(dir = %dir.display(), rows = table.len(), "Extraction finished");
    Ok(table)
}

/// Source files directly inside `dir`, sorted by file name
fn list_sources(dir: &Path) -> Result<Vec<(SourceFormat, PathBuf)>> {
    let mut sources = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| walk_error(dir, e))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(format) = SourceFormat::from_path(entry.path()) {
            sources.push((format, entry.into_path()));
        }
    }

    Ok(sources)
}

fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn walk_error(dir: &Path, err: walkdir::Error) -> EtlError {
    let path = err.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf());
    let message = err.to_string();
    let source = err
        .into_io_error()
        .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, message));
    EtlError::io(path, source)
}
