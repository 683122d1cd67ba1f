//! Delimited-text reader

use super::{csv_error, SourceFormat, SourceReader};
use crate::record::{PersonRecord, RecordTable};
use csv::{ReaderBuilder, StringRecord, Trim};
use etl_common::{EtlError, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Reads `name,height,weight` rows, with or without a header line
///
/// The first row counts as a header when it names all three fixed columns
/// (case-insensitive). Extra header columns, such as an index column, are
/// ignored. Without a header, every row is read in the fixed column order.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvReader;

impl CsvReader {
    /// Parse CSV content from any reader; `path` is only used in errors
    pub fn read_from<R: Read>(&self, path: &Path, input: R) -> Result<RecordTable> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .trim(Trim::All)
            .from_reader(input);

        let mut headers = StringRecord::from(PersonRecord::COLUMNS.to_vec());
        let mut rows = Vec::new();

        for (index, result) in reader.records().enumerate() {
            let record = result.map_err(|e| csv_error(path, e))?;

            if index == 0 {
                if let Some(found) = detect_header(&record) {
                    debug!(path = %path.display(), "CSV header detected");
                    headers = found;
                    continue;
                }
            }

            let line = record.position().map(|p| p.line());
            let person: PersonRecord = record
                .deserialize(Some(&headers))
                .map_err(|e| EtlError::format(path, line, e.to_string()))?;
            rows.push(person);
        }

        Ok(RecordTable::from(rows))
    }
}

impl SourceReader for CsvReader {
    fn format(&self) -> SourceFormat {
        SourceFormat::Csv
    }

    fn read(&self, path: &Path) -> Result<RecordTable> {
        let file = File::open(path).map_err(|e| EtlError::io(path, e))?;
        self.read_from(path, file)
    }
}

/// Normalized header when `record` names every fixed column
fn detect_header(record: &StringRecord) -> Option<StringRecord> {
    let normalized: Vec<String> = record.iter().map(|cell| cell.trim().to_lowercase()).collect();
    let complete = PersonRecord::COLUMNS
        .iter()
        .all(|column| normalized.iter().any(|cell| cell == column));

    complete.then(|| StringRecord::from(normalized))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn read(content: &str) -> Result<RecordTable> {
        CsvReader.read_from(Path::new("source.csv"), content.as_bytes())
    }

    #[test]
    fn test_read_with_header() {
        let table = read("name,height,weight\nalex,65.78,112.99\najay,71.52,136.49\n").unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0], PersonRecord::new("alex", 65.78, 112.99));
        assert_eq!(table.rows()[1], PersonRecord::new("ajay", 71.52, 136.49));
    }

    #[test]
    fn test_read_without_header_uses_fixed_columns() {
        let table = read("alice,69.21,153.03\nbeth,67.79,127.45").unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[1], PersonRecord::new("beth", 67.79, 127.45));
    }

    #[test]
    fn test_header_order_and_extra_columns() {
        let content = " ,Weight,NAME,height\n0,150,Ayush,70\n1,130,Diana,65\n";
        let table = read(content).unwrap();

        assert_eq!(
            table.into_rows(),
            vec![
                PersonRecord::new("Ayush", 70.0, 150.0),
                PersonRecord::new("Diana", 65.0, 130.0),
            ]
        );
    }

    #[test]
    fn test_header_only_file_is_empty() {
        assert!(read("name,height,weight\n").unwrap().is_empty());
        assert!(read("").unwrap().is_empty());
    }

    #[test]
    fn test_bad_number_is_format_error_with_line() {
        let err = read("name,height,weight\nalex,tall,112.99\n").unwrap_err();

        match err {
            EtlError::Format { line, .. } => assert_eq!(line, Some(2)),
            other => panic!("expected format error, got {other:?}"),
        }
    }

    #[test]
    fn test_ragged_row_is_format_error() {
        let err = read("alex,65.78,112.99\njay,70\n").unwrap_err();
        assert!(err.is_format_error());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = CsvReader.read(Path::new("/nonexistent/source.csv")).unwrap_err();
        assert!(matches!(err, EtlError::Io { .. }));
    }
}
