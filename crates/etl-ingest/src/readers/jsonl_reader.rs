//! Line-delimited JSON reader

use super::{SourceFormat, SourceReader};
use crate::record::{PersonRecord, RecordTable};
use etl_common::{EtlError, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Reads one JSON object per line
///
/// Keys outside the fixed column set are ignored. Blank lines are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLinesReader;

impl JsonLinesReader {
    /// Parse JSON lines from any buffered reader; `path` is only used in errors
    pub fn read_from<R: BufRead>(&self, path: &Path, mut input: R) -> Result<RecordTable> {
        let mut rows = Vec::new();
        let mut line = Vec::new();
        let mut line_no = 0u64;

        // Raw bytes: bad UTF-8 is reported by the decoder with its line
        loop {
            line.clear();
            let read = input.read_until(b'\n', &mut line).map_err(|e| EtlError::io(path, e))?;
            if read == 0 {
                break;
            }
            line_no += 1;
            if line.trim_ascii().is_empty() {
                continue;
            }

            let record: PersonRecord = serde_json::from_slice(&line)
                .map_err(|e| EtlError::format(path, Some(line_no), e.to_string()))?;
            rows.push(record);
        }

        Ok(RecordTable::from(rows))
    }
}

impl SourceReader for JsonLinesReader {
    fn format(&self) -> SourceFormat {
        SourceFormat::Json
    }

    fn read(&self, path: &Path) -> Result<RecordTable> {
        let file = File::open(path).map_err(|e| EtlError::io(path, e))?;
        self.read_from(path, BufReader::new(file))
    }
}
