//! Hierarchical markup reader
//!
//! Expects a root element whose children are records, each holding `name`,
//! `height` and `weight` child elements:
//!
//! ```xml
//! <data>
//!     <person>
//!         <name>Zara</name>
//!         <height>72</height>
//!         <weight>180</weight>
//!     </person>
//! </data>
//! ```
//!
//! Neither the root nor the record element names are checked. Unknown child
//! fields are ignored; a missing required field fails the whole file.

use super::{parse_number, SourceFormat, SourceReader};
use crate::record::{PersonRecord, RecordTable};
use etl_common::{EtlError, Result};
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::path::Path;

const ROOT_DEPTH: usize = 1;
const RECORD_DEPTH: usize = 2;
const FIELD_DEPTH: usize = 3;

/// Reads `<root><record><name/><height/><weight/></record>…</root>` documents
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlReader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    Height,
    Weight,
}

impl Field {
    fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"name" => Some(Field::Name),
            b"height" => Some(Field::Height),
            b"weight" => Some(Field::Weight),
            _ => None,
        }
    }
}

/// Fields collected for the record element currently open
#[derive(Debug, Default)]
struct PendingRecord {
    line: u64,
    name: Option<String>,
    height: Option<String>,
    weight: Option<String>,
}

impl PendingRecord {
    fn starting_at(line: u64) -> Self {
        Self {
            line,
            ..Self::default()
        }
    }

    fn set(&mut self, field: Field, value: String) {
        match field {
            Field::Name => self.name = Some(value),
            Field::Height => self.height = Some(value),
            Field::Weight => self.weight = Some(value),
        }
    }

    fn finish(self, path: &Path) -> Result<PersonRecord> {
        let line = Some(self.line);
        let missing = |field: &str| EtlError::format(path, line, format!("record is missing <{}>", field));

        let name = self.name.ok_or_else(|| missing("name"))?;
        let height = self.height.ok_or_else(|| missing("height"))?;
        let weight = self.weight.ok_or_else(|| missing("weight"))?;

        Ok(PersonRecord {
            name,
            height: parse_number(path, line, "height", &height)?,
            weight: parse_number(path, line, "weight", &weight)?,
        })
    }
}

/// Maps byte offsets to 1-based line numbers for offsets that only move forward
struct LineTracker<'a> {
    bytes: &'a [u8],
    offset: usize,
    line: u64,
}

impl<'a> LineTracker<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0, line: 1 }
    }

    fn line_at(&mut self, offset: usize) -> u64 {
        let end = offset.min(self.bytes.len());
        if end > self.offset {
            self.line += self.bytes[self.offset..end].iter().filter(|b| **b == b'\n').count() as u64;
            self.offset = end;
        }
        self.line
    }
}

impl XmlReader {
    /// Parse raw file bytes; invalid UTF-8 is a format error
    pub fn read_bytes(&self, path: &Path, bytes: &[u8]) -> Result<RecordTable> {
        let content = std::str::from_utf8(bytes).map_err(|e| {
            let line = LineTracker::new(bytes).line_at(e.valid_up_to());
            EtlError::format(path, Some(line), format!("invalid utf-8: {}", e))
        })?;
        self.read_str(path, content)
    }

    /// Parse an XML document held in memory; `path` is only used in errors
    pub fn read_str(&self, path: &Path, content: &str) -> Result<RecordTable> {
        let mut reader = Reader::from_str(content);
        reader.config_mut().trim_text(true);

        let mut lines = LineTracker::new(content.as_bytes());

        let mut rows = Vec::new();
        let mut depth = 0usize;
        let mut saw_root = false;
        let mut pending: Option<PendingRecord> = None;
        let mut field: Option<(Field, String)> = None;

        loop {
            let event = match reader.read_event() {
                Ok(event) => event,
                Err(e) => {
                    let line = lines.line_at(reader.buffer_position() as usize);
                    return Err(EtlError::format(path, Some(line), e.to_string()));
                },
            };
            // Position just past the event, so it sits on the line where the tag ends
            let offset = reader.buffer_position() as usize;

            match event {
                Event::Start(start) => {
                    depth += 1;
                    match depth {
                        ROOT_DEPTH => saw_root = true,
                        RECORD_DEPTH => pending = Some(PendingRecord::starting_at(lines.line_at(offset))),
                        FIELD_DEPTH => {
                            field = Field::from_tag(start.local_name().as_ref())
                                .map(|f| (f, String::new()));
                        },
                        _ => {},
                    }
                },
                Event::Empty(empty) => match depth + 1 {
                    ROOT_DEPTH => saw_root = true,
                    RECORD_DEPTH => {
                        rows.push(PendingRecord::starting_at(lines.line_at(offset)).finish(path)?);
                    },
                    FIELD_DEPTH => {
                        if let (Some(f), Some(record)) =
                            (Field::from_tag(empty.local_name().as_ref()), pending.as_mut())
                        {
                            record.set(f, String::new());
                        }
                    },
                    _ => {},
                },
                Event::Text(text) if depth == FIELD_DEPTH => {
                    if let Some((_, value)) = field.as_mut() {
                        let unescaped = text.unescape().map_err(|e| {
                            EtlError::format(path, Some(lines.line_at(offset)), e.to_string())
                        })?;
                        value.push_str(&unescaped);
                    }
                },
                Event::CData(data) if depth == FIELD_DEPTH => {
                    if let Some((_, value)) = field.as_mut() {
                        value.push_str(&String::from_utf8_lossy(&data.into_inner()));
                    }
                },
                Event::End(_) => {
                    match depth {
                        RECORD_DEPTH => {
                            if let Some(record) = pending.take() {
                                rows.push(record.finish(path)?);
                            }
                        },
                        FIELD_DEPTH => {
                            if let (Some((f, value)), Some(record)) = (field.take(), pending.as_mut()) {
                                record.set(f, value);
                            }
                        },
                        _ => {},
                    }
                    depth = depth.saturating_sub(1);
                },
                Event::Eof => break,
                _ => {},
            }
        }

        if !saw_root {
            return Err(EtlError::format(path, None, "document has no root element"));
        }

        Ok(RecordTable::from(rows))
    }
}

impl SourceReader for XmlReader {
    fn format(&self) -> SourceFormat {
        SourceFormat::Xml
    }

    fn read(&self, path: &Path) -> Result<RecordTable> {
        let bytes = std::fs::read(path).map_err(|e| EtlError::io(path, e))?;
        self.read_bytes(path, &bytes)
    }
}
