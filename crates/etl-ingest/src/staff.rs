//! Instructor table load
//!
//! Loads the headerless instructor file into SQLite, runs a few reporting
//! queries, appends one fixed record and counts again.

use crate::config::StaffConfig;
use crate::db::{Column, Database, IfExists, QueryRun, SqlType, TableRow};
use crate::load::load_to_db;
use crate::readers::csv_error;
use etl_common::progress::{ProgressLog, Separator};
use etl_common::{EtlError, Result};
use rusqlite::types::Value;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct Instructor {
    pub id: i64,
    pub fname: String,
    pub lname: String,
    pub city: String,
    pub ccode: String,
}

impl Instructor {
    /// Record appended after the initial load
    pub fn appended() -> Self {
        Self {
            id: 100,
            fname: "John".to_string(),
            lname: "Doe".to_string(),
            city: "Paris".to_string(),
            ccode: "FR".to_string(),
        }
    }
}

impl TableRow for Instructor {
    fn columns() -> &'static [Column] {
        const COLUMNS: [Column; 5] = [
            Column::new("ID", SqlType::Integer),
            Column::new("FNAME", SqlType::Text),
            Column::new("LNAME", SqlType::Text),
            Column::new("CITY", SqlType::Text),
            Column::new("CCODE", SqlType::Text),
        ];
        &COLUMNS
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Integer(self.id),
            Value::Text(self.fname.clone()),
            Value::Text(self.lname.clone()),
            Value::Text(self.city.clone()),
            Value::Text(self.ccode.clone()),
        ]
    }
}

/// Read instructors from a headerless `ID,FNAME,LNAME,CITY,CCODE` file
pub fn read_instructors(path: &Path) -> Result<Vec<Instructor>> {
    let file = std::fs::File::open(path).map_err(|e| EtlError::io(path, e))?;
    read_instructors_from(path, file)
}

/// Like [`read_instructors`] over any reader; `path` is only used in errors
pub fn read_instructors_from<R: Read>(path: &Path, input: R) -> Result<Vec<Instructor>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_reader(input);

    reader
        .deserialize()
        .map(|row| row.map_err(|e| csv_error(path, e)))
        .collect()
}

#[derive(Debug, Clone)]
pub struct StaffReport {
    pub loaded: usize,
    pub count_before_append: i64,
    pub count_after_append: i64,
    pub queries: Vec<QueryRun>,
}

/// Run the whole job once
pub fn run(config: &StaffConfig) -> Result<StaffReport> {
    let log = ProgressLog::new(&config.log_file, Separator::Colon);
    let table = config.table_name.as_str();
    log.log("Preliminaries complete. Initiating staff table load")?;

    let instructors = read_instructors(&config.csv_path)?;
    log.log("Data read from CSV file")?;

    let mut db = Database::open(&config.db_path)?;
    log.log("SQL Connection initiated")?;

    let loaded = load_to_db(&mut db, table, &instructors, IfExists::Replace)?;
    log.log("Table is ready")?;

    let mut queries = Vec::new();
    for statement in [
        format!("SELECT * FROM {}", table),
        format!("SELECT FNAME FROM {}", table),
    ] {
        queries.push(db.run_query(statement)?);
    }
    let before = db.run_query(format!("SELECT COUNT(*) FROM {}", table))?;
    let count_before_append = parse_count(&before)?;
    queries.push(before);
    log.log("Queries complete")?;

    load_to_db(&mut db, table, &[Instructor::appended()], IfExists::Append)?;
    log.log("Data appended successfully")?;

    let after = db.run_query(format!("SELECT COUNT(*) FROM {}", table))?;
    let count_after_append = parse_count(&after)?;
    queries.push(after);

    info!(table, before = count_before_append, after = count_after_append, "Instructor table updated");

    drop(db);
    log.log("Process Complete")?;

    Ok(StaffReport {
        loaded,
        count_before_append,
        count_after_append,
        queries,
    })
}

fn parse_count(run: &QueryRun) -> Result<i64> {
    run.output
        .scalar()
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| EtlError::database(format!("'{}' did not return a count", run.statement)))
}
