//! SQLite sink and query runner
//!
//! Jobs describe their rows through [`TableRow`]; [`Database::write_rows`]
//! creates the table from the column list and inserts every row inside a
//! single transaction.

use crate::record::PersonRecord;
use etl_common::{EtlError, Result};
use rusqlite::types::{Value, ValueRef};
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Storage class of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Text,
    Real,
    Integer,
}

impl SqlType {
    pub fn as_str(self) -> &'static str {
        match self {
            SqlType::Text => "TEXT",
            SqlType::Real => "REAL",
            SqlType::Integer => "INTEGER",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub sql_type: SqlType,
}

impl Column {
    pub const fn new(name: &'static str, sql_type: SqlType) -> Self {
        Self { name, sql_type }
    }
}

/// A row type that can be stored in a table
///
/// `values` must return one value per entry of `columns`, in the same order.
pub trait TableRow {
    fn columns() -> &'static [Column];

    fn values(&self) -> Vec<Value>;
}

impl TableRow for PersonRecord {
    fn columns() -> &'static [Column] {
        const COLUMNS: [Column; 3] = [
            Column::new("name", SqlType::Text),
            Column::new("height", SqlType::Real),
            Column::new("weight", SqlType::Real),
        ];
        &COLUMNS
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.name.clone()),
            Value::Real(self.height),
            Value::Real(self.weight),
        ]
    }
}

/// What [`Database::write_rows`] does when the table already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IfExists {
    #[default]
    Fail,
    Replace,
    Append,
}

/// Result set of an ad-hoc query, with every value rendered as text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOutput {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl QueryOutput {
    /// First value of the first row, for single-value queries like `COUNT(*)`
    pub fn scalar(&self) -> Option<&str> {
        self.rows.first()?.first().map(String::as_str)
    }
}

impl fmt::Display for QueryOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut table = comfy_table::Table::new();
        table.set_header(self.columns.iter());
        for row in &self.rows {
            table.add_row(row.iter());
        }
        write!(f, "{}", table)
    }
}

/// A statement together with its result, printed the way the jobs report queries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRun {
    pub statement: String,
    pub output: QueryOutput,
}

impl fmt::Display for QueryRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.statement)?;
        write!(f, "{}", self.output)
    }
}

/// A SQLite connection
pub struct Database {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Database {
    /// Open or create the database file at `path`
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| EtlError::io(parent, e))?;
        }

        let conn = Connection::open(path).map_err(|e| {
            EtlError::database(format!("Failed to open {}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), "Opened SQLite database");

        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(EtlError::database)?;
        Ok(Self { conn, path: None })
    }

    /// Database file, or `None` for an in-memory database
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Store `rows` in `table`, returning the number inserted
    pub fn write_rows<T: TableRow>(&mut self, table: &str, rows: &[T], if_exists: IfExists) -> Result<usize> {
        validate_identifier(table)?;

        let tx = self.conn.transaction().map_err(EtlError::database)?;

        if table_exists_in(&tx, table)? {
            match if_exists {
                IfExists::Fail => {
                    return Err(EtlError::database(format!("table '{}' already exists", table)));
                },
                IfExists::Replace => {
                    tx.execute_batch(&format!("DROP TABLE \"{}\"", table))
                        .map_err(EtlError::database)?;
                },
                IfExists::Append => {},
            }
        }

        tx.execute_batch(&create_table_sql(table, T::columns()))
            .map_err(EtlError::database)?;

        {
            let mut stmt = tx
                .prepare(&insert_sql(table, T::columns()))
                .map_err(EtlError::database)?;
            for row in rows {
                stmt.execute(params_from_iter(row.values()))
                    .map_err(EtlError::database)?;
            }
        }

        tx.commit().map_err(EtlError::database)?;

        info!(table, rows = rows.len(), mode = ?if_exists, "Rows written to database");
        Ok(rows.len())
    }

    /// Run a statement and collect its result set
    pub fn query(&self, sql: &str) -> Result<QueryOutput> {
        let mut stmt = self.conn.prepare(sql).map_err(EtlError::database)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();

        let rows = stmt
            .query_map([], |row| {
                (0..width)
                    .map(|i| row.get_ref(i).map(render_value))
                    .collect::<rusqlite::Result<Vec<String>>>()
            })
            .map_err(EtlError::database)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(EtlError::database)?;

        debug!(sql, rows = rows.len(), "Query finished");
        Ok(QueryOutput { columns, rows })
    }

    /// Run `statement` and keep it alongside its output
    pub fn run_query(&self, statement: impl Into<String>) -> Result<QueryRun> {
        let statement = statement.into();
        let output = self.query(&statement)?;
        Ok(QueryRun { statement, output })
    }

    pub fn table_exists(&self, table: &str) -> Result<bool> {
        table_exists_in(&self.conn, table)
    }

    pub fn row_count(&self, table: &str) -> Result<i64> {
        validate_identifier(table)?;
        self.conn
            .query_row(&format!("SELECT COUNT(*) FROM \"{}\"", table), [], |row| row.get(0))
            .map_err(EtlError::database)
    }
}

/// Reject anything that is not a plain SQL identifier
pub fn validate_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        },
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(EtlError::config(format!("invalid table name '{}'", name)))
    }
}

fn table_exists_in(conn: &Connection, table: &str) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table],
            |row| row.get(0),
        )
        .optional()
        .map_err(EtlError::database)?;
    Ok(found.is_some())
}

fn create_table_sql(table: &str, columns: &[Column]) -> String {
    let defs: Vec<String> = columns
        .iter()
        .map(|c| format!("\"{}\" {}", c.name, c.sql_type.as_str()))
        .collect();
    format!("CREATE TABLE IF NOT EXISTS \"{}\" ({})", table, defs.join(", "))
}

fn insert_sql(table: &str, columns: &[Column]) -> String {
    let names: Vec<String> = columns.iter().map(|c| format!("\"{}\"", c.name)).collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
    format!(
        "INSERT INTO \"{}\" ({}) VALUES ({})",
        table,
        names.join(", "),
        placeholders.join(", ")
    )
}

fn render_value(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => "NULL".to_string(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(r) => r.to_string(),
        ValueRef::Text(t) => String::from_utf8_lossy(t).into_owned(),
        ValueRef::Blob(b) => format!("<{} bytes>", b.len()),
    }
}
