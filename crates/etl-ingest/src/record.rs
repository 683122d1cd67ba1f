//! Person records and the table that carries them through the pipeline

use serde::{Deserialize, Serialize};

/// One row of the person dataset
///
/// Units depend on the stage: inches and pounds after extraction, meters and
/// kilograms after [`crate::transform::transform`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonRecord {
    pub name: String,
    pub height: f64,
    pub weight: f64,
}

impl PersonRecord {
    /// Column names in output order; every reader yields exactly these
    pub const COLUMNS: [&'static str; 3] = ["name", "height", "weight"];

    pub fn new(name: impl Into<String>, height: f64, weight: f64) -> Self {
        Self {
            name: name.into(),
            height,
            weight,
        }
    }
}

/// Ordered rows sharing the [`PersonRecord::COLUMNS`] column set
///
/// Duplicates are kept; there is no row identity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordTable {
    rows: Vec<PersonRecord>,
}

impl RecordTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn push(&mut self, record: PersonRecord) {
        self.rows.push(record);
    }

    /// Move every row of `other` onto the end of this table
    pub fn append(&mut self, other: RecordTable) {
        self.rows.extend(other.rows);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PersonRecord> {
        self.rows.iter()
    }

    pub fn rows(&self) -> &[PersonRecord] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<PersonRecord> {
        self.rows
    }
}

impl From<Vec<PersonRecord>> for RecordTable {
    fn from(rows: Vec<PersonRecord>) -> Self {
        Self { rows }
    }
}

impl FromIterator<PersonRecord> for RecordTable {
    fn from_iter<I: IntoIterator<Item = PersonRecord>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for RecordTable {
    type Item = PersonRecord;
    type IntoIter = std::vec::IntoIter<PersonRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a RecordTable {
    type Item = &'a PersonRecord;
    type IntoIter = std::slice::Iter<'a, PersonRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_keeps_order_and_duplicates() {
        let mut table = RecordTable::from(vec![PersonRecord::new("Ayush", 70.0, 150.0)]);
        let other: RecordTable = vec![
            PersonRecord::new("Diana", 65.0, 130.0),
            PersonRecord::new("Ayush", 70.0, 150.0),
        ]
        .into_iter()
        .collect();

        table.append(other);

        let names: Vec<&str> = table.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Ayush", "Diana", "Ayush"]);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_empty_table() {
        let table = RecordTable::new();
        assert!(table.is_empty());
        assert_eq!(table.into_rows(), Vec::<PersonRecord>::new());
    }
}
