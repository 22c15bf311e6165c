// CSV input: rows of typed fields.
//
// Every cell goes through `FieldValue::parse`, so numbers come out numeric
// and blank cells come out as `Null`. Which columns are text and which are
// attributes is decided by the caller's `Schema`, not here.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::corpus::{FieldValue, Record};

/// Header plus parsed records of one CSV source.
#[derive(Debug, Clone)]
pub struct Table {
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

/// Value kinds observed in one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnProfile {
    pub name: String,
    pub numeric: usize,
    pub text: usize,
    pub empty: usize,
}

impl ColumnProfile {
    /// True when every non-empty cell parsed as a number.
    pub fn looks_numeric(&self) -> bool {
        self.numeric > 0 && self.text == 0
    }
}

/// Read a CSV file with a header row.
pub fn read_csv(path: &Path) -> Result<Table> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    read_csv_from(file).with_context(|| format!("failed to read {}", path.display()))
}

/// Read CSV from any reader. Short rows leave their trailing fields absent.
pub fn read_csv_from<R: Read>(reader: R) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let columns: Vec<String> = reader
        .headers()
        .context("failed to read CSV header")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut records = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let row = row.with_context(|| format!("malformed CSV row {}", index + 2))?;
        let mut record = Record::new(index);
        for (name, cell) in columns.iter().zip(row.iter()) {
            record = record.with(name, FieldValue::parse(cell));
        }
        records.push(record);
    }

    Ok(Table { columns, records })
}

/// Count numeric, text and empty cells per column.
pub fn profile_columns(table: &Table) -> Vec<ColumnProfile> {
    table
        .columns
        .iter()
        .map(|name| {
            let mut profile = ColumnProfile {
                name: name.clone(),
                numeric: 0,
                text: 0,
                empty: 0,
            };
            for record in &table.records {
                match record.get(name) {
                    Some(FieldValue::Number(_)) => profile.numeric += 1,
                    Some(FieldValue::Text(_)) => profile.text += 1,
                    Some(FieldValue::Null) | None => profile.empty += 1,
                }
            }
            profile
        })
        .collect()
}
