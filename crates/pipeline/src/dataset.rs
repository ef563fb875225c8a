//! Tabular record source
//!
//! A dataset is a JSON array of flat objects, one per row. Keys are column
//! names; string, number and boolean cells are read as text, `null` as an
//! empty cell.

use crate::LoadError;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use template::{CertificateRecord, TemplateError};

/// One source row, cells keyed by column name
pub type Row = BTreeMap<String, String>;

/// Rows in source order plus every column seen in any row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Row>,
}

fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

impl Dataset {
    /// Build from rows already in memory; columns are collected from the rows
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            for key in row.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }
        Self { columns, rows }
    }

    pub fn from_json_str(json: &str) -> Result<Self, LoadError> {
        let value: Value = serde_json::from_str(json)?;
        let Value::Array(items) = value else {
            return Err(LoadError::Shape("expected an array of rows".to_string()));
        };

        let mut rows = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let Value::Object(object) = item else {
                return Err(LoadError::Shape(format!("row {index} is not an object")));
            };
            let mut row = Row::new();
            for (key, value) in object {
                let text = cell_text(value).ok_or_else(|| {
                    LoadError::Shape(format!("row {index}, column {key}: nested value"))
                })?;
                row.insert(key.clone(), text);
            }
            rows.push(row);
        }
        Ok(Self::from_rows(rows))
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Required columns absent from the dataset, in the order given
    pub fn missing_columns(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|c| !self.columns.iter().any(|have| have == *c))
            .map(|c| c.to_string())
            .collect()
    }
}

/// Snapshot a row into a validated record
///
/// Reads `Name`, `Course`, `Date` and the optional `Description`; a
/// missing cell counts as blank.
pub fn record_from_row(row: &Row) -> Result<CertificateRecord, TemplateError> {
    let cell = |column: &str| row.get(column).map(String::as_str).unwrap_or("");
    CertificateRecord::new(
        cell("Name"),
        cell("Course"),
        cell("Date"),
        row.get("Description").map(String::as_str),
    )
}
