//! Core types for the beth-prep transform
//!
//! This module defines the tabular container that flows through the pipeline
//! plus the small value types shared between stages: flattened args rows,
//! per-row parse diagnostics, and the transform output bundle.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::TransformError;

/// Structured columns every input table must carry, in feature-table order
pub const STRUCTURED_COLUMNS: [&str; 6] = [
    "processId",
    "parentProcessId",
    "userId",
    "mountNamespace",
    "eventId",
    "returnValue",
];

/// Columns removed from the final feature table (dropped if present,
/// ignored if absent)
pub const DROP_COLUMNS: [&str; 9] = [
    "timestamp",
    "threadId",
    "processName",
    "hostName",
    "eventName",
    "stackAddresses",
    "args",
    "sus",
    "evil",
];

/// Args text that encodes an empty argument list
pub const EMPTY_ARGS: &str = "[]";

/// One record's args flattened to `{position}_{key}` columns.
///
/// A `BTreeMap` keeps the columns lexicographically sorted by name.
pub type FlatArgsRow = BTreeMap<String, String>;

/// Record of one row whose args text could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseDiagnostic {
    /// Index of the row in the input table
    pub row: usize,
    /// The raw args text that failed to parse
    pub text: String,
    /// Human-readable failure reason
    pub reason: String,
}

/// Result of one `transform` call: the feature table plus the parse
/// diagnostics collected while flattening args
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformOutput {
    pub table: Table,
    pub diagnostics: Vec<ParseDiagnostic>,
}

/// An ordered-column, row-major table of JSON values.
///
/// Missing cells are `Value::Null`. Every row has exactly one cell per
/// column; `push_row` enforces the arity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Create an empty table with the given column names
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Build a table from loose JSON records (e.g. NDJSON lines).
    ///
    /// Columns are the union of all record keys in first-seen order; cells
    /// absent from a record become `Value::Null`.
    pub fn from_records(records: &[serde_json::Map<String, Value>]) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for record in records {
            for key in record.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }

        let rows = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|c| record.get(c).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }

    /// Append a row; its arity must match the column count
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<(), TransformError> {
        if row.len() != self.columns.len() {
            return Err(TransformError::Shape(format!(
                "row has {} cells, table has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell at (row, column name); `None` if either does not exist
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    pub fn row(&self, row: usize) -> Option<&[Value]> {
        self.rows.get(row).map(Vec::as_slice)
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_push_row_rejects_arity_mismatch() {
        let mut table = Table::new(["a", "b"]);
        let err = table.push_row(vec![json!(1)]).unwrap_err();
        assert!(err.to_string().contains("shape"));
        assert_eq!(table.n_rows(), 0);
    }

    #[test]
    fn test_from_records_unions_columns() {
        let records: Vec<serde_json::Map<String, Value>> = vec![
            serde_json::from_value(json!({"a": 1, "b": "x"})).unwrap(),
            serde_json::from_value(json!({"b": "y", "c": 3})).unwrap(),
        ];
        let table = Table::from_records(&records);

        assert_eq!(table.columns(), &["a", "b", "c"]);
        assert_eq!(table.get(0, "c"), Some(&Value::Null));
        assert_eq!(table.get(1, "a"), Some(&Value::Null));
        assert_eq!(table.get(1, "b"), Some(&json!("y")));
    }

    #[test]
    fn test_get_missing_column() {
        let mut table = Table::new(["a"]);
        table.push_row(vec![json!(1)]).unwrap();
        assert_eq!(table.get(0, "nope"), None);
        assert_eq!(table.get(5, "a"), None);
    }
}
