//! Run reporting
//!
//! A [`RunReport`] summarizes one transform invocation for operators and
//! audit trails: row counts, parse diagnostics, and provenance (run id,
//! engine version, timestamp). The report is side information only - the
//! feature table itself never carries run-scoped values.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{ParseDiagnostic, Table, TransformOutput, EMPTY_ARGS};
use crate::{PREP_VERSION, PRODUCER_NAME};

/// Summary of one `transform` invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Unique id of this invocation
    pub run_id: String,
    pub producer: String,
    pub engine_version: String,
    /// When the report was produced (RFC3339, UTC)
    pub computed_at_utc: String,
    /// Rows in the input table
    pub rows_in: usize,
    /// Rows whose args were flattened into fragment columns
    pub rows_flattened: usize,
    /// Rows whose args failed to parse
    pub rows_failed: usize,
    /// Rows with the empty args list `"[]"`
    pub rows_empty_args: usize,
    /// Columns in the feature table
    pub columns_out: usize,
    pub diagnostics: Vec<ParseDiagnostic>,
}

impl RunReport {
    /// Build a report for `output` as produced from `input`
    pub fn new(input: &Table, output: &TransformOutput) -> Self {
        let rows_empty_args = match input.column_index("args") {
            Some(idx) => input
                .rows()
                .iter()
                .filter(|row| row[idx].as_str() == Some(EMPTY_ARGS))
                .count(),
            None => 0,
        };
        let rows_failed = output.diagnostics.len();

        Self {
            run_id: Uuid::new_v4().to_string(),
            producer: PRODUCER_NAME.to_string(),
            engine_version: PREP_VERSION.to_string(),
            computed_at_utc: Utc::now().to_rfc3339(),
            rows_in: input.n_rows(),
            rows_flattened: input.n_rows() - rows_failed - rows_empty_args,
            rows_failed,
            rows_empty_args,
            columns_out: output.table.n_columns(),
            diagnostics: output.diagnostics.clone(),
        }
    }
}
