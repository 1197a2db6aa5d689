//! Transform orchestration
//!
//! This module provides the public `fit` / `transform` API. A transform
//! runs the full pipeline over one table:
//!
//! 1. Shape validation - required columns present
//! 2. FeatureEncoder - structured columns rewritten as bucket codes
//! 3. ArgsFlattener - args column flattened to an index-aligned fragment
//! 4. Assembly - drop-list applied, fragment columns appended
//!
//! The output row count always equals the input row count: rows with
//! empty or unparseable args stay in the table with null args-derived
//! columns.

use serde_json::Value;

use crate::encoder::FeatureEncoder;
use crate::error::TransformError;
use crate::flattener::ArgsFlattener;
use crate::types::{Table, TransformOutput, DROP_COLUMNS, STRUCTURED_COLUMNS};

/// Stateless BETH preprocessing transformer.
///
/// `fit` only validates the table shape; nothing is learned or retained,
/// so a single instance may serve any number of `transform` calls from
/// independent call sites.
#[derive(Debug, Clone, Copy, Default)]
pub struct BethPrep;

impl BethPrep {
    pub fn new() -> Self {
        Self
    }

    /// Validate the table shape. Required by pipeline-style callers;
    /// returns the unchanged instance.
    pub fn fit(&self, table: &Table) -> Result<&Self, TransformError> {
        validate_shape(table)?;
        Ok(self)
    }

    /// Transform one table into its feature table.
    ///
    /// Pure per batch: calling this twice on the same input yields
    /// identical output. Per-row args parse failures are reported in
    /// [`TransformOutput::diagnostics`], never raised.
    pub fn transform(&self, table: &Table) -> Result<TransformOutput, TransformError> {
        validate_shape(table)?;

        let encoded = FeatureEncoder::encode(table)?;

        let args_idx = table
            .column_index("args")
            .ok_or_else(|| TransformError::Shape("missing 'args' column".to_string()))?;
        let (fragment, diagnostics) =
            ArgsFlattener::process(table.rows().iter().map(|row| &row[args_idx]));

        // Kept input columns in their original order, then args-derived
        // columns in sorted order
        let kept: Vec<usize> = encoded
            .columns()
            .iter()
            .enumerate()
            .filter(|(_, c)| !DROP_COLUMNS.contains(&c.as_str()))
            .map(|(idx, _)| idx)
            .collect();
        let args_columns: Vec<String> = fragment.columns.iter().cloned().collect();

        let mut out = Table::new(
            kept.iter()
                .map(|&idx| encoded.columns()[idx].clone())
                .chain(args_columns.iter().cloned()),
        );

        for (row_idx, row) in encoded.rows().iter().enumerate() {
            let mut cells: Vec<Value> = kept.iter().map(|&idx| row[idx].clone()).collect();
            // Join by original row index, not by position in the parsed
            // sequence: skipped rows must not shift later rows' values
            let flat = fragment.rows.get(row_idx).and_then(Option::as_ref);
            for name in &args_columns {
                cells.push(match flat.and_then(|f| f.get(name)) {
                    Some(value) => Value::String(value.clone()),
                    None => Value::Null,
                });
            }
            out.push_row(cells)?;
        }

        Ok(TransformOutput {
            table: out,
            diagnostics,
        })
    }
}

fn validate_shape(table: &Table) -> Result<(), TransformError> {
    let missing: Vec<&str> = STRUCTURED_COLUMNS
        .iter()
        .copied()
        .chain(std::iter::once("args"))
        .filter(|c| !table.has_column(c))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(TransformError::Shape(format!(
            "missing required columns: {}",
            missing.join(", ")
        )))
    }
}
