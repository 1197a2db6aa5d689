//! Structured-column encoding
//!
//! This module rewrites the structured audit columns with fixed bucket
//! codes:
//! - processId / parentProcessId: OS-owned (0, 1, 2) vs everything else
//! - userId: system account (< 1000) vs regular user
//! - mountNamespace: root mount namespace vs elsewhere
//! - returnValue: success / success-with-value / error
//!
//! eventId is kept as-is. Every output value is a small integer code,
//! never the raw input value (except eventId).

use serde_json::Value;

use crate::error::TransformError;
use crate::types::{Table, STRUCTURED_COLUMNS};

/// Mount namespace id shared by all stock-OS processes in BETH captures
const ROOT_MOUNT_NS: i64 = 4_026_531_840;

/// Encoder for the fixed structured columns
pub struct FeatureEncoder;

impl FeatureEncoder {
    /// Rewrite the structured columns of `table` with their bucket codes.
    ///
    /// Returns a new table; the input is never mutated. Fails with
    /// [`TransformError::Encoding`] on the first non-numeric or absent
    /// structured cell.
    pub fn encode(table: &Table) -> Result<Table, TransformError> {
        let mut out = Table::new(table.columns().iter().cloned());

        for (row_idx, row) in table.rows().iter().enumerate() {
            let mut cells = row.clone();
            for name in STRUCTURED_COLUMNS {
                let idx = table.column_index(name).ok_or_else(|| {
                    TransformError::Encoding {
                        column: name.to_string(),
                        row: row_idx,
                        reason: "column absent".to_string(),
                    }
                })?;
                let raw = cell_as_int(&cells[idx]).ok_or_else(|| {
                    TransformError::Encoding {
                        column: name.to_string(),
                        row: row_idx,
                        reason: format!("expected an integer, got {}", cells[idx]),
                    }
                })?;

                let encoded = match name {
                    "processId" | "parentProcessId" => bucket_process_id(raw),
                    "userId" => bucket_user_id(raw),
                    "mountNamespace" => bucket_mount_namespace(raw),
                    "returnValue" => bucket_return_value(raw),
                    _ => raw, // eventId: identity
                };
                cells[idx] = Value::from(encoded);
            }
            out.push_row(cells)?;
        }

        Ok(out)
    }
}

/// 0 for OS-owned pids (0, 1, 2), 1 otherwise
pub fn bucket_process_id(value: i64) -> i64 {
    if (0..=2).contains(&value) {
        0
    } else {
        1
    }
}

/// 0 for system accounts (uid < 1000), 1 for regular users
pub fn bucket_user_id(value: i64) -> i64 {
    if value < 1000 {
        0
    } else {
        1
    }
}

/// 0 for the root mount namespace, 1 for everything else
pub fn bucket_mount_namespace(value: i64) -> i64 {
    if value == ROOT_MOUNT_NS {
        0
    } else {
        1
    }
}

/// 0 = success, 1 = success with value, 2 = error
pub fn bucket_return_value(value: i64) -> i64 {
    if value == 0 {
        0
    } else if value > 0 {
        1
    } else {
        2
    }
}

/// Read a cell as an integer. Whole floats are accepted because tables
/// ingested through CSV-to-JSON conversion carry integer columns as floats.
fn cell_as_int(value: &Value) -> Option<i64> {
    if let Some(i) = value.as_i64() {
        return Some(i);
    }
    value.as_f64().and_then(|f| {
        if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
            Some(f as i64)
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_table(cells: Vec<Value>) -> Table {
        let mut table = Table::new(STRUCTURED_COLUMNS);
        table.push_row(cells).unwrap();
        table
    }

    #[test]
    fn test_bucket_codes() {
        assert_eq!(bucket_process_id(0), 0);
        assert_eq!(bucket_process_id(2), 0);
        assert_eq!(bucket_process_id(5), 1);

        assert_eq!(bucket_user_id(999), 0);
        assert_eq!(bucket_user_id(1000), 1);

        assert_eq!(bucket_mount_namespace(4026531840), 0);
        assert_eq!(bucket_mount_namespace(4026531841), 1);

        assert_eq!(bucket_return_value(0), 0);
        assert_eq!(bucket_return_value(42), 1);
        assert_eq!(bucket_return_value(-1), 2);
    }

    #[test]
    fn test_encode_rewrites_structured_columns() {
        // processId=5, parentProcessId=1, userId=500, mountNamespace=root,
        // eventId=1010, returnValue=-3 -> (1, 0, 0, 0, 1010, 2)
        let table = sample_table(vec![
            json!(5),
            json!(1),
            json!(500),
            json!(4026531840i64),
            json!(1010),
            json!(-3),
        ]);
        let encoded = FeatureEncoder::encode(&table).unwrap();

        assert_eq!(encoded.row(0).unwrap(), &[
            json!(1),
            json!(0),
            json!(0),
            json!(0),
            json!(1010),
            json!(2),
        ]);
        // input untouched
        assert_eq!(table.get(0, "processId"), Some(&json!(5)));
    }

    #[test]
    fn test_encode_accepts_whole_floats() {
        let table = sample_table(vec![
            json!(5.0),
            json!(1.0),
            json!(1000.0),
            json!(4026531840.0),
            json!(42.0),
            json!(0.0),
        ]);
        let encoded = FeatureEncoder::encode(&table).unwrap();
        assert_eq!(encoded.get(0, "userId"), Some(&json!(1)));
        assert_eq!(encoded.get(0, "eventId"), Some(&json!(42)));
        assert_eq!(encoded.get(0, "returnValue"), Some(&json!(0)));
    }

    #[test]
    fn test_encode_rejects_non_numeric_cell() {
        let table = sample_table(vec![
            json!("pid"),
            json!(1),
            json!(0),
            json!(4026531840i64),
            json!(1),
            json!(0),
        ]);
        let err = FeatureEncoder::encode(&table).unwrap_err();
        assert!(matches!(
            err,
            TransformError::Encoding { ref column, row: 0, .. } if column == "processId"
        ));
    }

    #[test]
    fn test_encode_rejects_null_cell() {
        let table = sample_table(vec![
            json!(1),
            json!(1),
            json!(0),
            Value::Null,
            json!(1),
            json!(0),
        ]);
        assert!(FeatureEncoder::encode(&table).is_err());
    }
}
