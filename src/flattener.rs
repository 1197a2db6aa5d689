//! Args flattening
//!
//! The `args` cell of a BETH-style record is a bracketed list of
//! brace-delimited key/value groups, e.g.
//! `[{'name': 'fd', 'type': 'int', 'value': '3'}]`. This module turns that
//! text into flat `{position}_{key}` columns, and a whole column of such
//! cells into a row-index-aligned fragment ready to be joined back onto the
//! input table.
//!
//! The grammar is heuristic, not a real parser: groups are split on the
//! literal `"},"`, framing characters are removed wholesale, and each group
//! is split into at most 3 comma segments. Values that themselves contain
//! `"},"` are corrupted by the split; this is a known lossy edge case.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::ArgsParseError;
use crate::types::{FlatArgsRow, ParseDiagnostic, EMPTY_ARGS};

/// Args-derived columns for a batch, aligned to the input by row index.
///
/// `rows[i]` is the flattened args of input row `i`, or `None` when that
/// row had empty or unparseable args. Keeping the slot (rather than
/// dropping the row) is what lets the final join never misassign values
/// across rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArgsFragment {
    pub rows: Vec<Option<FlatArgsRow>>,
    /// Sorted union of column names across all parsed rows
    pub columns: BTreeSet<String>,
}

/// Flattener for the semi-structured args column
pub struct ArgsFlattener;

impl ArgsFlattener {
    /// Flatten one args text into `{position}_{key}` columns.
    ///
    /// `"[]"` yields an empty row. A segment without the `": "` key/value
    /// delimiter fails the whole row.
    pub fn parse_row(text: &str) -> Result<FlatArgsRow, ArgsParseError> {
        if text == EMPTY_ARGS {
            return Ok(FlatArgsRow::new());
        }

        let mut entries: Vec<BTreeMap<String, String>> = Vec::new();
        for group in text.split("},") {
            let cleaned = strip_structural(group);
            // At most 3 segments per group, so a trailing value keeps any
            // commas of its own
            for segment in cleaned.splitn(3, ',') {
                let segment = segment.trim_start();
                let (key, value) = segment
                    .split_once(": ")
                    .ok_or_else(|| ArgsParseError::MissingDelimiter(segment.to_string()))?;

                // A repeated key is the only signal that the group text
                // encodes more than one logical map
                if entries.last().map_or(true, |entry| entry.contains_key(key)) {
                    entries.push(BTreeMap::new());
                }
                if let Some(entry) = entries.last_mut() {
                    entry.insert(key.to_string(), value.to_string());
                }
            }
        }

        let mut flat = FlatArgsRow::new();
        for (position, entry) in entries.iter().enumerate() {
            for (key, value) in entry {
                let name = format!("{position}_{key}");
                flat.insert(name.trim_start().to_string(), value.clone());
            }
        }
        Ok(flat)
    }

    /// Flatten a whole args column.
    ///
    /// Rows whose text is `"[]"` contribute no columns. Rows that fail to
    /// parse (or whose cell is not text) are likewise left empty and
    /// reported as diagnostics; processing always continues.
    pub fn process<'a, I>(cells: I) -> (ArgsFragment, Vec<ParseDiagnostic>)
    where
        I: IntoIterator<Item = &'a Value>,
    {
        let mut fragment = ArgsFragment::default();
        let mut diagnostics = Vec::new();

        for (row, cell) in cells.into_iter().enumerate() {
            let text = match cell.as_str() {
                Some(text) => text,
                None => {
                    diagnostics.push(ParseDiagnostic {
                        row,
                        text: cell.to_string(),
                        reason: ArgsParseError::NotText.to_string(),
                    });
                    fragment.rows.push(None);
                    continue;
                }
            };

            if text == EMPTY_ARGS {
                fragment.rows.push(None);
                continue;
            }

            match Self::parse_row(text) {
                Ok(flat) => {
                    fragment.columns.extend(flat.keys().cloned());
                    fragment.rows.push(Some(flat));
                }
                Err(err) => {
                    diagnostics.push(ParseDiagnostic {
                        row,
                        text: text.to_string(),
                        reason: err.to_string(),
                    });
                    fragment.rows.push(None);
                }
            }
        }

        (fragment, diagnostics)
    }
}

/// Remove the framing characters (`[ ] { }` and quotes) and leading spaces
/// from a group fragment. This is a character-removal pass, not a parser:
/// the same characters inside values are removed too.
fn strip_structural(fragment: &str) -> String {
    let cleaned: String = fragment
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | '{' | '}' | '\'' | '"'))
        .collect();
    cleaned.trim_start_matches(' ').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn flat(pairs: &[(&str, &str)]) -> FlatArgsRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_single_group() {
        let row =
            ArgsFlattener::parse_row("[{'name': 'fd', 'type': 'int', 'value': '3'}]").unwrap();
        assert_eq!(
            row,
            flat(&[("0_name", "fd"), ("0_type", "int"), ("0_value", "3")])
        );
    }

    #[test]
    fn test_parse_multiple_groups() {
        let row = ArgsFlattener::parse_row(
            "[{'name': 'dev', 'value': '271581185'}, {'name': 'inode', 'value': '50'}]",
        )
        .unwrap();
        assert_eq!(
            row,
            flat(&[
                ("0_name", "dev"),
                ("0_value", "271581185"),
                ("1_name", "inode"),
                ("1_value", "50"),
            ])
        );
    }

    #[test]
    fn test_repeated_key_starts_new_entry() {
        // No "}," between the maps once the framing is stripped; the
        // repeated key is the only delimiter left
        let row = ArgsFlattener::parse_row("[{'fd': '3', 'fd': '4'}]").unwrap();
        assert_eq!(row, flat(&[("0_fd", "3"), ("1_fd", "4")]));
    }

    #[test]
    fn test_trailing_value_keeps_commas() {
        let row = ArgsFlattener::parse_row(
            "[{'name': 'argv', 'type': 'const char**', 'value': 'ls, -l, /tmp'}]",
        )
        .unwrap();
        assert_eq!(row.get("0_value").map(String::as_str), Some("ls, -l, /tmp"));
    }

    #[test]
    fn test_empty_args_yields_empty_row() {
        assert_eq!(ArgsFlattener::parse_row("[]").unwrap(), FlatArgsRow::new());
    }

    #[test]
    fn test_missing_delimiter_fails() {
        let err = ArgsFlattener::parse_row("[{'garbage'}]").unwrap_err();
        assert_eq!(err, ArgsParseError::MissingDelimiter("garbage".to_string()));
    }

    #[test]
    fn test_process_aligns_by_row_index() {
        let cells = vec![
            json!("[]"),
            json!("[{'broken'}]"),
            json!("[{'name': 'sentinel'}]"),
        ];
        let (fragment, diagnostics) = ArgsFlattener::process(cells.iter());

        assert_eq!(fragment.rows.len(), 3);
        assert_eq!(fragment.rows[0], None);
        assert_eq!(fragment.rows[1], None);
        assert_eq!(
            fragment.rows[2].as_ref().and_then(|r| r.get("0_name")),
            Some(&"sentinel".to_string())
        );
        assert!(fragment.columns.contains("0_name"));

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].row, 1);
        assert_eq!(diagnostics[0].text, "[{'broken'}]");
    }

    #[test]
    fn test_process_reports_non_text_cell() {
        let cells = vec![json!(42)];
        let (fragment, diagnostics) = ArgsFlattener::process(cells.iter());

        assert_eq!(fragment.rows, vec![None]);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].reason, "Args cell is not text");
    }

    #[test]
    fn test_columns_are_sorted_union() {
        let cells = vec![json!("[{'b': '1'}]"), json!("[{'a': '2', 'c': '3'}]")];
        let (fragment, _) = ArgsFlattener::process(cells.iter());
        let columns: Vec<&String> = fragment.columns.iter().collect();
        assert_eq!(columns, ["0_a", "0_b", "0_c"]);
    }
}
