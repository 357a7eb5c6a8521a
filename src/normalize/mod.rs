//! Turn an irregular `RawTable` into a rectangular, typed `NormalizedTable`.
//!
//! Normalization never fails: shape problems and unparsable cells degrade to
//! padded/truncated rows and missing values, each recorded as a warning on
//! the `ExtractionResult`.

pub mod numeric;

use std::fmt;

use regex::Regex;
use serde::Serialize;

use crate::table::{NormalizedTable, RawCell, RawTable, Value};

/// Selects columns whose values should be parsed as numbers.
#[derive(Debug, Clone)]
pub enum ColumnSpec {
    /// Position in the normalized header, 0-based.
    Index(usize),
    /// Exact column name, case-insensitive.
    Name(String),
    /// Regex over the column name.
    Pattern(Regex),
}

impl ColumnSpec {
    pub fn name(name: impl Into<String>) -> Self {
        ColumnSpec::Name(name.into())
    }

    /// Compile a name pattern; invalid patterns are rejected up front so the
    /// normalizer itself stays infallible.
    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        Ok(ColumnSpec::Pattern(Regex::new(pattern)?))
    }

    fn matches(&self, index: usize, name: &str) -> bool {
        match self {
            ColumnSpec::Index(i) => *i == index,
            ColumnSpec::Name(n) => n.eq_ignore_ascii_case(name),
            ColumnSpec::Pattern(re) => re.is_match(name),
        }
    }
}

/// Cleanup configuration for one source's table layout.
#[derive(Debug, Clone, Default)]
pub struct NormalizationRules {
    /// Rows to drop before header detection (banner rows in sheet exports).
    pub skip_leading_rows: usize,
    /// Columns to drop from every row (row-index columns).
    pub skip_leading_columns: usize,
    /// Which remaining row is the header; rows before it are dropped.
    pub header_row_offset: usize,
    /// Remove columns that end up entirely missing.
    pub drop_empty_columns: bool,
    /// Columns to coerce through the locale-tolerant number parser.
    pub numeric_columns: Vec<ColumnSpec>,
}

/// A recorded, non-fatal anomaly. `row` is the 1-based ordinal of the data
/// row (the rows after the header).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Warning {
    CellParse {
        row: usize,
        column: String,
        value: String,
    },
    RowShape {
        row: usize,
        expected: usize,
        actual: usize,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::CellParse { row, column, value } => {
                write!(f, "column `{column}` unparsable in row {row}: {value:?}")
            }
            Warning::RowShape {
                row,
                expected,
                actual,
            } => write!(
                f,
                "row {row} has {actual} cells, header has {expected}"
            ),
        }
    }
}

/// Outcome of one normalization pass.
#[derive(Debug, Default)]
pub struct ExtractionResult {
    pub table: NormalizedTable,
    pub warnings: Vec<Warning>,
}

impl ExtractionResult {
    pub fn row_count(&self) -> usize {
        self.table.row_count()
    }

    pub fn column_count(&self) -> usize {
        self.table.column_count()
    }
}

/// Apply skips, detect the header, square off the rows and type the flagged
/// columns. A table with too few rows or a zero-width header normalizes to an
/// empty result rather than an error.
pub fn normalize(raw: RawTable, rules: &NormalizationRules) -> ExtractionResult {
    let mut remaining: Vec<Vec<RawCell>> = raw
        .rows
        .into_iter()
        .skip(rules.skip_leading_rows)
        .map(|row| row.into_iter().skip(rules.skip_leading_columns).collect())
        .collect();

    if remaining.len() <= rules.header_row_offset {
        return ExtractionResult::default();
    }
    let data_rows = remaining.split_off(rules.header_row_offset + 1);
    let header_cells = remaining
        .pop()
        .expect("header row exists after the length check");

    let columns = header_names(&header_cells);
    if columns.is_empty() {
        return ExtractionResult::default();
    }
    let numeric: Vec<bool> = columns
        .iter()
        .enumerate()
        .map(|(i, name)| rules.numeric_columns.iter().any(|s| s.matches(i, name)))
        .collect();

    let mut warnings = Vec::new();
    let mut rows = Vec::with_capacity(data_rows.len());
    for (ordinal, mut cells) in data_rows.into_iter().enumerate() {
        let row_no = ordinal + 1;
        if cells.len() != columns.len() {
            warnings.push(Warning::RowShape {
                row: row_no,
                expected: columns.len(),
                actual: cells.len(),
            });
            cells.truncate(columns.len());
            cells.resize(columns.len(), RawCell::Empty);
        }

        let row: Vec<Value> = cells
            .into_iter()
            .enumerate()
            .map(|(col, cell)| {
                coerce(cell, numeric[col], row_no, &columns[col], &mut warnings)
            })
            .collect();
        rows.push(row);
    }

    let mut table = NormalizedTable { columns, rows };
    if rules.drop_empty_columns && !table.rows.is_empty() {
        drop_empty_columns(&mut table);
    }

    ExtractionResult { table, warnings }
}

/// Stringify and trim the header cells; blank names fall back to `col_{i}`
/// and accidental duplicates get a counter suffix.
fn header_names(cells: &[RawCell]) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(cells.len());
    for (i, cell) in cells.iter().enumerate() {
        let trimmed = cell.as_text().trim().to_string();
        let mut name = if trimmed.is_empty() {
            format!("col_{i}")
        } else {
            trimmed
        };
        if names.contains(&name) {
            let mut n = 2;
            while names.contains(&format!("{name}_{n}")) {
                n += 1;
            }
            name = format!("{name}_{n}");
        }
        names.push(name);
    }
    names
}

fn coerce(
    cell: RawCell,
    numeric: bool,
    row: usize,
    column: &str,
    warnings: &mut Vec<Warning>,
) -> Value {
    let value = match cell {
        RawCell::Empty => Value::Missing,
        RawCell::Number(n) => Value::Number(n),
        RawCell::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Value::Missing
            } else {
                Value::Text(trimmed.to_string())
            }
        }
    };

    if !numeric {
        return value;
    }
    match value {
        Value::Text(s) => match numeric::parse_number(&s) {
            Some(n) => Value::Number(n),
            None => {
                warnings.push(Warning::CellParse {
                    row,
                    column: column.to_string(),
                    value: s,
                });
                Value::Missing
            }
        },
        other => other,
    }
}

fn drop_empty_columns(table: &mut NormalizedTable) {
    let keep: Vec<bool> = (0..table.columns.len())
        .map(|col| table.rows.iter().any(|row| !row[col].is_missing()))
        .collect();
    if keep.iter().all(|&k| k) {
        return;
    }

    let mut col = 0;
    table.columns.retain(|_| {
        let k = keep[col];
        col += 1;
        k
    });
    for row in &mut table.rows {
        let mut col = 0;
        row.retain(|_| {
            let k = keep[col];
            col += 1;
            k
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(rows: Vec<Vec<&str>>) -> RawTable {
        RawTable::from_strings(rows)
    }

    #[test]
    fn banner_rows_and_numeric_price() {
        let table = raw(vec![
            vec!["", "", "", ""],
            vec!["banner"],
            vec!["ID", "Name", "Price"],
            vec!["1", "Widget", "1.234,50"],
        ]);
        let rules = NormalizationRules {
            skip_leading_rows: 2,
            numeric_columns: vec![ColumnSpec::name("Price")],
            ..Default::default()
        };

        let result = normalize(table, &rules);
        assert!(result.warnings.is_empty());
        assert_eq!(result.table.columns, vec!["ID", "Name", "Price"]);
        assert_eq!(result.row_count(), 1);
        assert_eq!(result.table.value(0, "ID"), Some(&Value::Text("1".into())));
        assert_eq!(
            result.table.value(0, "Name"),
            Some(&Value::Text("Widget".into()))
        );
        assert_eq!(
            result.table.value(0, "Price"),
            Some(&Value::Number(1234.5))
        );
    }

    #[test]
    fn empty_table_normalizes_to_empty_result() {
        let result = normalize(RawTable::new(), &NormalizationRules::default());
        assert_eq!(result.row_count(), 0);
        assert_eq!(result.column_count(), 0);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn too_few_rows_for_header_is_empty() {
        let table = raw(vec![vec!["banner"]]);
        let rules = NormalizationRules {
            skip_leading_rows: 2,
            ..Default::default()
        };
        let result = normalize(table, &rules);
        assert!(result.table.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn short_rows_pad_long_rows_truncate() {
        let table = raw(vec![
            vec!["A", "B", "C"],
            vec!["1", "2"],
            vec!["1", "2", "3", "4"],
        ]);
        let result = normalize(table, &NormalizationRules::default());
        assert_eq!(result.row_count(), 2);
        assert_eq!(result.table.value(0, "C"), Some(&Value::Missing));
        assert_eq!(result.table.rows[1].len(), 3);
        assert_eq!(
            result.warnings,
            vec![
                Warning::RowShape {
                    row: 1,
                    expected: 3,
                    actual: 2
                },
                Warning::RowShape {
                    row: 2,
                    expected: 3,
                    actual: 4
                },
            ]
        );
    }

    #[test]
    fn unparsable_numeric_cell_warns_and_goes_missing() {
        let table = raw(vec![vec!["Price"], vec!["abc"]]);
        let rules = NormalizationRules {
            numeric_columns: vec![ColumnSpec::name("price")],
            ..Default::default()
        };
        let result = normalize(table, &rules);
        assert_eq!(result.table.value(0, "Price"), Some(&Value::Missing));
        assert_eq!(
            result.warnings,
            vec![Warning::CellParse {
                row: 1,
                column: "Price".into(),
                value: "abc".into()
            }]
        );
    }

    #[test]
    fn headers_are_trimmed_deduplicated_and_backfilled() {
        let table = raw(vec![vec![" ID ", "Name", "Name", ""], vec!["1", "a", "b", "c"]]);
        let result = normalize(table, &NormalizationRules::default());
        assert_eq!(result.table.columns, vec!["ID", "Name", "Name_2", "col_3"]);
    }

    #[test]
    fn drop_empty_columns_removes_all_missing() {
        let table = raw(vec![
            vec!["A", "B", "C"],
            vec!["1", "", "x"],
            vec!["2", "  ", "y"],
        ]);
        let rules = NormalizationRules {
            drop_empty_columns: true,
            ..Default::default()
        };
        let result = normalize(table, &rules);
        assert_eq!(result.table.columns, vec!["A", "C"]);
        assert_eq!(result.table.rows[1], vec![
            Value::Text("2".into()),
            Value::Text("y".into())
        ]);
    }

    #[test]
    fn header_only_table_keeps_columns() {
        let table = raw(vec![vec!["A", "B"]]);
        let rules = NormalizationRules {
            drop_empty_columns: true,
            ..Default::default()
        };
        let result = normalize(table, &rules);
        assert_eq!(result.column_count(), 2);
        assert_eq!(result.row_count(), 0);
    }

    #[test]
    fn normalizing_a_normalized_table_is_idempotent() {
        let rules = NormalizationRules {
            numeric_columns: vec![ColumnSpec::name("Price")],
            ..Default::default()
        };
        let first = normalize(
            raw(vec![
                vec!["ID", "Name", "Price"],
                vec!["1", "Widget", "1.234,50"],
                vec!["2", "", "19,90"],
            ]),
            &rules,
        );

        let mut replay = RawTable::new();
        replay.push_row(first.table.columns.iter().map(|c| c.as_str().into()).collect());
        for row in &first.table.rows {
            replay.push_row(
                row.iter()
                    .map(|v| match v {
                        Value::Text(s) => RawCell::Text(s.clone()),
                        Value::Number(n) => RawCell::Number(*n),
                        Value::Missing => RawCell::Empty,
                    })
                    .collect(),
            );
        }
        let second = normalize(replay, &rules);
        assert_eq!(second.table, first.table);
        assert!(second.warnings.is_empty());
    }

    #[test]
    fn numeric_column_selection_by_index_and_pattern() {
        let table = raw(vec![
            vec!["qty", "unit_price", "total_price"],
            vec!["3", "1,50", "4,50"],
        ]);
        let rules = NormalizationRules {
            numeric_columns: vec![
                ColumnSpec::Index(0),
                ColumnSpec::pattern(r"_price$").unwrap(),
            ],
            ..Default::default()
        };
        let result = normalize(table, &rules);
        assert_eq!(result.table.rows[0], vec![
            Value::Number(3.0),
            Value::Number(1.5),
            Value::Number(4.5)
        ]);
    }
}
