//! Delimited-text fallback writer. UTF-8 with a byte-order mark, which is
//! what spreadsheet applications need to pick the encoding up correctly.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::table::NormalizedTable;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Serialize the table to `path` as comma-delimited text, header row first.
pub fn write_csv(table: &NormalizedTable, path: &Path) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut out = BufWriter::new(file);
    out.write_all(UTF8_BOM).context("writing byte-order mark")?;

    let mut writer = csv::Writer::from_writer(out);
    writer
        .write_record(&table.columns)
        .context("writing header row")?;
    for (i, row) in table.rows.iter().enumerate() {
        writer
            .write_record(row.iter().map(|v| v.render()))
            .with_context(|| format!("writing row {}", i + 1))?;
    }
    writer.flush().context("flushing delimited output")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;

    #[test]
    fn bom_header_and_missing_fields() {
        let table = NormalizedTable {
            columns: vec!["sku".into(), "name".into(), "price".into()],
            rows: vec![
                vec![
                    Value::Text("A-1".into()),
                    Value::Text("Cañería".into()),
                    Value::Number(1990.0),
                ],
                vec![Value::Text("A-2".into()), Value::Missing, Value::Missing],
            ],
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_csv(&table, &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..3], UTF8_BOM);
        let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("sku,name,price"));
        assert_eq!(lines.next(), Some("A-1,Cañería,1990"));
        assert_eq!(lines.next(), Some("A-2,,"));
    }

    /// Writing with the fallback writer and reading the file back preserves
    /// column names and cell values, modulo the declared coercions.
    #[test]
    fn round_trip_through_delimited_text() {
        use crate::normalize::{normalize, ColumnSpec, NormalizationRules};
        use crate::table::RawTable;

        let table = NormalizedTable {
            columns: vec!["ID".into(), "Name".into(), "Price".into()],
            rows: vec![
                vec![
                    Value::Text("1".into()),
                    Value::Text("Widget".into()),
                    Value::Number(1234.5),
                ],
                vec![Value::Text("2".into()), Value::Missing, Value::Number(8.0)],
            ],
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("round.csv");
        write_csv(&table, &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(&bytes[3..]);
        let mut raw = RawTable::new();
        for record in reader.records() {
            let record = record.unwrap();
            raw.push_row(record.iter().map(Into::into).collect());
        }

        let rules = NormalizationRules {
            numeric_columns: vec![ColumnSpec::name("Price")],
            ..Default::default()
        };
        let result = normalize(raw, &rules);
        assert!(result.warnings.is_empty());
        assert_eq!(result.table, table);
    }
}
